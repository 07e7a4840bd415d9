use crate::errors::CnResult;
use serde::Serialize;

/// Serializes `value` to the canonical form used everywhere a hash must be
/// stable regardless of struct field declaration order: round-trip through
/// `serde_json::Value`, whose `Map` (built without the `preserve_order`
/// feature) is a `BTreeMap` and therefore always emits object keys sorted
/// lexicographically. Two payloads that are structurally equal always
/// produce byte-identical output, independent of how the caller's struct
/// declares its fields.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> CnResult<Vec<u8>> {
    let as_value = serde_json::to_value(value)?;
    Ok(serde_json::to_vec(&as_value)?)
}

pub fn canonical_json_string<T: Serialize>(value: &T) -> CnResult<String> {
    Ok(String::from_utf8(canonical_json_bytes(value)?).expect("json is always valid utf-8"))
}
