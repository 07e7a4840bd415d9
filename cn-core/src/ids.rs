use crate::errors::{CnError, CnResult};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// First 16 hex chars of SHA-256 over the joined identity tuple. Used for
/// both finding IDs (§4.5) and plan hashes over canonical JSON (§3).
pub fn stable_id(parts: &[&str]) -> String {
    let joined = parts.join("\u{1f}");
    let digest = Sha256::digest(joined.as_bytes());
    hex::encode(digest)[..16].to_string()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn id_format_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]{1,64}$").expect("id regex must compile"))
}

/// Validates a `runId` or `planId`: `^[A-Za-z0-9._-]{1,64}$` with at least
/// one alphanumeric character (rejects e.g. `...` or `---`).
pub fn validate_id_format(field: &str, value: &str) -> CnResult<()> {
    if !id_format_regex().is_match(value) {
        return Err(CnError::InvalidArgument {
            field: field.to_string(),
            message: format!("'{value}' does not match ^[A-Za-z0-9._-]{{1,64}}$"),
        });
    }
    if !value.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Err(CnError::InvalidArgument {
            field: field.to_string(),
            message: format!("'{value}' must contain at least one alphanumeric character"),
        });
    }
    Ok(())
}

/// A sortable run identifier: `YYYYMMDDTHHMMSSmmm-<8 hex>`. Lexicographic
/// order on this string matches creation order, which handlers rely on when
/// `runId` is omitted and "the latest" run must be resolved.
pub fn new_run_id(now: chrono::DateTime<chrono::Utc>, entropy: &[u8]) -> String {
    let stamp = now.format("%Y%m%dT%H%M%S%3f");
    let suffix = &sha256_hex(entropy)[..8];
    format!("{stamp}-{suffix}")
}
