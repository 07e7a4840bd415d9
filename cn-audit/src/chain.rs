use cn_core::{sha256_hex, CnError, CnResult};
use serde::Serialize;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub use cn_core::{AuditEvent, GENESIS_HASH};

/// The payload hashed to produce one entry's `hash`; field order here does
/// not matter for hashing since `canonical_json_bytes` re-sorts keys, but it
/// does fix the shape documented in the manifest's policy block.
#[derive(Serialize)]
struct AuditPayload<'a> {
    ts: chrono::DateTime<chrono::Utc>,
    kind: &'a str,
    tool: Option<&'a str>,
    data: &'a Value,
    #[serde(rename = "prevHash")]
    prev_hash: &'a str,
}

/// An append-only JSON-lines audit log. Appends are serialised through an
/// in-process mutex, matching the "one append in flight per log file" rule;
/// multi-process safety is out of scope (each invocation owns its run's
/// subdirectory per spec.md §5).
pub struct AuditChain {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl AuditChain {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn last_hash(&self) -> CnResult<String> {
        if !self.path.exists() {
            return Ok(GENESIS_HASH.to_string());
        }
        let file = std::fs::File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut last = GENESIS_HASH.to_string();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: AuditEvent = serde_json::from_str(&line)?;
            last = entry.hash;
        }
        Ok(last)
    }

    /// Appends one entry, computing `prevHash` from the current last line
    /// (or `GENESIS`) and `hash` over the canonical payload.
    pub fn append(&self, kind: &str, tool: Option<&str>, data: Value) -> CnResult<AuditEvent> {
        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| CnError::Internal {
                message: "audit chain append lock poisoned".to_string(),
            })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let prev_hash = self.last_hash()?;
        let ts = chrono::Utc::now();
        let payload = AuditPayload {
            ts,
            kind,
            tool,
            data: &data,
            prev_hash: &prev_hash,
        };
        let hash = sha256_hex(&cn_core::canonical_json_bytes(&payload)?);

        let entry = AuditEvent {
            ts,
            kind: kind.to_string(),
            tool: tool.map(|t| t.to_string()),
            data,
            prev_hash,
            hash,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;

        tracing::info!(kind, tool, "audit chain append");
        Ok(entry)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broken_at: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broken_reason: Option<String>,
    pub total_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_entry_ts: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_entry_ts: Option<chrono::DateTime<chrono::Utc>>,
}

/// Walks the log from line 1, checking linkage and recomputing each
/// entry's hash. A missing file is valid with zero entries; verification
/// never throws on I/O success.
pub fn verify(path: &Path) -> CnResult<VerifyResult> {
    if !path.exists() {
        return Ok(VerifyResult {
            valid: true,
            broken_at: None,
            broken_reason: None,
            total_entries: 0,
            first_entry_ts: None,
            last_entry_ts: None,
        });
    }

    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut expected_prev = GENESIS_HASH.to_string();
    let mut total = 0usize;
    let mut first_ts = None;
    let mut last_ts = None;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let entry: AuditEvent = match serde_json::from_str(&line) {
            Ok(e) => e,
            Err(e) => {
                return Ok(VerifyResult {
                    valid: false,
                    broken_at: Some(line_no),
                    broken_reason: Some(format!("malformed JSON: {e}")),
                    total_entries: total,
                    first_entry_ts: first_ts,
                    last_entry_ts: last_ts,
                });
            }
        };

        if entry.prev_hash != expected_prev {
            return Ok(VerifyResult {
                valid: false,
                broken_at: Some(line_no),
                broken_reason: Some("prevHash linkage mismatch".to_string()),
                total_entries: total,
                first_entry_ts: first_ts,
                last_entry_ts: last_ts,
            });
        }

        let payload = AuditPayload {
            ts: entry.ts,
            kind: &entry.kind,
            tool: entry.tool.as_deref(),
            data: &entry.data,
            prev_hash: &entry.prev_hash,
        };
        let recomputed = match cn_core::canonical_json_bytes(&payload) {
            Ok(bytes) => sha256_hex(&bytes),
            Err(e) => {
                return Ok(VerifyResult {
                    valid: false,
                    broken_at: Some(line_no),
                    broken_reason: Some(format!("unable to recompute hash: {e}")),
                    total_entries: total,
                    first_entry_ts: first_ts,
                    last_entry_ts: last_ts,
                });
            }
        };

        if recomputed != entry.hash {
            return Ok(VerifyResult {
                valid: false,
                broken_at: Some(line_no),
                broken_reason: Some("hash mismatch".to_string()),
                total_entries: total,
                first_entry_ts: first_ts,
                last_entry_ts: last_ts,
            });
        }

        if first_ts.is_none() {
            first_ts = Some(entry.ts);
        }
        last_ts = Some(entry.ts);
        expected_prev = entry.hash;
        total += 1;
    }

    Ok(VerifyResult {
        valid: true,
        broken_at: None,
        broken_reason: None,
        total_entries: total,
        first_entry_ts: first_ts,
        last_entry_ts: last_ts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn genesis_entry_links_to_literal_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let chain = AuditChain::new(dir.path().join("audit.jsonl"));
        let entry = chain.append("tool_start", Some("scan_repo"), json!({"a": 1})).unwrap();
        assert_eq!(entry.prev_hash, GENESIS_HASH);
    }

    #[test]
    fn chain_links_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let chain = AuditChain::new(&path);
        let e1 = chain.append("tool_start", Some("scan_repo"), json!({"a": 1})).unwrap();
        let e2 = chain.append("tool_end", Some("scan_repo"), json!({"ok": true})).unwrap();
        assert_eq!(e2.prev_hash, e1.hash);

        let result = verify(&path).unwrap();
        assert!(result.valid);
        assert_eq!(result.total_entries, 2);
    }

    #[test]
    fn missing_file_is_valid_with_zero_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.jsonl");
        let result = verify(&path).unwrap();
        assert!(result.valid);
        assert_eq!(result.total_entries, 0);
    }

    #[test]
    fn tampering_a_single_byte_is_detected_at_the_right_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let chain = AuditChain::new(&path);
        chain.append("tool_start", Some("scan_repo"), json!({"a": 1})).unwrap();
        chain.append("tool_end", Some("scan_repo"), json!({"ok": true})).unwrap();
        chain.append("tool_start", Some("generate_audit_packet"), json!({})).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines: Vec<String> = contents.lines().map(|l| l.to_string()).collect();
        // flip one character inside line 2's data field
        let target = &mut lines[1];
        let patched = target.replacen("\"ok\":true", "\"ok\":false", 1);
        assert_ne!(&patched, target, "expected the patch to actually change line 2");
        *target = patched;
        std::fs::write(&path, lines.join("\n") + "\n").unwrap();

        let result = verify(&path).unwrap();
        assert!(!result.valid);
        assert_eq!(result.broken_at, Some(2));
    }

    #[test]
    fn sequential_appends_are_serialised() {
        let dir = tempfile::tempdir().unwrap();
        let chain = std::sync::Arc::new(AuditChain::new(dir.path().join("audit.jsonl")));
        let mut handles = Vec::new();
        for i in 0..8 {
            let chain = chain.clone();
            handles.push(std::thread::spawn(move || {
                chain.append("tool_start", Some("x"), json!({"i": i})).unwrap();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        let result = verify(chain.path()).unwrap();
        assert!(result.valid);
        assert_eq!(result.total_entries, 8);
    }
}
