use cn_core::{stable_id, Evidence, EvidenceKind, Finding, ScannerKind, Severity};
use serde::Deserialize;
use std::sync::OnceLock;

/// One record from gitleaks's native JSON report. Unknown fields are
/// permitted; only the fields this normaliser reads are required.
#[derive(Debug, Deserialize)]
struct GitleaksRecord {
    #[serde(rename = "RuleID")]
    rule_id: String,
    #[serde(rename = "File")]
    file: String,
    #[serde(rename = "StartLine")]
    start_line: Option<i64>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Tags", default)]
    tags: Vec<String>,
}

fn critical_rule_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"(?i)private-key|aws-secret|github-pat").expect("must compile")
    })
}

fn severity_for_rule(rule_id: &str) -> Severity {
    if critical_rule_regex().is_match(rule_id) {
        Severity::Critical
    } else {
        Severity::High
    }
}

pub fn normalise(native_bytes: &[u8]) -> Vec<Finding> {
    let records: Vec<GitleaksRecord> = match serde_json::from_slice(native_bytes) {
        Ok(r) => r,
        Err(_) => return Vec::new(),
    };

    records
        .into_iter()
        .map(|record| {
            let line = record.start_line.filter(|l| *l >= 0).map(|l| l as u64);
            let id = stable_id(&[
                "gitleaks",
                &record.rule_id,
                &record.file,
                &line.map(|l| l.to_string()).unwrap_or_default(),
            ]);
            let mut tags = record.tags;
            Finding {
                id,
                scanner: ScannerKind::Gitleaks,
                severity: severity_for_rule(&record.rule_id),
                title: format!("Secret detected: {}", record.rule_id),
                description: record.description,
                file: Some(record.file.clone()),
                line,
                evidence: Evidence {
                    kind: EvidenceKind::ScannerNative,
                    reference: "gitleaks.json".to_string(),
                },
                remediation: Some(format!(
                    "Revoke the exposed credential matched by rule `{}` and remove it from version control history.",
                    record.rule_id
                )),
                tags: {
                    tags.retain(|t| !t.is_empty());
                    tags
                },
                controls: Default::default(),
            }
        })
        .collect()
}
