use super::map_native_severity;
use cn_core::{stable_id, Evidence, EvidenceKind, Finding, ScannerKind, Severity};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CheckovDocument {
    Many(Vec<CheckovReport>),
    One(CheckovReport),
}

#[derive(Debug, Deserialize)]
struct CheckovReport {
    results: CheckovResults,
}

#[derive(Debug, Deserialize)]
struct CheckovResults {
    #[serde(default)]
    failed_checks: Vec<FailedCheck>,
}

#[derive(Debug, Deserialize)]
struct FailedCheck {
    check_id: String,
    check_name: Option<String>,
    resource: Option<String>,
    file_path: Option<String>,
    file_line_range: Option<Vec<i64>>,
    severity: Option<String>,
    guideline: Option<String>,
}

fn severity_of(check: &FailedCheck) -> Severity {
    match &check.severity {
        Some(s) => map_native_severity(s),
        None => Severity::Medium,
    }
}

pub fn normalise(native_bytes: &[u8]) -> Vec<Finding> {
    let doc: CheckovDocument = match serde_json::from_slice(native_bytes) {
        Ok(d) => d,
        Err(_) => return Vec::new(),
    };

    let reports = match doc {
        CheckovDocument::Many(r) => r,
        CheckovDocument::One(r) => vec![r],
    };

    reports
        .into_iter()
        .flat_map(|report| report.results.failed_checks)
        .map(|check| {
            let resource = check.resource.clone().unwrap_or_default();
            let file = check.file_path.clone().unwrap_or_default();
            let line = check
                .file_line_range
                .as_ref()
                .and_then(|r| r.first())
                .filter(|l| **l >= 0)
                .map(|l| *l as u64);

            Finding {
                id: stable_id(&["checkov", &check.check_id, &resource, &file]),
                scanner: ScannerKind::Checkov,
                severity: severity_of(&check),
                title: check
                    .check_name
                    .clone()
                    .unwrap_or_else(|| format!("Failed check {}", check.check_id)),
                description: Some(format!(
                    "{} failed for resource {}",
                    check.check_id, resource
                )),
                file: check.file_path,
                line,
                evidence: Evidence {
                    kind: EvidenceKind::ScannerNative,
                    reference: "checkov.json".to_string(),
                },
                remediation: check.guideline,
                tags: vec!["iac".to_string()],
                controls: Default::default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_object_document_is_supported() {
        let raw = br#"{
            "results": {
                "failed_checks": [{
                    "check_id": "CKV_AWS_19",
                    "check_name": "S3 bucket should have encryption enabled",
                    "resource": "aws_s3_bucket.data",
                    "file_path": "/main.tf",
                    "file_line_range": [10, 14],
                    "severity": "HIGH"
                }]
            }
        }"#;
        let findings = normalise(raw);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].line, Some(10));
    }

    #[test]
    fn array_document_is_supported_and_missing_severity_defaults_to_medium() {
        let raw = br#"[
            {"results": {"failed_checks": [{"check_id": "CKV_AWS_1", "resource": "r1", "file_path": "/a.tf"}]}},
            {"results": {"failed_checks": [{"check_id": "CKV_AWS_2", "resource": "r2", "file_path": "/b.tf"}]}}
        ]"#;
        let findings = normalise(raw);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn malformed_json_yields_empty_list() {
        assert!(normalise(b"nope").is_empty());
    }
}
