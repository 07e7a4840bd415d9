use cn_core::{Finding, Framework, PlanItem};

pub const FINDING_MARKER_PREFIX: &str = "CN-FINDING-ID:";
pub const RUN_MARKER_PREFIX: &str = "CN-RUN-ID:";

fn label_for_severity(severity: cn_core::Severity) -> String {
    format!("cn/{severity}")
}

/// Builds one `PlanItem` per actionable finding (`scanner-missing` markers
/// are never ticketed — they represent absent coverage, not a fixable
/// defect). Items are severity-sorted so the plan reads most-urgent-first,
/// and every body carries both marker lines `search_by_marker` depends on
/// for dedup.
pub fn build_plan_items(framework: Framework, run_id: &str, findings: &[Finding]) -> Vec<PlanItem> {
    let mut actionable: Vec<&Finding> = findings.iter().filter(|f| !f.is_meta()).collect();
    actionable.sort_by_key(|f| f.severity);

    actionable
        .into_iter()
        .map(|finding| {
            let title = format!(
                "[{}][{}][{}] {}",
                framework.as_str().to_uppercase(),
                finding.severity.as_str().to_uppercase(),
                finding.scanner,
                finding.title
            );

            let mut body = String::new();
            body.push_str(&format!("{FINDING_MARKER_PREFIX} {}\n", finding.id));
            body.push_str(&format!("{RUN_MARKER_PREFIX} {run_id}\n\n"));
            if let Some(description) = &finding.description {
                body.push_str(description);
                body.push_str("\n\n");
            }
            if let Some(file) = &finding.file {
                let location = match finding.line {
                    Some(line) => format!("{file}:{line}"),
                    None => file.clone(),
                };
                body.push_str(&format!("Location: {location}\n"));
            }
            if let Some(remediation) = &finding.remediation {
                body.push_str(&format!("Remediation: {remediation}\n"));
            }

            PlanItem {
                finding_id: finding.id.clone(),
                title,
                body,
                labels: vec![label_for_severity(finding.severity), format!("cn/{}", finding.scanner)],
                dedupe_query: format!("{FINDING_MARKER_PREFIX} {}", finding.id),
            }
        })
        .collect()
}

/// Extracts the `CN-FINDING-ID:` value from an issue/ticket body, used by
/// adapters to confirm a search hit is actually for this finding and not a
/// substring coincidence elsewhere in the text.
pub fn finding_id_from_body(body: &str) -> Option<String> {
    body.lines().find_map(|line| {
        line.trim()
            .strip_prefix(FINDING_MARKER_PREFIX)
            .map(|rest| rest.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cn_core::{Evidence, EvidenceKind, ScannerKind, Severity};

    fn finding(id: &str, severity: Severity, meta: bool) -> Finding {
        Finding {
            id: id.to_string(),
            scanner: ScannerKind::Gitleaks,
            severity,
            title: "Secret detected".to_string(),
            description: Some("A secret was found.".to_string()),
            file: Some("config.env".to_string()),
            line: Some(3),
            evidence: Evidence {
                kind: EvidenceKind::ScannerNative,
                reference: "gitleaks.json".to_string(),
            },
            remediation: Some("Rotate the credential.".to_string()),
            tags: if meta {
                vec![cn_core::META_FINDING_TAG.to_string()]
            } else {
                vec![]
            },
            controls: Default::default(),
        }
    }

    #[test]
    fn excludes_meta_findings_and_sorts_by_severity() {
        let findings = vec![
            finding("f1", Severity::Low, false),
            finding("f2", Severity::Critical, true),
            finding("f3", Severity::Critical, false),
        ];
        let items = build_plan_items(Framework::Soc2, "run-1", &findings);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].finding_id, "f3");
    }

    #[test]
    fn body_carries_both_marker_lines() {
        let findings = vec![finding("f1", Severity::High, false)];
        let items = build_plan_items(Framework::Hipaa, "run-7", &findings);
        assert!(items[0].body.contains("CN-FINDING-ID: f1"));
        assert!(items[0].body.contains("CN-RUN-ID: run-7"));
    }

    #[test]
    fn extracts_finding_id_from_body() {
        let findings = vec![finding("f9", Severity::Medium, false)];
        let items = build_plan_items(Framework::Soc2, "run-1", &findings);
        assert_eq!(finding_id_from_body(&items[0].body).as_deref(), Some("f9"));
    }
}
