use super::map_native_severity;
use cn_core::{stable_id, Evidence, EvidenceKind, Finding, ScannerKind};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct NpmAuditReport {
    #[serde(default)]
    vulnerabilities: HashMap<String, NpmVulnerability>,
}

#[derive(Debug, Deserialize)]
struct NpmVulnerability {
    severity: Option<String>,
    #[serde(default)]
    via: Vec<ViaEntry>,
    #[serde(rename = "fixAvailable")]
    fix_available: Option<serde_json::Value>,
    range: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ViaEntry {
    Named(String),
    Detailed { title: Option<String> },
}

fn first_via_title(via: &[ViaEntry]) -> Option<String> {
    via.iter().find_map(|v| match v {
        ViaEntry::Detailed { title: Some(t) } => Some(t.clone()),
        _ => None,
    })
}

fn fix_version(fix_available: &Option<serde_json::Value>) -> Option<String> {
    match fix_available {
        Some(serde_json::Value::Object(map)) => map
            .get("name")
            .and_then(|v| v.as_str())
            .zip(map.get("version").and_then(|v| v.as_str()))
            .map(|(name, version)| format!("{name}@{version}")),
        _ => None,
    }
}

pub fn normalise(native_bytes: &[u8]) -> Vec<Finding> {
    let report: NpmAuditReport = match serde_json::from_slice(native_bytes) {
        Ok(r) => r,
        Err(_) => return Vec::new(),
    };

    let mut packages: Vec<_> = report.vulnerabilities.into_iter().collect();
    packages.sort_by(|a, b| a.0.cmp(&b.0));

    packages
        .into_iter()
        .map(|(package, vuln)| {
            let native_severity = vuln.severity.clone().unwrap_or_else(|| "*".to_string());
            let severity = map_native_severity(&native_severity);
            let title = first_via_title(&vuln.via)
                .unwrap_or_else(|| format!("Vulnerable dependency: {package}"));

            let remediation = match fix_version(&vuln.fix_available) {
                Some(upgrade) => format!("Upgrade {package} to {upgrade}."),
                None => "Run `npm audit fix` to apply the recommended remediation.".to_string(),
            };

            let description = vuln
                .range
                .as_ref()
                .map(|r| format!("Affects versions matching range {r}"));

            Finding {
                id: stable_id(&["npm_audit", &package, &native_severity]),
                scanner: ScannerKind::NpmAudit,
                severity,
                title,
                description,
                file: Some("package.json".to_string()),
                line: None,
                evidence: Evidence {
                    kind: EvidenceKind::ScannerNative,
                    reference: "npm-audit.json".to_string(),
                },
                remediation: Some(remediation),
                tags: vec!["dependency".to_string()],
                controls: Default::default(),
            }
        })
        .collect()
}
