use cn_core::{Finding, RoiBreakdownEntry, RoiEstimate, ScannerKind};
use std::collections::HashMap;

/// Conservative minutes-per-finding table, by scanner: how long a
/// reasonably experienced engineer takes to triage and remediate one
/// finding of that scanner's kind, assuming no process overhead.
const CONSERVATIVE_MULTIPLIER: f64 = 1.0;

/// The "likely" estimate accounts for ticket routing, review, and retest
/// overhead on top of the raw fix time.
const LIKELY_MULTIPLIER: f64 = 1.8;

fn minutes_per_finding(scanner: ScannerKind) -> u64 {
    match scanner {
        ScannerKind::Gitleaks => 25,
        ScannerKind::NpmAudit => 10,
        ScannerKind::Checkov => 15,
    }
}

pub const ROI_BASIS: &str = "Estimated from per-scanner remediation minute tables (secret rotation and triage, dependency bump and retest, infrastructure-as-code fix and plan/apply). Conservative assumes no process overhead; likely adds a 1.8x multiplier for ticket routing, review, and retest. These are estimates, not a substitute for tracked engineering time.";

/// Estimates the human time the three scanners' findings would otherwise
/// cost to find manually. Meta findings (`scanner-missing`) are excluded:
/// they represent an absence of coverage, not remediation work.
pub fn estimate_roi(findings: &[Finding]) -> RoiEstimate {
    let mut counts: HashMap<ScannerKind, usize> = HashMap::new();
    for finding in findings.iter().filter(|f| !f.is_meta()) {
        *counts.entry(finding.scanner).or_insert(0) += 1;
    }

    let mut breakdown = Vec::with_capacity(ScannerKind::ALL.len());
    let mut total_minutes: u64 = 0;

    for scanner in ScannerKind::ALL {
        let finding_count = counts.get(&scanner).copied().unwrap_or(0);
        let per_finding = minutes_per_finding(scanner);
        let minutes = per_finding * finding_count as u64;
        total_minutes += minutes;
        breakdown.push(RoiBreakdownEntry {
            scanner,
            finding_count,
            minutes_per_finding: per_finding,
            minutes,
        });
    }

    let base_hours = total_minutes as f64 / 60.0;
    let hours_saved_conservative = round2(base_hours * CONSERVATIVE_MULTIPLIER);
    let hours_saved_likely = round2(base_hours * LIKELY_MULTIPLIER);

    RoiEstimate {
        hours_saved: hours_saved_conservative,
        hours_saved_conservative,
        hours_saved_likely,
        basis: ROI_BASIS.to_string(),
        breakdown,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use cn_core::{Evidence, EvidenceKind, Severity};

    fn finding(scanner: ScannerKind, tags: Vec<&str>) -> Finding {
        Finding {
            id: "f".to_string(),
            scanner,
            severity: Severity::Medium,
            title: "t".to_string(),
            description: None,
            file: None,
            line: None,
            evidence: Evidence {
                kind: EvidenceKind::ScannerNative,
                reference: "x.json".to_string(),
            },
            remediation: None,
            tags: tags.into_iter().map(String::from).collect(),
            controls: Default::default(),
        }
    }

    #[test]
    fn excludes_meta_findings_from_the_estimate() {
        let findings = vec![
            finding(ScannerKind::Gitleaks, vec![]),
            finding(ScannerKind::NpmAudit, vec!["scanner-missing"]),
        ];
        let roi = estimate_roi(&findings);
        let npm_entry = roi
            .breakdown
            .iter()
            .find(|e| e.scanner == ScannerKind::NpmAudit)
            .unwrap();
        assert_eq!(npm_entry.finding_count, 0);
    }

    #[test]
    fn likely_estimate_is_always_at_least_conservative() {
        let findings = vec![finding(ScannerKind::Checkov, vec![])];
        let roi = estimate_roi(&findings);
        assert!(roi.hours_saved_likely >= roi.hours_saved_conservative);
        assert_eq!(roi.hours_saved, roi.hours_saved_conservative);
    }

    #[test]
    fn empty_findings_yield_zero_hours() {
        let roi = estimate_roi(&[]);
        assert_eq!(roi.hours_saved_conservative, 0.0);
        assert_eq!(roi.hours_saved_likely, 0.0);
        assert!(!roi.basis.is_empty());
    }
}
