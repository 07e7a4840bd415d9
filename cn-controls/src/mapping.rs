use crate::frameworks::{controls_for, Control};
use cn_core::{
    ControlDetail, ControlStatus, CoverageResult, Finding, FindingControls, Framework,
    ScannerStatus, ScannerStatusRecord,
};
use std::collections::HashMap;

/// Below this confidence a scanner mapping is too weak to cite as evidence
/// for a control on an individual finding.
const ANNOTATION_CONFIDENCE_THRESHOLD: f64 = 0.3;

/// Attaches `controls[framework]` to every finding whose scanner maps to one
/// or more controls in the given framework, above the annotation threshold.
/// Findings that match nothing are left untouched (no empty entry is added).
pub fn annotate_findings(framework: Framework, findings: &mut [Finding]) {
    let controls = controls_for(framework);

    for finding in findings.iter_mut() {
        if finding.is_meta() {
            continue;
        }

        let matches: Vec<(&Control, f64)> = controls
            .iter()
            .filter_map(|control| {
                control
                    .scanner_mappings
                    .iter()
                    .find(|m| m.scanner == finding.scanner)
                    .map(|m| (control, m.confidence))
            })
            .filter(|(_, confidence)| *confidence >= ANNOTATION_CONFIDENCE_THRESHOLD)
            .collect();

        if matches.is_empty() {
            continue;
        }

        let peak_confidence = matches
            .iter()
            .map(|(_, c)| *c)
            .fold(0.0_f64, f64::max);

        let ids: Vec<String> = matches.iter().map(|(c, _)| c.id.to_string()).collect();
        let rationale = format!(
            "{} findings from {} are mapped to {} control(s) on the basis of the scanner's known coverage of this control family.",
            finding.severity,
            finding.scanner,
            ids.len()
        );

        finding.controls.insert(
            framework.as_str().to_string(),
            FindingControls {
                ids,
                rationale,
                confidence: peak_confidence,
            },
        );
    }
}

fn status_of(statuses: &[ScannerStatusRecord], scanner: cn_core::ScannerKind) -> Option<ScannerStatus> {
    statuses
        .iter()
        .find(|s| s.scanner == scanner)
        .map(|s| s.status)
}

/// Computes the three nested coverage percentages over the full control set
/// of `framework`:
///
/// - `full`: controls with at least one scanner mapping at all — the ceiling
///   the current scanner stack can ever reach for this framework.
/// - `potential`: the subset of `full` reachable by a mapped scanner whose
///   status was `ok` or `skipped` this cycle — scanners that actually had a
///   chance to produce evidence, whether or not they found anything.
/// - `covered`: the subset of `full` for which `findings` (already annotated
///   by `annotate_findings`) contains at least one real, non-meta finding
///   mapped to the control — evidence was actually produced, not merely
///   attempted.
///
/// `covered` is not required to be a subset of `potential`: a scanner can run
/// clean (`ok`, nothing found) while a different scanner mapped to the same
/// control produced a finding, or vice versa. `CoverageResult::is_ordered`
/// only requires `covered <= potential <= full`, which holds because all
/// three counts are capped by the same `full` control set.
pub fn compute_coverage(
    framework: Framework,
    findings: &[Finding],
    statuses: &[ScannerStatusRecord],
) -> CoverageResult {
    let controls = controls_for(framework);
    let total = controls.len().max(1) as f64;
    let key = framework.as_str();

    let mut finding_counts: HashMap<&str, usize> = HashMap::new();
    for finding in findings {
        if let Some(fc) = finding.controls.get(key) {
            for id in &fc.ids {
                *finding_counts.entry(id.as_str()).or_insert(0) += 1;
            }
        }
    }

    let mut covered_ids = Vec::new();
    let mut potential_ids = Vec::new();
    let mut full_ids = Vec::new();
    let mut details = Vec::with_capacity(controls.len());

    for control in controls {
        if control.scanner_mappings.is_empty() {
            details.push(ControlDetail {
                id: control.id.to_string(),
                name: control.name.to_string(),
                status: ControlStatus::Gap,
                finding_count: 0,
            });
            continue;
        }

        full_ids.push(control.id.to_string());

        let reachable = control
            .scanner_mappings
            .iter()
            .filter_map(|m| status_of(statuses, m.scanner))
            .any(|s| matches!(s, ScannerStatus::Ok | ScannerStatus::Skipped));
        if reachable {
            potential_ids.push(control.id.to_string());
        }

        let finding_count = finding_counts.get(control.id).copied().unwrap_or(0);
        let has_finding = finding_count > 0;
        if has_finding {
            covered_ids.push(control.id.to_string());
        }

        details.push(ControlDetail {
            id: control.id.to_string(),
            name: control.name.to_string(),
            status: if has_finding {
                ControlStatus::Covered
            } else {
                ControlStatus::Gap
            },
            finding_count,
        });
    }

    CoverageResult {
        coverage_pct: round2(covered_ids.len() as f64 / total * 100.0),
        covered_control_ids: covered_ids,
        coverage_pct_potential: round2(potential_ids.len() as f64 / total * 100.0),
        potential_control_ids: potential_ids,
        coverage_pct_full: round2(full_ids.len() as f64 / total * 100.0),
        full_control_ids: full_ids,
        control_details: details,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
