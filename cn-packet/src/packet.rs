use cn_core::{path_policy, CnError, CnResult, ScanResult, ScannerStatus};
use std::path::{Path, PathBuf};

/// Where an audit packet for one run is written, relative to the
/// compliance root: `runs/<runId>/audit_packet/`.
pub fn packet_dir(compliance_root: &Path, run_id: &str) -> PathBuf {
    compliance_root
        .join("runs")
        .join(run_id)
        .join("audit_packet")
}

/// Writes the full audit packet for a finished scan: `index.md`,
/// `findings.json`, `coverage.json`, `roi.json`, `manifest.json`, and an
/// `evidence/` directory copied (never moved) from the run's raw evidence.
/// Every destination is checked against `compliance_root` before any write.
pub fn write_packet(compliance_root: &Path, result: &ScanResult) -> CnResult<PathBuf> {
    let dest = packet_dir(compliance_root, &result.run_id);
    path_policy::assert_under(compliance_root, &dest)?;
    std::fs::create_dir_all(&dest)?;

    write_json(&dest.join("findings.json"), &result.findings, compliance_root)?;
    write_json(
        &dest.join("coverage.json"),
        &result.control_coverage,
        compliance_root,
    )?;
    write_json(&dest.join("roi.json"), &result.roi_estimate, compliance_root)?;
    write_json(&dest.join("manifest.json"), &result.manifest, compliance_root)?;

    let evidence_dest = dest.join("evidence");
    path_policy::assert_under(compliance_root, &evidence_dest)?;
    copy_evidence(Path::new(&result.evidence_dir), &evidence_dest)?;

    let index_path = dest.join("index.md");
    path_policy::assert_under(compliance_root, &index_path)?;
    std::fs::write(&index_path, render_index(result))?;

    tracing::info!(run_id = %result.run_id, path = %dest.display(), "audit packet written");
    Ok(dest)
}

fn write_json<T: serde::Serialize>(
    path: &Path,
    value: &T,
    compliance_root: &Path,
) -> CnResult<()> {
    path_policy::assert_under(compliance_root, path)?;
    let bytes = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn copy_evidence(source: &Path, dest: &Path) -> CnResult<()> {
    if !source.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let target = dest.join(entry.file_name());
        if file_type.is_dir() {
            copy_evidence(&entry.path(), &target)?;
        } else if file_type.is_file() {
            std::fs::copy(entry.path(), target)?;
        }
        // Symlinks are never followed.
    }
    Ok(())
}

/// How many scanner/finding themes to surface as the headline risk areas.
const RISK_THEME_COUNT: usize = 3;

/// How many individual findings to list in the severity-ranked detail table.
const TOP_FINDINGS_COUNT: usize = 10;

fn render_index(result: &ScanResult) -> String {
    let real_findings: Vec<&cn_core::Finding> = result.findings.iter().filter(|f| !f.is_meta()).collect();
    let total_findings = real_findings.len();
    let meta_findings = result.findings.len() - total_findings;

    let severity_lines = cn_core::Severity::ORDERED
        .iter()
        .map(|s| {
            let count = result.counts_by_severity.get(s).copied().unwrap_or(0);
            format!("- {}: {}", s, count)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let scanner_lines = result
        .scanner_statuses
        .iter()
        .map(|s| {
            let status = match s.status {
                ScannerStatus::Ok => "ok",
                ScannerStatus::Missing => "missing",
                ScannerStatus::Skipped => "skipped",
                ScannerStatus::Error => "error",
            };
            let version = s.version.as_deref().unwrap_or("unknown");
            format!("- {} — {} (version: {})", s.scanner, status, version)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let control_lines = result
        .control_coverage
        .control_details
        .iter()
        .map(|c| {
            let status = match c.status {
                cn_core::ControlStatus::Covered => "covered",
                cn_core::ControlStatus::Gap => "gap",
            };
            format!("- [{}] {} — {} ({} findings)", c.id, c.name, status, c.finding_count)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let gap_lines = render_coverage_gaps(result);
    let risk_theme_lines = render_risk_themes(&real_findings);
    let top_findings_lines = render_top_findings(&real_findings);
    let recommended_action_lines = render_recommended_actions(&real_findings);
    let scope_limitation_lines = render_scope_limitations(result);
    let policy_lines = render_policy_block(result);

    format!(
        r#"# Compliance Navigator Audit Packet

Run `{run_id}` against `{repo_path}` ({framework}), started {started} and finished {finished}.

## Executive Summary

- Findings (excluding coverage-gap markers): {total_findings}
- Coverage-gap markers: {meta_findings}
- Control coverage: {coverage_pct:.1}% demonstrated, {coverage_pct_potential:.1}% attempted, {coverage_pct_full:.1}% reachable with the current scanner stack
- Estimated manual triage time saved: {hours_conservative:.1}-{hours_likely:.1} hours

## Top Risk Themes

{risk_theme_lines}

## Findings by Severity

{severity_lines}

## Scanner Status

{scanner_lines}

## Control Coverage ({framework})

{control_lines}

## Coverage Gaps

{gap_lines}

## Top Findings by Severity

{top_findings_lines}

## Recommended Actions

{recommended_action_lines}

## ROI Basis

{roi_basis}

## Scope Limitations

{scope_limitation_lines}

## Policy

{policy_lines}

## Evidence

Raw scanner output is preserved under `evidence/`. Machine-readable detail
is in `findings.json`, `coverage.json`, `roi.json`, and `manifest.json`
alongside this file.
"#,
        run_id = result.run_id,
        repo_path = result.repo_path,
        framework = result.framework,
        started = result.started_at.to_rfc3339(),
        finished = result.finished_at.to_rfc3339(),
        total_findings = total_findings,
        meta_findings = meta_findings,
        coverage_pct = result.control_coverage.coverage_pct,
        coverage_pct_potential = result.control_coverage.coverage_pct_potential,
        coverage_pct_full = result.control_coverage.coverage_pct_full,
        hours_conservative = result.roi_estimate.hours_saved_conservative,
        hours_likely = result.roi_estimate.hours_saved_likely,
        severity_lines = severity_lines,
        scanner_lines = scanner_lines,
        control_lines = control_lines,
        gap_lines = gap_lines,
        risk_theme_lines = risk_theme_lines,
        top_findings_lines = top_findings_lines,
        recommended_action_lines = recommended_action_lines,
        scope_limitation_lines = scope_limitation_lines,
        policy_lines = policy_lines,
        roi_basis = result.roi_estimate.basis,
    )
}

/// Controls with at least one scanner mapping (`full_control_ids`) that
/// still show no finding — the gap between what the stack could reach and
/// what it actually demonstrated, distinct from controls with no mapping at
/// all (those never appear in `full_control_ids` to begin with).
fn render_coverage_gaps(result: &ScanResult) -> String {
    let gaps: Vec<&cn_core::ControlDetail> = result
        .control_coverage
        .control_details
        .iter()
        .filter(|c| result.control_coverage.full_control_ids.contains(&c.id) && c.status == cn_core::ControlStatus::Gap)
        .collect();

    if gaps.is_empty() {
        return "- none — every control reachable by the current scanner stack has at least one finding.".to_string();
    }

    gaps.iter()
        .map(|c| format!("- [{}] {} has no finding yet", c.id, c.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ranks scanners by the severity-weighted volume of findings they raised
/// and names the top `RISK_THEME_COUNT` as the headline risk areas.
fn render_risk_themes(findings: &[&cn_core::Finding]) -> String {
    let mut by_scanner: std::collections::HashMap<cn_core::ScannerKind, (usize, u64)> = std::collections::HashMap::new();
    for f in findings {
        let entry = by_scanner.entry(f.scanner).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += severity_weight(f.severity);
    }

    let mut ranked: Vec<(cn_core::ScannerKind, usize, u64)> =
        by_scanner.into_iter().map(|(scanner, (count, weight))| (scanner, count, weight)).collect();
    ranked.sort_by(|a, b| b.2.cmp(&a.2).then(b.1.cmp(&a.1)));

    if ranked.is_empty() {
        return "- none — no findings were produced this run.".to_string();
    }

    ranked
        .into_iter()
        .take(RISK_THEME_COUNT)
        .map(|(scanner, count, _)| format!("- {} — {} finding(s), the largest concentration of risk this run", scanner, count))
        .collect::<Vec<_>>()
        .join("\n")
}

fn severity_weight(severity: cn_core::Severity) -> u64 {
    match severity {
        cn_core::Severity::Critical => 5,
        cn_core::Severity::High => 4,
        cn_core::Severity::Medium => 3,
        cn_core::Severity::Low => 2,
        cn_core::Severity::Info => 1,
    }
}

/// Itemizes the `TOP_FINDINGS_COUNT` highest-severity findings with id,
/// title, and file location, sorted by `Severity`'s declaration order
/// (`Critical` first).
fn render_top_findings(findings: &[&cn_core::Finding]) -> String {
    if findings.is_empty() {
        return "- none — no findings were produced this run.".to_string();
    }

    let mut sorted: Vec<&cn_core::Finding> = findings.to_vec();
    sorted.sort_by_key(|f| f.severity);

    sorted
        .into_iter()
        .take(TOP_FINDINGS_COUNT)
        .map(|f| {
            let location = match (&f.file, &f.line) {
                (Some(file), Some(line)) => format!(" ({file}:{line})"),
                (Some(file), None) => format!(" ({file})"),
                _ => String::new(),
            };
            format!("- [{}] {} — {}{}", f.id, f.severity, f.title, location)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One recommended action per finding in the top-findings slice, following
/// the same `remediation ?? description ?? title` fallback the remediation
/// plan itself uses, so a reader of just `index.md` already sees what to do
/// next without opening `remediation_plan.md`.
fn render_recommended_actions(findings: &[&cn_core::Finding]) -> String {
    if findings.is_empty() {
        return "- none — no findings were produced this run.".to_string();
    }

    let mut sorted: Vec<&cn_core::Finding> = findings.to_vec();
    sorted.sort_by_key(|f| f.severity);

    sorted
        .into_iter()
        .take(TOP_FINDINGS_COUNT)
        .map(|f| {
            let action = f
                .remediation
                .as_deref()
                .or(f.description.as_deref())
                .unwrap_or(&f.title);
            format!("- [{}] {}", f.id, action)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_scope_limitations(result: &ScanResult) -> String {
    let mut lines = vec![
        "- Only the scanners in the current stack (gitleaks, npm_audit, checkov) ran; controls with no mapping to any of them are never covered by automated evidence.".to_string(),
        "- A `skipped` scanner status (no applicable target, e.g. no package.json) counts toward potential coverage but not demonstrated coverage.".to_string(),
    ];
    if !result.manifest.excluded_paths.is_empty() {
        lines.push(format!(
            "- Excluded paths were not scanned: {}",
            result.manifest.excluded_paths.join(", ")
        ));
    }
    lines.join("\n")
}

fn render_policy_block(result: &ScanResult) -> String {
    let allowlist = if result.manifest.policy.command_allowlist_descriptions.is_empty() {
        "- none".to_string()
    } else {
        result
            .manifest
            .policy
            .command_allowlist_descriptions
            .iter()
            .map(|d| format!("- {d}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Execution model: {}\nPath policy: {}\nCommand allowlist:\n{}",
        result.manifest.policy.execution_model, result.manifest.policy.path_policy, allowlist
    )
}

/// Finds the most recently written packet under `compliance_root`, by
/// lexicographically-greatest `runs/` subdirectory name (run IDs are
/// constructed to sort chronologically).
pub fn latest_packet_index(compliance_root: &Path) -> CnResult<Option<PathBuf>> {
    let runs_dir = compliance_root.join("runs");
    if !runs_dir.exists() {
        return Ok(None);
    }

    let mut run_ids: Vec<String> = std::fs::read_dir(&runs_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    run_ids.sort();

    let latest = match run_ids.pop() {
        Some(id) => id,
        None => return Ok(None),
    };

    let index = packet_dir(compliance_root, &latest).join("index.md");
    if index.exists() {
        Ok(Some(index))
    } else {
        Err(CnError::NotFound {
            kind: "audit_packet_index".to_string(),
            id: latest,
        })
    }
}
