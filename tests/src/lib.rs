//! Shared fixture builders for the cross-crate integration tests in `tests/`.
//!
//! Most scenarios here do not need a live `gitleaks`/`npm`/`checkov`
//! invocation — only the scan-pipeline test does. Everything downstream of
//! a scan (packets, plans, tickets) is exercised against a `ScanResult`
//! built directly with the same `cn-controls` logic `scan_repo` itself
//! calls, so the fixture's coverage and ROI numbers are real, not faked.

use cn_core::{
    Evidence, EvidenceKind, Finding, Framework, Manifest, PolicyManifest, ScanResult,
    ScannerKind, ScannerStatus, ScannerStatusRecord, Severity,
};
use cn_handlers::HandlerContext;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Materializes the synthetic vulnerable-repo fixture under `dir` and
/// returns its path.
pub fn demo_repo(dir: &Path) -> PathBuf {
    let response = cn_handlers::create_demo_fixture(cn_handlers::CreateDemoFixtureRequest {
        target_dir: dir.display().to_string(),
    })
    .expect("demo fixture must materialize");
    PathBuf::from(response.repo_path)
}

fn finding(id: &str, scanner: ScannerKind, severity: Severity, meta: bool) -> Finding {
    Finding {
        id: id.to_string(),
        scanner,
        severity,
        title: format!("finding {id}"),
        description: Some("fixture finding".to_string()),
        file: Some("config.env".to_string()),
        line: Some(1),
        evidence: Evidence {
            kind: EvidenceKind::ScannerNative,
            reference: format!("{id}.json"),
        },
        remediation: Some("fix it".to_string()),
        tags: if meta {
            vec![cn_core::META_FINDING_TAG.to_string()]
        } else {
            vec![]
        },
        controls: HashMap::new(),
    }
}

/// A handful of findings spanning severities and scanners, plus one meta
/// (`scanner-missing`) marker, so exclusion arithmetic has something to
/// exclude.
pub fn sample_findings() -> Vec<Finding> {
    vec![
        finding("f-critical", ScannerKind::Gitleaks, Severity::Critical, false),
        finding("f-high", ScannerKind::Checkov, Severity::High, false),
        finding("f-medium", ScannerKind::NpmAudit, Severity::Medium, false),
        finding("f-low", ScannerKind::Checkov, Severity::Low, false),
        finding("f-missing", ScannerKind::NpmAudit, Severity::Info, true),
    ]
}

/// Builds a full `ScanResult` the way `scan_repo` would, given a fixed set
/// of findings and a status record per scanner, then persists it under
/// `ctx`'s run directory so `read_scan_result` can load it back.
pub fn write_fixture_scan_result(
    ctx: &HandlerContext,
    run_id: &str,
    framework: Framework,
    mut findings: Vec<Finding>,
) -> ScanResult {
    cn_controls::annotate_findings(framework, &mut findings);

    let scanner_statuses: Vec<ScannerStatusRecord> = ScannerKind::ALL
        .iter()
        .map(|kind| ScannerStatusRecord {
            scanner: *kind,
            status: ScannerStatus::Ok,
            message: None,
            version: Some("0.0.0-fixture".to_string()),
        })
        .collect();

    let coverage = cn_controls::compute_coverage(framework, &findings, &scanner_statuses);
    let roi_estimate = cn_controls::estimate_roi(&findings);

    let mut counts_by_severity_all: HashMap<Severity, usize> = HashMap::new();
    let mut counts_by_severity: HashMap<Severity, usize> = HashMap::new();
    let mut counts_by_scanner: HashMap<ScannerKind, usize> = HashMap::new();
    for f in &findings {
        *counts_by_severity_all.entry(f.severity).or_insert(0) += 1;
        if !f.is_meta() {
            *counts_by_severity.entry(f.severity).or_insert(0) += 1;
            *counts_by_scanner.entry(f.scanner).or_insert(0) += 1;
        }
    }

    let started_at = chrono::Utc::now();
    let finished_at = started_at;

    let manifest = Manifest {
        generated_at: finished_at,
        run_id: run_id.to_string(),
        repo_path: ctx.repo_path().display().to_string(),
        repo_commit_hash: None,
        os: std::env::consts::OS.to_string(),
        scanner_versions: HashMap::new(),
        framework: framework.as_str().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        policy: PolicyManifest {
            command_allowlist_descriptions: cn_core::descriptions(),
            execution_model: "direct spawn, no shell, allowlisted commands only".to_string(),
            path_policy: "every write confined under <repoPath>/.compliance".to_string(),
        },
        excluded_paths: Vec::new(),
    };

    let result = ScanResult {
        run_id: run_id.to_string(),
        framework,
        repo_path: ctx.repo_path().display().to_string(),
        started_at,
        finished_at,
        findings,
        counts_by_severity,
        counts_by_severity_all,
        counts_by_scanner,
        control_coverage: coverage,
        roi_estimate,
        scanner_statuses,
        manifest,
        transcripts: Vec::new(),
        evidence_dir: ctx.run_dir(run_id).join("evidence").display().to_string(),
    };

    let run_dir = ctx.run_dir(run_id);
    std::fs::create_dir_all(&run_dir).expect("run dir must create");
    let result_path = run_dir.join("scan_result.json");
    std::fs::write(&result_path, serde_json::to_vec_pretty(&result).unwrap()).expect("scan result must persist");

    result
}
