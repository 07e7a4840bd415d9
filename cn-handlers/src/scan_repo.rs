use crate::context::HandlerContext;
use crate::validate::validate_framework;
use cn_core::{
    new_run_id, path_policy, CnResult, Framework, Manifest, PolicyManifest, ScanResult, Severity,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static RUN_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRepoRequest {
    pub repo_path: String,
    pub framework: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRepoResponse {
    pub run_id: String,
    pub coverage_pct: f64,
    pub finding_count: usize,
    pub scanner_statuses: Vec<cn_core::ScannerStatusRecord>,
}

/// Runs the full scan-and-normalise pipeline once: scanners, control
/// mapping and coverage, ROI, and a persisted `scan_result.json`. Every
/// write lands under `<repoPath>/.compliance/runs/<runId>/` and is
/// checked against that root before it happens.
pub async fn scan_repo(ctx: &HandlerContext, request: ScanRepoRequest) -> CnResult<ScanRepoResponse> {
    let request_json = serde_json::json!({
        "repoPath": request.repo_path.clone(),
        "framework": request.framework.clone(),
        "timeoutSecs": request.timeout_secs,
    });
    ctx.with_audit_bracket_async("scan_repo", request_json, run_scan(ctx, request))
        .await
}

async fn run_scan(ctx: &HandlerContext, request: ScanRepoRequest) -> CnResult<ScanRepoResponse> {
    path_policy::preflight_repo_path(&request.repo_path)?;
    let framework = validate_framework(&request.framework)?;

    let timeout = Duration::from_secs(
        request
            .timeout_secs
            .unwrap_or(cn_scan::DEFAULT_TIMEOUT_SECS)
            .min(cn_scan::MAX_TIMEOUT_SECS),
    );

    let entropy = format!(
        "{}-{}-{}",
        request.repo_path,
        std::process::id(),
        RUN_COUNTER.fetch_add(1, Ordering::SeqCst)
    );
    let started_at = chrono::Utc::now();
    let run_id = new_run_id(started_at, entropy.as_bytes());

    let run_dir = ctx.run_dir(&run_id);
    path_policy::assert_under(ctx.compliance_root(), &run_dir)?;
    let evidence_dir = run_dir.join("evidence");
    std::fs::create_dir_all(&evidence_dir)?;

    let run_results = cn_scan::run_all(ctx.repo_path(), &evidence_dir, timeout).await;

    let mut findings = Vec::new();
    let mut transcripts = Vec::new();
    let mut scanner_statuses = Vec::new();
    let mut scanner_versions: HashMap<String, Option<String>> = HashMap::new();

    for (kind, result) in cn_core::ScannerKind::ALL.iter().zip(run_results.into_iter()) {
        match result {
            Ok(r) => {
                scanner_versions.insert(kind.as_str().to_string(), r.version.clone());
                scanner_statuses.push(cn_core::ScannerStatusRecord {
                    scanner: r.scanner,
                    status: r.status,
                    message: r.message,
                    version: r.version,
                });
                if let Some(t) = r.transcript {
                    transcripts.push(t);
                }
                findings.extend(r.findings);
            }
            Err(e) => {
                scanner_versions.insert(kind.as_str().to_string(), None);
                scanner_statuses.push(cn_core::ScannerStatusRecord {
                    scanner: *kind,
                    status: cn_core::ScannerStatus::Error,
                    message: Some(e.to_string()),
                    version: None,
                });
            }
        }
    }

    cn_controls::annotate_findings(framework, &mut findings);

    let coverage = cn_controls::compute_coverage(framework, &findings, &scanner_statuses);
    let roi_estimate = cn_controls::estimate_roi(&findings);

    let mut counts_by_severity_all: HashMap<Severity, usize> = HashMap::new();
    let mut counts_by_severity: HashMap<Severity, usize> = HashMap::new();
    let mut counts_by_scanner: HashMap<cn_core::ScannerKind, usize> = HashMap::new();
    for finding in &findings {
        *counts_by_severity_all.entry(finding.severity).or_insert(0) += 1;
        if !finding.is_meta() {
            *counts_by_severity.entry(finding.severity).or_insert(0) += 1;
            *counts_by_scanner.entry(finding.scanner).or_insert(0) += 1;
        }
    }

    let finished_at = chrono::Utc::now();

    let manifest = Manifest {
        generated_at: finished_at,
        run_id: run_id.clone(),
        repo_path: request.repo_path.clone(),
        repo_commit_hash: read_head_commit(ctx.repo_path()),
        os: std::env::consts::OS.to_string(),
        scanner_versions,
        framework: framework.as_str().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        policy: PolicyManifest {
            command_allowlist_descriptions: cn_core::descriptions(),
            execution_model: "direct spawn, no shell, allowlisted commands only".to_string(),
            path_policy: "every write confined under <repoPath>/.compliance".to_string(),
        },
        excluded_paths: Vec::new(),
    };

    let coverage_pct = coverage.coverage_pct;
    let finding_count = findings.iter().filter(|f| !f.is_meta()).count();

    let result = ScanResult {
        run_id: run_id.clone(),
        framework,
        repo_path: request.repo_path.clone(),
        started_at,
        finished_at,
        findings,
        counts_by_severity,
        counts_by_severity_all,
        counts_by_scanner,
        control_coverage: coverage,
        roi_estimate,
        scanner_statuses: scanner_statuses.clone(),
        manifest,
        transcripts,
        evidence_dir: evidence_dir.display().to_string(),
    };

    let result_path = run_dir.join("scan_result.json");
    path_policy::assert_under(ctx.compliance_root(), &result_path)?;
    std::fs::write(&result_path, serde_json::to_vec_pretty(&result)?)?;

    Ok(ScanRepoResponse {
        run_id,
        coverage_pct,
        finding_count,
        scanner_statuses,
    })
}

fn read_head_commit(repo_path: &std::path::Path) -> Option<String> {
    let head = std::fs::read_to_string(repo_path.join(".git").join("HEAD")).ok()?;
    let head = head.trim();
    if let Some(ref_path) = head.strip_prefix("ref: ") {
        std::fs::read_to_string(repo_path.join(".git").join(ref_path))
            .ok()
            .map(|s| s.trim().to_string())
    } else {
        Some(head.to_string())
    }
}

/// Reads a persisted `scan_result.json` back, for handlers that operate on
/// a prior run (`generate_audit_packet`, `plan_remediation`, `create_tickets`).
pub fn read_scan_result(ctx: &HandlerContext, run_id: &str) -> CnResult<ScanResult> {
    let path = ctx.run_dir(run_id).join("scan_result.json");
    let bytes = std::fs::read(&path).map_err(|_| cn_core::CnError::NotFound {
        kind: "scan_result".to_string(),
        id: run_id.to_string(),
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

