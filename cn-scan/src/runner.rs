use crate::spec::{
    build_args, command_line_for_allowlist, gitleaks_config_path, npm_precondition_met,
    program_name, spec_for, version_probe_args, version_probe_command_line, OutputLocation,
};
use cn_core::{
    assert_allowed, assert_shell_safe_argument, quote_for_shell, CnResult, Evidence, EvidenceKind,
    Finding, ScannerKind, ScannerRun, ScannerStatus, META_FINDING_TAG,
};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10 * 60;
pub const MAX_TIMEOUT_SECS: u64 = 60 * 60;
pub const VERSION_PROBE_TIMEOUT_SECS: u64 = 10;

/// The outcome of running (or skipping, or failing to run) one scanner.
pub struct ScannerRunResult {
    pub scanner: ScannerKind,
    pub status: ScannerStatus,
    pub findings: Vec<Finding>,
    pub transcript: Option<ScannerRun>,
    pub message: Option<String>,
    pub version: Option<String>,
}

struct ProcessOutcome {
    command_line: String,
    exit_code: Option<i32>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    timed_out: bool,
    started_at: chrono::DateTime<chrono::Utc>,
    finished_at: chrono::DateTime<chrono::Utc>,
}

fn shell_wrap(program: &str, args: &[String]) -> (String, Vec<String>) {
    for arg in args {
        if assert_shell_safe_argument(arg).is_err() {
            tracing::warn!(arg, "rejected shell-unsafe argument for batch invocation");
        }
    }
    let quoted: Vec<String> = args.iter().map(|a| quote_for_shell(a)).collect();
    let full = format!("{} {}", program, quoted.join(" "));
    #[cfg(windows)]
    {
        ("cmd".to_string(), vec!["/C".to_string(), full])
    }
    #[cfg(not(windows))]
    {
        let _ = full;
        (program.to_string(), args.to_vec())
    }
}

async fn run_process(
    program: &str,
    args: &[String],
    needs_shell: bool,
    cwd: &Path,
    timeout: Duration,
) -> std::io::Result<ProcessOutcome> {
    let (exec, exec_args) = if needs_shell {
        for arg in args {
            cn_core::assert_shell_safe_argument(arg).map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "unsafe shell argument")
            })?;
        }
        shell_wrap(program, args)
    } else {
        (program.to_string(), args.to_vec())
    };

    let command_line = format!("{} {}", program, args.join(" "));
    let started_at = chrono::Utc::now();

    let mut cmd = Command::new(&exec);
    cmd.args(&exec_args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn()?;
    let mut child_stdout = child.stdout.take().expect("stdout was piped");
    let mut child_stderr = child.stderr.take().expect("stderr was piped");

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = child_stdout.read_to_end(&mut buf).await;
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = child_stderr.read_to_end(&mut buf).await;
        buf
    });

    let wait_result = tokio::time::timeout(timeout, child.wait()).await;

    let (exit_code, timed_out) = match wait_result {
        Ok(Ok(status)) => (status.code(), false),
        Ok(Err(e)) => return Err(e),
        Err(_elapsed) => {
            // Grace window, then escalate to a forceful kill if still alive.
            let _ = child.start_kill();
            let grace = tokio::time::timeout(Duration::from_secs(2), child.wait()).await;
            if grace.is_err() {
                let _ = child.kill().await;
            }
            (None, true)
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();
    let finished_at = chrono::Utc::now();

    Ok(ProcessOutcome {
        command_line,
        exit_code,
        stdout,
        stderr,
        timed_out,
        started_at,
        finished_at,
    })
}

fn looks_missing(exit_code: Option<i32>, stderr: &str) -> bool {
    exit_code == Some(127)
        || stderr.contains("ENOENT")
        || stderr.contains("is not recognized")
        || stderr.contains("not found")
}

fn missing_meta_finding(scanner: ScannerKind, reason: &str) -> Finding {
    Finding {
        id: cn_core::stable_id(&[scanner.as_str(), "meta", "missing"]),
        scanner,
        severity: cn_core::Severity::Info,
        title: format!("{} scanner is not installed", scanner),
        description: Some(reason.to_string()),
        file: None,
        line: None,
        evidence: Evidence {
            kind: EvidenceKind::CommandOutput,
            reference: format!("{}-stderr.txt", scanner.as_str()),
        },
        remediation: Some(install_hint(scanner)),
        tags: vec![META_FINDING_TAG.to_string()],
        controls: Default::default(),
    }
}

fn install_hint(scanner: ScannerKind) -> String {
    match scanner {
        ScannerKind::Gitleaks => {
            "Install gitleaks (https://github.com/gitleaks/gitleaks) and ensure it is on PATH."
                .to_string()
        }
        ScannerKind::NpmAudit => {
            "Install Node.js/npm so `npm audit` is available on PATH.".to_string()
        }
        ScannerKind::Checkov => {
            "Install checkov (`pip install checkov`) and ensure it is on PATH.".to_string()
        }
    }
}

async fn write_evidence(path: &Path, bytes: &[u8]) -> CnResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Runs one scanner end-to-end: precondition check, process spawn (or
/// allowlist-gated shell wrap), evidence capture, normalisation, status
/// classification, and a best-effort version probe.
pub async fn run_one(
    kind: ScannerKind,
    repo_path: &Path,
    evidence_dir: &Path,
    timeout: Duration,
) -> CnResult<ScannerRunResult> {
    let allowlist_line = command_line_for_allowlist(kind);
    assert_allowed(&allowlist_line)?;

    if kind == ScannerKind::NpmAudit && !npm_precondition_met(repo_path) {
        return Ok(ScannerRunResult {
            scanner: kind,
            status: ScannerStatus::Skipped,
            findings: Vec::new(),
            transcript: None,
            message: Some("no package.json in repository root".to_string()),
            version: None,
        });
    }

    let spec = spec_for(kind);
    let (program, needs_shell) = program_name(kind);

    let report_path: Option<PathBuf> = match spec.output {
        OutputLocation::ReportFile(name) => Some(evidence_dir.join(name)),
        OutputLocation::Stdout => None,
    };
    let args = build_args(kind, repo_path, report_path.as_deref());

    let outcome = run_process(program, &args, needs_shell, repo_path, timeout).await;

    let stdout_path = evidence_dir.join(format!("{}.json", kind.as_str().replace('_', "-")));
    let stderr_path = evidence_dir.join(format!("{}-stderr.txt", kind.as_str().replace('_', "-")));

    let outcome = match outcome {
        Ok(o) => o,
        Err(e) => {
            let reason = e.to_string();
            let stderr_text = reason.clone();
            write_evidence(&stderr_path, stderr_text.as_bytes()).await?;
            let missing = looks_missing(None, &stderr_text) || e.kind() == std::io::ErrorKind::NotFound;
            return Ok(ScannerRunResult {
                scanner: kind,
                status: if missing {
                    ScannerStatus::Missing
                } else {
                    ScannerStatus::Error
                },
                findings: if missing {
                    vec![missing_meta_finding(kind, &reason)]
                } else {
                    Vec::new()
                },
                transcript: None,
                message: Some(reason),
                version: None,
            });
        }
    };

    let native_bytes: Vec<u8> = match &report_path {
        Some(path) => tokio::fs::read(path).await.unwrap_or_else(|_| outcome.stdout.clone()),
        None => outcome.stdout.clone(),
    };

    write_evidence(&stdout_path, &native_bytes).await?;
    write_evidence(&stderr_path, &outcome.stderr).await?;

    let transcript = ScannerRun {
        scanner: kind,
        command: outcome.command_line.clone(),
        cwd: repo_path.display().to_string(),
        started_at: outcome.started_at,
        finished_at: outcome.finished_at,
        exit_code: outcome.exit_code,
        duration_ms: (outcome.finished_at - outcome.started_at)
            .num_milliseconds()
            .max(0) as u64,
        stdout_path: stdout_path.display().to_string(),
        stderr_path: stderr_path.display().to_string(),
    };

    let stderr_text = String::from_utf8_lossy(&outcome.stderr).to_string();

    let result = if outcome.timed_out {
        ScannerRunResult {
            scanner: kind,
            status: ScannerStatus::Error,
            findings: Vec::new(),
            transcript: Some(transcript),
            message: Some(format!(
                "{} exceeded its {}s time budget and was killed",
                kind,
                timeout.as_secs()
            )),
            version: None,
        }
    } else if looks_missing(outcome.exit_code, &stderr_text) {
        ScannerRunResult {
            scanner: kind,
            status: ScannerStatus::Missing,
            findings: vec![missing_meta_finding(kind, &stderr_text)],
            transcript: Some(transcript),
            message: Some(stderr_text),
            version: None,
        }
    } else if serde_json::from_slice::<serde_json::Value>(&native_bytes).is_err() {
        // The wire-level parse failed outright; the normaliser's own
        // structural-mismatch fallback (empty Finding[]) only covers valid
        // JSON shaped differently than expected.
        ScannerRunResult {
            scanner: kind,
            status: ScannerStatus::Error,
            findings: Vec::new(),
            transcript: Some(transcript),
            message: Some(format!(
                "native output was not valid JSON; raw bytes recorded at {}",
                stdout_path.display()
            )),
            version: None,
        }
    } else {
        ScannerRunResult {
            scanner: kind,
            status: ScannerStatus::Ok,
            findings: crate::normalisers::normalise(kind, &native_bytes),
            transcript: Some(transcript),
            message: None,
            version: None,
        }
    };

    let version = probe_version(kind, repo_path).await;
    Ok(ScannerRunResult { version, ..result })
}

async fn probe_version(kind: ScannerKind, cwd: &Path) -> Option<String> {
    let allowlist_line = version_probe_command_line(kind);
    if assert_allowed(&allowlist_line).is_err() {
        return None;
    }
    let (program, needs_shell) = program_name(kind);
    let args = version_probe_args(kind);
    let outcome = run_process(
        program,
        &args,
        needs_shell,
        cwd,
        Duration::from_secs(VERSION_PROBE_TIMEOUT_SECS),
    )
    .await
    .ok()?;
    let combined = if !outcome.stdout.is_empty() {
        outcome.stdout
    } else {
        outcome.stderr
    };
    String::from_utf8_lossy(&combined)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

/// Runs all three scanners concurrently; one scanner's failure never
/// prevents the others from completing.
pub async fn run_all(
    repo_path: &Path,
    evidence_dir: &Path,
    timeout: Duration,
) -> Vec<CnResult<ScannerRunResult>> {
    let futures: Vec<_> = ScannerKind::ALL
        .iter()
        .map(|kind| run_one(*kind, repo_path, evidence_dir, timeout))
        .collect();
    futures::future::join_all(futures).await
}
