use cn_core::ScannerKind;
use std::path::Path;

/// One scanner's invocation recipe: program, args, where the output lives,
/// and any pre-condition that causes a `skipped` status instead of a run.
pub struct ScannerSpec {
    pub kind: ScannerKind,
    pub output: OutputLocation,
}

pub enum OutputLocation {
    Stdout,
    ReportFile(&'static str),
}

pub fn spec_for(kind: ScannerKind) -> ScannerSpec {
    match kind {
        ScannerKind::Gitleaks => ScannerSpec {
            kind,
            output: OutputLocation::ReportFile("gitleaks.json"),
        },
        ScannerKind::NpmAudit => ScannerSpec {
            kind,
            output: OutputLocation::Stdout,
        },
        ScannerKind::Checkov => ScannerSpec {
            kind,
            output: OutputLocation::Stdout,
        },
    }
}

/// Program name for the current platform. Gitleaks and checkov ship a
/// direct executable on every platform; npm on Windows is a batch wrapper
/// unless a bare `npm.exe` (e.g. from a standalone Node.js MSI) is present.
#[cfg(not(windows))]
pub fn program_name(kind: ScannerKind) -> (&'static str, bool) {
    match kind {
        ScannerKind::Gitleaks => ("gitleaks", false),
        ScannerKind::NpmAudit => ("npm", false),
        ScannerKind::Checkov => ("checkov", false),
    }
}

#[cfg(windows)]
pub fn program_name(kind: ScannerKind) -> (&'static str, bool) {
    match kind {
        ScannerKind::Gitleaks => ("gitleaks.exe", false),
        ScannerKind::NpmAudit => {
            if which_direct("npm.exe") {
                ("npm.exe", false)
            } else {
                ("npm.cmd", true)
            }
        }
        ScannerKind::Checkov => ("checkov.exe", false),
    }
}

#[cfg(windows)]
fn which_direct(exe: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| {
            std::env::split_paths(&paths).any(|dir| dir.join(exe).is_file())
        })
        .unwrap_or(false)
}

pub fn npm_precondition_met(repo_path: &Path) -> bool {
    repo_path.join("package.json").is_file()
}

pub fn gitleaks_config_path(repo_path: &Path) -> Option<std::path::PathBuf> {
    let candidate = repo_path.join(".gitleaks.toml");
    candidate.is_file().then_some(candidate)
}

/// Builds the argv (not including the program name) for one scanner
/// invocation, given resolved paths.
pub fn build_args(
    kind: ScannerKind,
    repo_path: &Path,
    report_path: Option<&Path>,
) -> Vec<String> {
    match kind {
        ScannerKind::Gitleaks => {
            let mut args = vec![
                "detect".to_string(),
                "--source".to_string(),
                repo_path.display().to_string(),
                "--report-format".to_string(),
                "json".to_string(),
                "--no-banner".to_string(),
                "--exit-code".to_string(),
                "0".to_string(),
            ];
            if let Some(report) = report_path {
                args.push("--report-path".to_string());
                args.push(report.display().to_string());
            }
            if let Some(config) = gitleaks_config_path(repo_path) {
                args.push("--config".to_string());
                args.push(config.display().to_string());
            }
            args
        }
        ScannerKind::NpmAudit => vec!["audit".to_string(), "--json".to_string()],
        ScannerKind::Checkov => vec![
            "-d".to_string(),
            repo_path.display().to_string(),
            "-o".to_string(),
            "json".to_string(),
            "--compact".to_string(),
        ],
    }
}

/// The command-line string checked against the allowlist, matching the
/// shape of the regex patterns in `cn_core::command_policy`.
pub fn command_line_for_allowlist(kind: ScannerKind) -> String {
    match kind {
        ScannerKind::Gitleaks => "gitleaks detect --source <repo>".to_string(),
        ScannerKind::NpmAudit => "npm audit --json".to_string(),
        ScannerKind::Checkov => "checkov -d <repo>".to_string(),
    }
}

pub fn version_probe_args(kind: ScannerKind) -> Vec<String> {
    match kind {
        ScannerKind::Gitleaks | ScannerKind::NpmAudit | ScannerKind::Checkov => {
            vec!["--version".to_string()]
        }
    }
}

pub fn version_probe_command_line(kind: ScannerKind) -> String {
    format!("{} --version", program_name(kind).0.trim_end_matches(".exe").trim_end_matches(".cmd"))
}
