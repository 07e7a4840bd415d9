use crate::errors::{CnError, CnResult};
use regex::Regex;
use std::sync::OnceLock;

/// One allowlisted command shape. `description` (not `pattern`) is the part
/// that gets surfaced in the manifest, so an auditor can read the policy in
/// force without reading this source file.
pub struct AllowlistEntry {
    pub pattern: &'static str,
    pub description: &'static str,
}

fn entries() -> &'static [AllowlistEntry] {
    static ENTRIES: OnceLock<Vec<AllowlistEntry>> = OnceLock::new();
    ENTRIES.get_or_init(|| {
        vec![
            AllowlistEntry {
                pattern: r"^gitleaks detect .*$",
                description: "gitleaks secrets scan over the target repository",
            },
            AllowlistEntry {
                pattern: r"^gitleaks --version$",
                description: "gitleaks version probe",
            },
            AllowlistEntry {
                pattern: r"^npm audit .*$",
                description: "npm dependency vulnerability audit",
            },
            AllowlistEntry {
                pattern: r"^npm --version$",
                description: "npm version probe",
            },
            AllowlistEntry {
                pattern: r"^checkov .*$",
                description: "checkov infrastructure-as-code scan",
            },
            AllowlistEntry {
                pattern: r"^checkov --version$",
                description: "checkov version probe",
            },
        ]
    })
}

/// Descriptions of every allowlisted command shape, in declared order, for
/// embedding in the manifest's `policy.commandAllowlistDescriptions`.
pub fn descriptions() -> Vec<String> {
    entries().iter().map(|e| e.description.to_string()).collect()
}

/// Shell metacharacters rejected before an argument is ever quoted for a
/// shell-mediated invocation (Windows batch wrappers).
const SHELL_METACHARACTERS: &[char] = &['&', '|', '<', '>', '^', '%', '!'];

fn has_control_chars(arg: &str) -> bool {
    arg.chars().any(|c| (c as u32) < 0x20)
}

/// Rejects an argument containing a shell metacharacter or a control
/// character, before it is ever wrapped for a shell-mediated invocation.
pub fn assert_shell_safe_argument(arg: &str) -> CnResult<()> {
    if arg.chars().any(|c| SHELL_METACHARACTERS.contains(&c)) || has_control_chars(arg) {
        return Err(CnError::DisallowedCommand {
            command: arg.to_string(),
        });
    }
    Ok(())
}

/// Double-quotes `arg` for a shell-mediated invocation, doubling any
/// embedded quote characters.
pub fn quote_for_shell(arg: &str) -> String {
    format!("\"{}\"", arg.replace('"', "\"\""))
}

/// Fails unless `command_line` matches one of the allowlist regexes. Returns
/// the matching entry's description on success.
pub fn assert_allowed(command_line: &str) -> CnResult<&'static str> {
    for entry in entries() {
        let re = Regex::new(entry.pattern).expect("allowlist pattern must compile");
        if re.is_match(command_line) {
            return Ok(entry.description);
        }
    }
    Err(CnError::DisallowedCommand {
        command: command_line.to_string(),
    })
}
