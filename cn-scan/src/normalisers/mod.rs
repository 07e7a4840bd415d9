pub mod checkov;
pub mod gitleaks;
pub mod npm_audit;

use cn_core::{Finding, ScannerKind};

/// Dispatches to the per-scanner pure normaliser. Each normaliser returns an
/// empty list on structural mismatch (valid JSON, unexpected shape); the
/// caller is responsible for distinguishing a wire-level parse failure
/// (handled before this is ever invoked).
pub fn normalise(kind: ScannerKind, native_bytes: &[u8]) -> Vec<Finding> {
    match kind {
        ScannerKind::Gitleaks => gitleaks::normalise(native_bytes),
        ScannerKind::NpmAudit => npm_audit::normalise(native_bytes),
        ScannerKind::Checkov => checkov::normalise(native_bytes),
    }
}

/// The shared five-bucket severity mapping used when a native severity
/// string must be folded into `Severity`.
pub fn map_native_severity(native: &str) -> cn_core::Severity {
    match native.to_lowercase().as_str() {
        "critical" => cn_core::Severity::Critical,
        "high" => cn_core::Severity::High,
        "moderate" | "medium" => cn_core::Severity::Medium,
        "low" => cn_core::Severity::Low,
        "info" | "informational" | "unknown" => cn_core::Severity::Info,
        _ => cn_core::Severity::Info,
    }
}
