use thiserror::Error;

/// The unified error taxonomy returned by every component in this crate.
///
/// Request handlers are the only layer that turns one of these into a
/// transport-facing error record; every other component propagates it with
/// `?`.
#[derive(Error, Debug)]
pub enum CnError {
    #[error("invalid argument: {field}: {message}")]
    InvalidArgument { field: String, message: String },

    #[error("path escape rejected: {target} does not resolve under {root}")]
    PathEscape { root: String, target: String },

    #[error("command rejected by allowlist: {command}")]
    DisallowedCommand { command: String },

    #[error("scanner unavailable: {scanner}: {reason}")]
    ScannerMissing { scanner: String, reason: String },

    #[error("scanner error: {scanner}: {reason}")]
    ScannerError { scanner: String, reason: String },

    #[error("not found: {kind}: {id}")]
    NotFound { kind: String, id: String },

    #[error("approval missing for plan {plan_id}")]
    ApprovalMissing { plan_id: String },

    #[error("plan hash mismatch for plan {plan_id}: approval bound to {approved}, pending is now {current}")]
    PlanHashMismatch {
        plan_id: String,
        approved: String,
        current: String,
    },

    #[error("target mismatch for plan {plan_id}: approval repo {approved_repo} != pending repo {pending_repo}")]
    TargetMismatch {
        plan_id: String,
        approved_repo: String,
        pending_repo: String,
    },

    #[error("rate limited by {target}, retry exhausted")]
    RateLimited { target: String },

    #[error("audit chain integrity broken at line {line}: {reason}")]
    IntegrityBroken { line: usize, reason: String },

    #[error("io error: {operation}: {reason}")]
    Io { operation: String, reason: String },

    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

pub type CnResult<T> = Result<T, CnError>;

impl From<serde_json::Error> for CnError {
    fn from(err: serde_json::Error) -> Self {
        CnError::Serialization {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CnError {
    fn from(err: std::io::Error) -> Self {
        CnError::Io {
            operation: "filesystem".to_string(),
            reason: err.to_string(),
        }
    }
}
