use cn_audit::AuditChain;
use cn_core::{path_policy, preflight_repo_path, CnResult};
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Owns the one resource every handler shares: the audit chain for the
/// repository under review. Constructed once per `repoPath` and reused
/// across tool calls against that repository.
pub struct HandlerContext {
    repo_path: PathBuf,
    compliance_root: PathBuf,
    chain: AuditChain,
}

impl HandlerContext {
    pub fn new(repo_path: &str) -> CnResult<Self> {
        preflight_repo_path(repo_path)?;
        let repo_path = PathBuf::from(repo_path);
        let compliance_root = path_policy::compliance_dir(&repo_path);
        let chain = AuditChain::new(compliance_root.join("audit.jsonl"));
        Ok(Self {
            repo_path,
            compliance_root,
            chain,
        })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn compliance_root(&self) -> &Path {
        &self.compliance_root
    }

    pub fn chain(&self) -> &AuditChain {
        &self.chain
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.compliance_root.join("runs")
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.runs_dir().join(run_id)
    }

    /// Resolves "the latest run" by lexicographically-greatest `runs/`
    /// subdirectory name; run IDs are constructed to sort chronologically.
    pub fn latest_run_id(&self) -> CnResult<Option<String>> {
        let runs_dir = self.runs_dir();
        if !runs_dir.exists() {
            return Ok(None);
        }
        let mut ids: Vec<String> = std::fs::read_dir(&runs_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        ids.sort();
        Ok(ids.pop())
    }

    /// Brackets `body` with `tool_start`/`tool_end` audit-chain entries.
    /// `tool_end`'s `data` always records whether `body` succeeded, so the
    /// chain itself is a complete record of every tool invocation and its
    /// outcome, even on failure.
    pub fn with_audit_bracket<T, F>(&self, tool: &str, request: Value, body: F) -> CnResult<T>
    where
        F: FnOnce() -> CnResult<T>,
    {
        self.chain.append("tool_start", Some(tool), request)?;
        let result = body();
        let outcome = match &result {
            Ok(_) => serde_json::json!({"ok": true}),
            Err(e) => serde_json::json!({"ok": false, "error": e.to_string()}),
        };
        self.chain.append("tool_end", Some(tool), outcome)?;
        result
    }

    /// Async counterpart to [`with_audit_bracket`](Self::with_audit_bracket)
    /// for handlers that await scanner or HTTP work between start and end.
    pub async fn with_audit_bracket_async<T, Fut>(&self, tool: &str, request: Value, body: Fut) -> CnResult<T>
    where
        Fut: Future<Output = CnResult<T>>,
    {
        self.chain.append("tool_start", Some(tool), request)?;
        let result = body.await;
        let outcome = match &result {
            Ok(_) => serde_json::json!({"ok": true}),
            Err(e) => serde_json::json!({"ok": false, "error": e.to_string()}),
        };
        self.chain.append("tool_end", Some(tool), outcome)?;
        result
    }
}
