use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The closed set of scanners the pipeline knows how to invoke and normalise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScannerKind {
    Gitleaks,
    NpmAudit,
    Checkov,
}

impl ScannerKind {
    pub const ALL: [ScannerKind; 3] = [
        ScannerKind::Gitleaks,
        ScannerKind::NpmAudit,
        ScannerKind::Checkov,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScannerKind::Gitleaks => "gitleaks",
            ScannerKind::NpmAudit => "npm_audit",
            ScannerKind::Checkov => "checkov",
        }
    }
}

impl std::fmt::Display for ScannerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered severity; the ordering itself is load-bearing (remediation sort,
/// `coveragePct` bucketing, the five-value table in `estimatedMinutes`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub const ORDERED: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    CommandOutput,
    FileSnippet,
    ScannerNative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub kind: EvidenceKind,
    /// Points to a file inside the run's `evidence/` subdirectory.
    #[serde(rename = "ref")]
    pub reference: String,
}

/// Per-framework control annotations attached to a finding after mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingControls {
    pub ids: Vec<String>,
    pub rationale: String,
    pub confidence: f64,
}

/// The unified result shape every normaliser produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub scanner: ScannerKind,
    pub severity: Severity,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    pub evidence: Evidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub controls: HashMap<String, FindingControls>,
}

pub const META_FINDING_TAG: &str = "scanner-missing";

impl Finding {
    pub fn is_meta(&self) -> bool {
        self.tags.iter().any(|t| t == META_FINDING_TAG)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScannerStatus {
    Ok,
    Missing,
    Skipped,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerRun {
    pub scanner: ScannerKind,
    pub command: String,
    pub cwd: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub stdout_path: String,
    pub stderr_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerStatusRecord {
    pub scanner: ScannerKind,
    pub status: ScannerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// `{id, name, status, findingCount}` for one control in a coverage report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStatus {
    Covered,
    Gap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlDetail {
    pub id: String,
    pub name: String,
    pub status: ControlStatus,
    pub finding_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageResult {
    pub coverage_pct: f64,
    pub covered_control_ids: Vec<String>,
    pub coverage_pct_potential: f64,
    pub potential_control_ids: Vec<String>,
    pub coverage_pct_full: f64,
    pub full_control_ids: Vec<String>,
    pub control_details: Vec<ControlDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiBreakdownEntry {
    pub scanner: ScannerKind,
    pub finding_count: usize,
    pub minutes_per_finding: u64,
    pub minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiEstimate {
    pub hours_saved: f64,
    pub hours_saved_conservative: f64,
    pub hours_saved_likely: f64,
    pub basis: String,
    pub breakdown: Vec<RoiBreakdownEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyManifest {
    pub command_allowlist_descriptions: Vec<String>,
    pub execution_model: String,
    pub path_policy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub run_id: String,
    pub repo_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_commit_hash: Option<String>,
    pub os: String,
    pub scanner_versions: HashMap<String, Option<String>>,
    pub framework: String,
    pub version: String,
    pub policy: PolicyManifest,
    pub excluded_paths: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    Soc2,
    Hipaa,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Soc2 => "soc2",
            Framework::Hipaa => "hipaa",
        }
    }

    pub fn parse(s: &str) -> Option<Framework> {
        match s {
            "soc2" => Some(Framework::Soc2),
            "hipaa" => Some(Framework::Hipaa),
            _ => None,
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The immutable record persisted as `runs/<runId>/scan_result.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub run_id: String,
    pub framework: Framework,
    pub repo_path: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub findings: Vec<Finding>,
    pub counts_by_severity: HashMap<Severity, usize>,
    pub counts_by_severity_all: HashMap<Severity, usize>,
    pub counts_by_scanner: HashMap<ScannerKind, usize>,
    pub control_coverage: CoverageResult,
    pub roi_estimate: RoiEstimate,
    pub scanner_statuses: Vec<ScannerStatusRecord>,
    pub manifest: Manifest,
    pub transcripts: Vec<ScannerRun>,
    pub evidence_dir: String,
}

impl CoverageResult {
    pub fn is_ordered(&self) -> bool {
        self.coverage_pct <= self.coverage_pct_potential
            && self.coverage_pct_potential <= self.coverage_pct_full
    }
}

/// `approvals/pending/<planId>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPlan {
    pub plan_id: String,
    pub created_at: DateTime<Utc>,
    pub target: String,
    pub repo: String,
    pub repo_full_name: String,
    pub run_id: String,
    pub plan_hash: String,
    pub items: Vec<PlanItem>,
}

/// `approvals/approved/<planId>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub plan_id: String,
    pub approved_at: DateTime<Utc>,
    pub approved_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub plan_hash: String,
    pub repo_full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItem {
    pub finding_id: String,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub dedupe_query: String,
}

/// One append-only JSONL line in the audit chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub ts: DateTime<Utc>,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    pub data: serde_json::Value,
    pub prev_hash: String,
    pub hash: String,
}

pub const GENESIS_HASH: &str = "GENESIS";
