use cn_core::{path_policy, CnResult, Finding, Framework, Severity};
use serde::Serialize;
use std::path::Path;

pub const DEFAULT_MAX_ITEMS: usize = 20;

fn estimated_minutes(severity: Severity) -> u64 {
    match severity {
        Severity::Critical => 120,
        Severity::High => 60,
        Severity::Medium => 30,
        Severity::Low => 15,
        Severity::Info => 5,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationItem {
    pub id: String,
    pub finding_id: String,
    /// 1-based rank after the severity sort; the order an approver should
    /// work through the plan in, independent of `id`'s stable numbering.
    pub priority: usize,
    pub severity: Severity,
    pub title: String,
    /// `remediation ?? description ?? title` — always populated, never
    /// silently dropped when a finding has no dedicated remediation text.
    pub description: String,
    pub files: Vec<String>,
    pub controls: Vec<String>,
    pub estimated_minutes: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationPlan {
    pub items: Vec<RemediationItem>,
    pub total_estimated_minutes: u64,
    pub omitted_count: usize,
}

/// Builds a severity-sorted remediation plan capped at `max_items`
/// (`scanner-missing` markers are never actionable so they are excluded
/// before the cap is applied). Ties within a severity keep finding order.
/// `framework` selects which of a finding's per-framework control
/// annotations (if any) populate `controls`.
pub fn build_plan(findings: &[Finding], framework: Framework, max_items: Option<usize>) -> RemediationPlan {
    let max_items = max_items.unwrap_or(DEFAULT_MAX_ITEMS);

    let mut actionable: Vec<&Finding> = findings.iter().filter(|f| !f.is_meta()).collect();
    actionable.sort_by_key(|f| f.severity);

    let omitted_count = actionable.len().saturating_sub(max_items);

    let items = actionable
        .into_iter()
        .take(max_items)
        .enumerate()
        .map(|(i, finding)| {
            let description = finding
                .remediation
                .clone()
                .or_else(|| finding.description.clone())
                .unwrap_or_else(|| finding.title.clone());
            let controls = finding
                .controls
                .get(framework.as_str())
                .map(|fc| fc.ids.clone())
                .unwrap_or_default();
            RemediationItem {
                id: format!("REM-{}", i + 1),
                finding_id: finding.id.clone(),
                priority: i + 1,
                severity: finding.severity,
                title: finding.title.clone(),
                description,
                files: finding.file.clone().into_iter().collect(),
                controls,
                estimated_minutes: estimated_minutes(finding.severity),
            }
        })
        .collect::<Vec<_>>();

    let total_estimated_minutes = items.iter().map(|i| i.estimated_minutes).sum();

    RemediationPlan {
        items,
        total_estimated_minutes,
        omitted_count,
    }
}

fn render_markdown(plan: &RemediationPlan) -> String {
    let rows = plan
        .items
        .iter()
        .map(|item| {
            format!(
                "| {} | {} | {} | {} | {} min | {} |",
                item.priority,
                item.id,
                item.severity,
                item.title,
                item.estimated_minutes,
                item.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut out = format!(
        "# Remediation Plan\n\n\
         Total estimated effort: {} minutes across {} item(s).\n\n\
         | Priority | ID | Severity | Finding | Estimate | Remediation |\n\
         |---|---|---|---|---|---|\n\
         {}\n",
        plan.total_estimated_minutes,
        plan.items.len(),
        rows
    );

    if plan.omitted_count > 0 {
        out.push_str(&format!(
            "\n{} additional lower-priority finding(s) were omitted by the plan size cap.\n",
            plan.omitted_count
        ));
    }

    out
}

/// Writes `remediation_plan.json` and `remediation_plan.md` under
/// `compliance_root/runs/<runId>/` and returns the JSON path.
pub fn write_plan(
    compliance_root: &Path,
    run_id: &str,
    plan: &RemediationPlan,
) -> CnResult<std::path::PathBuf> {
    let dir = compliance_root.join("runs").join(run_id);
    path_policy::assert_under(compliance_root, &dir)?;
    std::fs::create_dir_all(&dir)?;

    let json_path = dir.join("remediation_plan.json");
    path_policy::assert_under(compliance_root, &json_path)?;
    std::fs::write(&json_path, serde_json::to_vec_pretty(plan)?)?;

    let md_path = dir.join("remediation_plan.md");
    path_policy::assert_under(compliance_root, &md_path)?;
    std::fs::write(&md_path, render_markdown(plan))?;

    Ok(json_path)
}
