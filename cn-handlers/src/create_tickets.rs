use crate::context::HandlerContext;
use crate::scan_repo::read_scan_result;
use crate::validate::{validate_plan_id, validate_run_id, validate_tracker};
use cn_core::{stable_id, CnError, CnResult};
use cn_tickets::{LabelPolicy, Target, TicketOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketsRequest {
    #[serde(default)]
    pub run_id: Option<String>,
    pub tracker: String,
    #[serde(default)]
    pub target_repo: Option<String>,
    #[serde(default)]
    pub project_key: Option<String>,
    #[serde(default)]
    pub label_policy: Option<String>,
    pub dry_run: bool,
    #[serde(default)]
    pub approved_plan_id: Option<String>,
    /// When a duplicate is found closed: reopen it if true, otherwise leave
    /// it closed and report `skippedAsDuplicate`. Defaults to true — the
    /// common case is that a closed ticket regressed and should be reopened.
    #[serde(default = "default_reopen_closed")]
    pub reopen_closed: bool,
}

fn default_reopen_closed() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CreateTicketsResponse {
    DryRun {
        plan_id: String,
        plan_hash: String,
        item_count: usize,
    },
    Executed {
        plan_id: String,
        created: usize,
        reopened: usize,
        already_open: usize,
        skipped_as_duplicate: usize,
        failed: usize,
    },
}

fn resolve_target(request: &CreateTicketsRequest, repo_path: &std::path::Path) -> CnResult<Target> {
    match validate_tracker(&request.tracker)? {
        "github" => cn_tickets::resolve_github_target(request.target_repo.as_deref(), repo_path),
        "jira" => {
            let key = request.project_key.as_deref().ok_or_else(|| CnError::InvalidArgument {
                field: "projectKey".to_string(),
                message: "jira target requires projectKey".to_string(),
            })?;
            cn_tickets::resolve_jira_target(key)
        }
        _ => unreachable!("validate_tracker only returns known trackers"),
    }
}

fn resolve_label_policy(raw: Option<&str>) -> CnResult<LabelPolicy> {
    match raw.unwrap_or("require-existing") {
        "require-existing" => Ok(LabelPolicy::RequireExisting),
        "create-if-missing" => Ok(LabelPolicy::CreateIfMissing),
        other => Err(CnError::InvalidArgument {
            field: "labelPolicy".to_string(),
            message: format!("'{other}' is not one of: require-existing, create-if-missing"),
        }),
    }
}

/// Dry-run computes and persists a `PendingPlan`, returning its hash for an
/// approver to review out of band. Execute requires `approvedPlanId` and
/// re-verifies the hash and repo binding against what was actually
/// approved before filing a single ticket.
pub async fn create_tickets(
    ctx: &HandlerContext,
    request: CreateTicketsRequest,
) -> CnResult<CreateTicketsResponse> {
    let request_json = serde_json::json!({
        "runId": request.run_id.clone(),
        "tracker": request.tracker.clone(),
        "dryRun": request.dry_run,
    });
    ctx.with_audit_bracket_async("create_tickets", request_json, run_create_tickets(ctx, request))
        .await
}

async fn run_create_tickets(
    ctx: &HandlerContext,
    request: CreateTicketsRequest,
) -> CnResult<CreateTicketsResponse> {
    let run_id = match &request.run_id {
        Some(id) => {
            validate_run_id(id)?;
            id.clone()
        }
        None => ctx.latest_run_id()?.ok_or_else(|| CnError::NotFound {
            kind: "run".to_string(),
            id: "latest".to_string(),
        })?,
    };

    let target = resolve_target(&request, ctx.repo_path())?;
    let repo_full_name = target.repo_full_name();
    let label_policy = resolve_label_policy(request.label_policy.as_deref())?;

    let result = read_scan_result(ctx, &run_id)?;
    let items = cn_tickets::build_plan_items(result.framework, &run_id, &result.findings);
    let plan_id = stable_id(&["plan", &repo_full_name, &run_id]);

    if request.dry_run {
        let plan = cn_tickets::write_pending_plan(ctx.compliance_root(), &plan_id, &run_id, &target, items)?;
        return Ok(CreateTicketsResponse::DryRun {
            plan_id,
            plan_hash: plan.plan_hash,
            item_count: plan.items.len(),
        });
    }

    let approved_plan_id = request.approved_plan_id.ok_or_else(|| CnError::ApprovalMissing {
        plan_id: plan_id.clone(),
    })?;
    validate_plan_id(&approved_plan_id)?;
    if approved_plan_id != plan_id {
        return Err(CnError::TargetMismatch {
            plan_id: approved_plan_id,
            approved_repo: repo_full_name.clone(),
            pending_repo: plan_id,
        });
    }

    let pending = cn_tickets::verify_approved(ctx.compliance_root(), &plan_id, &target)?;

    let adapter: Box<dyn cn_tickets::TrackerAdapter> = match &target {
        Target::GitHub { owner, repo } => Box::new(cn_tickets::GitHubAdapter::from_env(owner, repo, label_policy)?),
        Target::Jira { project_key } => Box::new(cn_tickets::JiraAdapter::from_env(project_key, label_policy)?),
    };

    let results = cn_tickets::file_tickets(adapter.as_ref(), &pending.items, request.reopen_closed).await;

    let mut created = 0;
    let mut reopened = 0;
    let mut already_open = 0;
    let mut skipped_as_duplicate = 0;
    let mut failed = 0;
    for r in &results {
        match &r.outcome {
            Ok(TicketOutcome::Created { .. }) => created += 1,
            Ok(TicketOutcome::ReopenedExisting { .. }) => reopened += 1,
            Ok(TicketOutcome::AlreadyOpen { .. }) => already_open += 1,
            Ok(TicketOutcome::SkippedAsDuplicate { .. }) => skipped_as_duplicate += 1,
            Err(_) => failed += 1,
        }
    }

    Ok(CreateTicketsResponse::Executed {
        plan_id,
        created,
        reopened,
        already_open,
        skipped_as_duplicate,
        failed,
    })
}
