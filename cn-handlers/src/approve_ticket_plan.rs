use crate::context::HandlerContext;
use crate::validate::validate_plan_id;
use cn_core::CnResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveTicketPlanRequest {
    pub plan_id: String,
    pub approved_by: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveTicketPlanResponse {
    pub plan_id: String,
    pub plan_hash: String,
    pub repo_full_name: String,
}

/// Records a human approval of a pending plan. The hash and repo binding
/// are read back from the plan as it exists on disk right now — an
/// approver approves what is currently there, never a value they supply.
pub fn approve_ticket_plan(
    ctx: &HandlerContext,
    request: ApproveTicketPlanRequest,
) -> CnResult<ApproveTicketPlanResponse> {
    let request_json = serde_json::json!({
        "planId": request.plan_id.clone(),
        "approvedBy": request.approved_by.clone(),
    });
    ctx.with_audit_bracket("approve_ticket_plan", request_json, || run(ctx, request))
}

fn run(ctx: &HandlerContext, request: ApproveTicketPlanRequest) -> CnResult<ApproveTicketPlanResponse> {
    validate_plan_id(&request.plan_id)?;

    let approval = cn_tickets::approve(
        ctx.compliance_root(),
        &request.plan_id,
        &request.approved_by,
        request.reason,
    )?;

    Ok(ApproveTicketPlanResponse {
        plan_id: approval.plan_id,
        plan_hash: approval.plan_hash,
        repo_full_name: approval.repo_full_name,
    })
}
