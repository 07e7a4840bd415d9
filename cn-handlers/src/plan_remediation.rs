use crate::context::HandlerContext;
use crate::scan_repo::read_scan_result;
use crate::validate::validate_run_id;
use cn_core::CnResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRemediationRequest {
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub max_items: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRemediationResponse {
    pub run_id: String,
    pub plan_path: String,
    pub item_count: usize,
    pub omitted_count: usize,
}

pub fn plan_remediation(
    ctx: &HandlerContext,
    request: PlanRemediationRequest,
) -> CnResult<PlanRemediationResponse> {
    let request_json = serde_json::json!({"runId": request.run_id.clone(), "maxItems": request.max_items});
    ctx.with_audit_bracket("plan_remediation", request_json, || run(ctx, request))
}

fn run(ctx: &HandlerContext, request: PlanRemediationRequest) -> CnResult<PlanRemediationResponse> {
    let run_id = match request.run_id {
        Some(id) => {
            validate_run_id(&id)?;
            id
        }
        None => ctx.latest_run_id()?.ok_or_else(|| cn_core::CnError::NotFound {
            kind: "run".to_string(),
            id: "latest".to_string(),
        })?,
    };

    let result = read_scan_result(ctx, &run_id)?;
    let plan = cn_packet::build_plan(&result.findings, result.framework, request.max_items);
    let plan_path = cn_packet::write_plan(ctx.compliance_root(), &run_id, &plan)?;

    Ok(PlanRemediationResponse {
        run_id,
        plan_path: plan_path.display().to_string(),
        item_count: plan.items.len(),
        omitted_count: plan.omitted_count,
    })
}
