use crate::context::HandlerContext;
use crate::scan_repo::read_scan_result;
use crate::validate::validate_run_id;
use cn_core::CnResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAuditPacketRequest {
    #[serde(default)]
    pub run_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAuditPacketResponse {
    pub run_id: String,
    pub index_path: String,
}

pub fn generate_audit_packet(
    ctx: &HandlerContext,
    request: GenerateAuditPacketRequest,
) -> CnResult<GenerateAuditPacketResponse> {
    let request_json = serde_json::json!({"runId": request.run_id.clone()});
    ctx.with_audit_bracket("generate_audit_packet", request_json, || run(ctx, request))
}

fn run(ctx: &HandlerContext, request: GenerateAuditPacketRequest) -> CnResult<GenerateAuditPacketResponse> {
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
    let dest = cn_packet::write_packet(ctx.compliance_root(), &result)?;

    Ok(GenerateAuditPacketResponse {
        run_id,
        index_path: dest.join("index.md").display().to_string(),
    })
}
