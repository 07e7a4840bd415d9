use crate::context::HandlerContext;
use cn_audit::VerifyResult;
use cn_core::CnResult;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAuditChainRequest {}

pub fn verify_audit_chain(
    ctx: &HandlerContext,
    _request: VerifyAuditChainRequest,
) -> CnResult<VerifyResult> {
    ctx.with_audit_bracket("verify_audit_chain", serde_json::json!({}), || {
        cn_audit::verify(ctx.chain().path())
    })
}
