use crate::context::HandlerContext;
use cn_core::{CnError, CnResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDashboardRequest {
    #[serde(default)]
    pub run_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDashboardResponse {
    pub run_id: String,
    pub index_path: String,
    pub note: String,
}

/// Resolves the path to a run's packet index. Rendering it is the
/// caller's job — this handler never opens a browser or produces HTML.
pub fn open_dashboard(ctx: &HandlerContext, request: OpenDashboardRequest) -> CnResult<OpenDashboardResponse> {
    let request_json = serde_json::json!({"runId": request.run_id.clone()});
    ctx.with_audit_bracket("open_dashboard", request_json, || run(ctx, request))
}

fn run(ctx: &HandlerContext, request: OpenDashboardRequest) -> CnResult<OpenDashboardResponse> {
    let run_id = match request.run_id {
        Some(id) => {
            crate::validate::validate_run_id(&id)?;
            id
        }
        None => ctx.latest_run_id()?.ok_or_else(|| CnError::NotFound {
            kind: "run".to_string(),
            id: "latest".to_string(),
        })?,
    };

    let index_path = cn_packet::packet_dir(ctx.compliance_root(), &run_id).join("index.md");
    if !index_path.exists() {
        return Err(CnError::NotFound {
            kind: "audit_packet".to_string(),
            id: run_id,
        });
    }

    Ok(OpenDashboardResponse {
        run_id,
        index_path: index_path.display().to_string(),
        note: "rendering is the caller's responsibility; this path points at a markdown file, not a server"
            .to_string(),
    })
}
