use crate::context::HandlerContext;
use crate::validate::validate_run_id;
use cn_core::{path_policy, sha256_hex, CnError, CnResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::ZipWriter;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportAuditPacketRequest {
    #[serde(default)]
    pub run_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportAuditPacketResponse {
    pub run_id: String,
    pub zip_path: String,
    pub sha256: String,
}

/// Packages an already-written audit packet into a single deterministic
/// ZIP: file order and timestamps are pinned so two exports of the same
/// packet are byte-identical, and symlinks inside the packet (there
/// should never be any) are never followed.
pub fn export_audit_packet(
    ctx: &HandlerContext,
    request: ExportAuditPacketRequest,
) -> CnResult<ExportAuditPacketResponse> {
    let request_json = serde_json::json!({"runId": request.run_id.clone()});
    ctx.with_audit_bracket("export_audit_packet", request_json, || run(ctx, request))
}

fn run(ctx: &HandlerContext, request: ExportAuditPacketRequest) -> CnResult<ExportAuditPacketResponse> {
    let run_id = match request.run_id {
        Some(id) => {
            validate_run_id(&id)?;
            id
        }
        None => ctx.latest_run_id()?.ok_or_else(|| CnError::NotFound {
            kind: "run".to_string(),
            id: "latest".to_string(),
        })?,
    };

    let packet_dir = cn_packet::packet_dir(ctx.compliance_root(), &run_id);
    if !packet_dir.exists() {
        return Err(CnError::NotFound {
            kind: "audit_packet".to_string(),
            id: run_id,
        });
    }

    let zip_path = ctx.run_dir(&run_id).join("audit_packet.zip");
    path_policy::assert_under(ctx.compliance_root(), &zip_path)?;

    let mut entries = collect_files(&packet_dir)?;
    entries.sort();

    let file = std::fs::File::create(&zip_path)?;
    let mut writer = ZipWriter::new(file);
    let pinned_time = zip::DateTime::from_date_and_time(1980, 1, 1, 0, 0, 0)
        .expect("fixed epoch is always a valid zip timestamp");
    let options = FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(pinned_time)
        .unix_permissions(0o644);

    for rel_path in &entries {
        let bytes = std::fs::read(packet_dir.join(rel_path))?;
        writer
            .start_file(rel_path.to_string_lossy().replace('\\', "/"), options)
            .map_err(|e| CnError::Io {
                operation: "zip_start_file".to_string(),
                reason: e.to_string(),
            })?;
        use std::io::Write;
        writer.write_all(&bytes)?;
    }
    writer.finish().map_err(|e| CnError::Io {
        operation: "zip_finish".to_string(),
        reason: e.to_string(),
    })?;

    let sha256 = sha256_hex(&std::fs::read(&zip_path)?);

    Ok(ExportAuditPacketResponse {
        run_id,
        zip_path: zip_path.display().to_string(),
        sha256,
    })
}

/// Walks `root` for plain files only, never following symlinks, returning
/// paths relative to `root`.
fn collect_files(root: &Path) -> CnResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    walk(root, root, &mut out)?;
    Ok(out)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> CnResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            continue;
        }
        let path = entry.path();
        if file_type.is_dir() {
            walk(root, &path, out)?;
        } else if file_type.is_file() {
            if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_path_buf());
            }
        }
    }
    Ok(())
}
