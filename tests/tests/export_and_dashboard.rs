//! Deterministic packaging: two exports of the same unchanged audit packet
//! must be byte-identical (same SHA-256), and `open_dashboard` resolves a
//! run's packet index without ever rendering anything itself.

use cn_handlers::HandlerContext;

fn fixture_ctx(dir: &std::path::Path, run_id: &str) -> HandlerContext {
    let repo_path = cn_integration_tests::demo_repo(dir);
    let ctx = HandlerContext::new(&repo_path.display().to_string()).unwrap();
    cn_integration_tests::write_fixture_scan_result(&ctx, run_id, cn_core::Framework::Soc2, cn_integration_tests::sample_findings());
    cn_handlers::generate_audit_packet(&ctx, cn_handlers::GenerateAuditPacketRequest { run_id: Some(run_id.to_string()) }).unwrap();
    ctx
}

#[test]
fn exporting_the_same_unchanged_packet_twice_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let run_id = "20260101T000000000-33333333";
    let ctx = fixture_ctx(dir.path(), run_id);

    let first = cn_handlers::export_audit_packet(&ctx, cn_handlers::ExportAuditPacketRequest { run_id: Some(run_id.to_string()) }).unwrap();
    let first_bytes = std::fs::read(&first.zip_path).unwrap();

    // Re-export over the same packet contents.
    let second = cn_handlers::export_audit_packet(&ctx, cn_handlers::ExportAuditPacketRequest { run_id: Some(run_id.to_string()) }).unwrap();
    let second_bytes = std::fs::read(&second.zip_path).unwrap();

    assert_eq!(first.sha256, second.sha256);
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn export_with_no_run_id_resolves_the_latest_run() {
    let dir = tempfile::tempdir().unwrap();
    let repo_path = cn_integration_tests::demo_repo(dir.path());
    let ctx = HandlerContext::new(&repo_path.display().to_string()).unwrap();
    cn_integration_tests::write_fixture_scan_result(&ctx, "20260101T000000000-44444440", cn_core::Framework::Soc2, cn_integration_tests::sample_findings());
    cn_integration_tests::write_fixture_scan_result(&ctx, "20260101T000000001-44444441", cn_core::Framework::Soc2, cn_integration_tests::sample_findings());
    cn_handlers::generate_audit_packet(&ctx, cn_handlers::GenerateAuditPacketRequest { run_id: Some("20260101T000000000-44444440".to_string()) }).unwrap();
    cn_handlers::generate_audit_packet(&ctx, cn_handlers::GenerateAuditPacketRequest { run_id: Some("20260101T000000001-44444441".to_string()) }).unwrap();

    let exported = cn_handlers::export_audit_packet(&ctx, cn_handlers::ExportAuditPacketRequest { run_id: None }).unwrap();
    assert_eq!(exported.run_id, "20260101T000000001-44444441");
}

#[test]
fn export_without_a_generated_packet_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let repo_path = cn_integration_tests::demo_repo(dir.path());
    let ctx = HandlerContext::new(&repo_path.display().to_string()).unwrap();
    cn_integration_tests::write_fixture_scan_result(&ctx, "20260101T000000000-55555555", cn_core::Framework::Soc2, cn_integration_tests::sample_findings());

    let result = cn_handlers::export_audit_packet(&ctx, cn_handlers::ExportAuditPacketRequest { run_id: Some("20260101T000000000-55555555".to_string()) });
    assert!(matches!(result, Err(cn_core::CnError::NotFound { .. })));
}

#[test]
fn open_dashboard_resolves_the_packet_index_path() {
    let dir = tempfile::tempdir().unwrap();
    let run_id = "20260101T000000000-66666666";
    let ctx = fixture_ctx(dir.path(), run_id);

    let dashboard = cn_handlers::open_dashboard(&ctx, cn_handlers::OpenDashboardRequest { run_id: Some(run_id.to_string()) }).unwrap();
    assert!(std::path::Path::new(&dashboard.index_path).exists());
    assert_eq!(dashboard.run_id, run_id);
}
