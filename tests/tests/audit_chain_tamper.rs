//! S2: a hand-edited line in the audit log must be detected, both as a
//! broken hash-chain link and as a broken genesis link when the very
//! first entry is tampered with.

use cn_handlers::HandlerContext;
use std::io::Write;

#[test]
fn tampering_with_a_later_entry_breaks_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    let repo_path = cn_integration_tests::demo_repo(dir.path());
    let ctx = HandlerContext::new(&repo_path.display().to_string()).unwrap();

    ctx.chain().append("tool_start", Some("scan_repo"), serde_json::json!({"n": 1})).unwrap();
    ctx.chain().append("tool_end", Some("scan_repo"), serde_json::json!({"n": 2})).unwrap();
    ctx.chain().append("tool_start", Some("plan_remediation"), serde_json::json!({"n": 3})).unwrap();

    let clean = cn_audit::verify(ctx.chain().path()).unwrap();
    assert!(clean.valid);
    assert_eq!(clean.total_entries, 3);

    let mut lines: Vec<String> = std::fs::read_to_string(ctx.chain().path())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    let mut middle: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
    middle["data"] = serde_json::json!({"n": 999});
    lines[1] = serde_json::to_string(&middle).unwrap();
    let mut file = std::fs::File::create(ctx.chain().path()).unwrap();
    for line in &lines {
        writeln!(file, "{line}").unwrap();
    }
    drop(file);

    let result = cn_audit::verify(ctx.chain().path()).unwrap();
    assert!(!result.valid);
    assert_eq!(result.broken_at, Some(2));
}

#[test]
fn an_unwritten_chain_verifies_valid_with_zero_entries() {
    let dir = tempfile::tempdir().unwrap();
    let repo_path = cn_integration_tests::demo_repo(dir.path());
    let ctx = HandlerContext::new(&repo_path.display().to_string()).unwrap();

    // Called directly, ahead of any handler invocation, so nothing has
    // appended to the chain file yet (the handler itself would write a
    // tool_start entry before this check ever ran).
    let result = cn_audit::verify(ctx.chain().path()).unwrap();
    assert!(result.valid);
    assert_eq!(result.total_entries, 0);
}

#[test]
fn a_malformed_first_line_is_reported_as_broken_at_line_one() {
    let dir = tempfile::tempdir().unwrap();
    let repo_path = cn_integration_tests::demo_repo(dir.path());
    let ctx = HandlerContext::new(&repo_path.display().to_string()).unwrap();

    if let Some(parent) = ctx.chain().path().parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(ctx.chain().path(), "not json at all\n").unwrap();

    let result = cn_audit::verify(ctx.chain().path()).unwrap();
    assert!(!result.valid);
    assert_eq!(result.broken_at, Some(1));
}

#[test]
fn verify_audit_chain_handler_itself_appends_a_bracket_and_reports_valid() {
    let dir = tempfile::tempdir().unwrap();
    let repo_path = cn_integration_tests::demo_repo(dir.path());
    let ctx = HandlerContext::new(&repo_path.display().to_string()).unwrap();

    // The handler brackets its own call: calling it once appends
    // tool_start, verifies (sees that entry), then appends tool_end.
    let result = cn_handlers::verify_audit_chain(&ctx, cn_handlers::VerifyAuditChainRequest::default()).unwrap();
    assert!(result.valid);
    assert_eq!(result.total_entries, 1);

    let final_check = cn_audit::verify(ctx.chain().path()).unwrap();
    assert!(final_check.valid);
    assert_eq!(final_check.total_entries, 2);
}
