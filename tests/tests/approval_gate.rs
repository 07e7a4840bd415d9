//! S4 (dry-run required, execute refuses without an approved plan) and S5
//! (the hash a plan was approved under is re-checked at execute time, so
//! editing the pending plan or retargeting after approval is caught
//! before any ticket is filed). Neither scenario reaches a tracker
//! adapter — the gate fails closed before `create_tickets` would ever
//! construct one.

use cn_core::CnError;
use cn_handlers::{CreateTicketsRequest, CreateTicketsResponse, HandlerContext};

fn ctx_with_run(dir: &std::path::Path, run_id: &str) -> HandlerContext {
    let repo_path = cn_integration_tests::demo_repo(dir);
    let ctx = HandlerContext::new(&repo_path.display().to_string()).unwrap();
    cn_integration_tests::write_fixture_scan_result(&ctx, run_id, cn_core::Framework::Soc2, cn_integration_tests::sample_findings());
    ctx
}

fn dry_run_request(run_id: &str) -> CreateTicketsRequest {
    CreateTicketsRequest {
        run_id: Some(run_id.to_string()),
        tracker: "github".to_string(),
        target_repo: Some("acme/widgets".to_string()),
        project_key: None,
        label_policy: None,
        dry_run: true,
        approved_plan_id: None,
        reopen_closed: true,
    }
}

#[tokio::test]
async fn execute_without_an_approved_plan_id_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let run_id = "20260101T000000000-eeeeeeee";
    let ctx = ctx_with_run(dir.path(), run_id);

    let mut request = dry_run_request(run_id);
    request.dry_run = false;
    let result = cn_handlers::create_tickets(&ctx, request).await;
    assert!(matches!(result, Err(CnError::ApprovalMissing { .. })));
}

#[tokio::test]
async fn approving_a_different_plan_id_is_a_target_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let run_id = "20260101T000000000-ffffffff";
    let ctx = ctx_with_run(dir.path(), run_id);

    let mut request = dry_run_request(run_id);
    request.dry_run = false;
    request.approved_plan_id = Some("some-other-plan-id".to_string());
    let result = cn_handlers::create_tickets(&ctx, request).await;
    assert!(matches!(result, Err(CnError::TargetMismatch { .. })));
}

#[tokio::test]
async fn tampering_with_the_pending_plan_after_approval_is_detected_before_filing() {
    let dir = tempfile::tempdir().unwrap();
    let run_id = "20260101T000000000-11111111";
    let ctx = ctx_with_run(dir.path(), run_id);

    let dry_run = cn_handlers::create_tickets(&ctx, dry_run_request(run_id)).await.unwrap();
    let plan_id = match dry_run {
        CreateTicketsResponse::DryRun { plan_id, item_count, .. } => {
            assert_eq!(item_count, 4);
            plan_id
        }
        CreateTicketsResponse::Executed { .. } => panic!("dry_run=true must not execute"),
    };

    cn_handlers::approve_ticket_plan(
        &ctx,
        cn_handlers::ApproveTicketPlanRequest {
            plan_id: plan_id.clone(),
            approved_by: "alice".to_string(),
            reason: None,
        },
    )
    .unwrap();

    // Tamper the pending plan on disk after approval.
    let pending_path = ctx
        .compliance_root()
        .join("approvals")
        .join("pending")
        .join(format!("{plan_id}.json"));
    let mut pending: serde_json::Value = serde_json::from_slice(&std::fs::read(&pending_path).unwrap()).unwrap();
    pending["items"].as_array_mut().unwrap().push(serde_json::json!({
        "findingId": "injected",
        "title": "injected",
        "body": "injected",
        "labels": [],
        "dedupeQuery": "CN-FINDING-ID: injected",
    }));
    std::fs::write(&pending_path, serde_json::to_vec_pretty(&pending).unwrap()).unwrap();

    let mut execute_request = dry_run_request(run_id);
    execute_request.dry_run = false;
    execute_request.approved_plan_id = Some(plan_id);
    let result = cn_handlers::create_tickets(&ctx, execute_request).await;
    assert!(matches!(result, Err(CnError::PlanHashMismatch { .. })));
}

#[tokio::test]
async fn retargeting_after_approval_is_detected_before_filing() {
    let dir = tempfile::tempdir().unwrap();
    let run_id = "20260101T000000000-22222222";
    let ctx = ctx_with_run(dir.path(), run_id);

    let dry_run = cn_handlers::create_tickets(&ctx, dry_run_request(run_id)).await.unwrap();
    let plan_id = match dry_run {
        CreateTicketsResponse::DryRun { plan_id, .. } => plan_id,
        CreateTicketsResponse::Executed { .. } => panic!("dry_run=true must not execute"),
    };

    cn_handlers::approve_ticket_plan(
        &ctx,
        cn_handlers::ApproveTicketPlanRequest { plan_id: plan_id.clone(), approved_by: "alice".to_string(), reason: None },
    )
    .unwrap();

    let mut execute_request = dry_run_request(run_id);
    execute_request.dry_run = false;
    execute_request.target_repo = Some("acme/gadgets".to_string());
    execute_request.approved_plan_id = Some(plan_id);
    let result = cn_handlers::create_tickets(&ctx, execute_request).await;
    assert!(matches!(result, Err(CnError::TargetMismatch { .. })));
}
