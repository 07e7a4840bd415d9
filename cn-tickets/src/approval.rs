use crate::target::Target;
use cn_core::{
    canonical_json::canonical_json_bytes, ids::sha256_hex, path_policy, Approval, CnError,
    CnResult, PendingPlan, PlanItem,
};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PlanHashPayload<'a> {
    repo_full_name: &'a str,
    run_id: &'a str,
    items: &'a [PlanItem],
}

/// `planHash = SHA256(canonical_json({repoFullName, runId, items}))`. Both
/// the dry-run write and the tamper check at execute time call this, never
/// a cached value, so any edit to the items or a target swap is detected.
pub fn compute_plan_hash(repo_full_name: &str, run_id: &str, items: &[PlanItem]) -> CnResult<String> {
    let payload = PlanHashPayload {
        repo_full_name,
        run_id,
        items,
    };
    Ok(sha256_hex(&canonical_json_bytes(&payload)?))
}

fn pending_path(compliance_root: &Path, plan_id: &str) -> std::path::PathBuf {
    compliance_root
        .join("approvals")
        .join("pending")
        .join(format!("{plan_id}.json"))
}

fn approved_path(compliance_root: &Path, plan_id: &str) -> std::path::PathBuf {
    compliance_root
        .join("approvals")
        .join("approved")
        .join(format!("{plan_id}.json"))
}

/// Builds and persists a `PendingPlan` for a dry run. This is the only way
/// a plan hash comes into existence — execution never recomputes items
/// without a corresponding write here first.
pub fn write_pending_plan(
    compliance_root: &Path,
    plan_id: &str,
    run_id: &str,
    target: &Target,
    items: Vec<PlanItem>,
) -> CnResult<PendingPlan> {
    let repo_full_name = target.repo_full_name();
    let plan_hash = compute_plan_hash(&repo_full_name, run_id, &items)?;

    let plan = PendingPlan {
        plan_id: plan_id.to_string(),
        created_at: Utc::now(),
        target: target_kind_label(target).to_string(),
        repo: repo_label(target),
        repo_full_name,
        run_id: run_id.to_string(),
        plan_hash,
        items,
    };

    let path = pending_path(compliance_root, plan_id);
    path_policy::assert_under(compliance_root, &path)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_vec_pretty(&plan)?)?;

    Ok(plan)
}

fn target_kind_label(target: &Target) -> &'static str {
    match target {
        Target::GitHub { .. } => "github",
        Target::Jira { .. } => "jira",
    }
}

fn repo_label(target: &Target) -> String {
    match target {
        Target::GitHub { owner, repo } => format!("{owner}/{repo}"),
        Target::Jira { project_key } => project_key.clone(),
    }
}

pub fn read_pending_plan(compliance_root: &Path, plan_id: &str) -> CnResult<PendingPlan> {
    let path = pending_path(compliance_root, plan_id);
    let bytes = std::fs::read(&path).map_err(|_| CnError::NotFound {
        kind: "pending_plan".to_string(),
        id: plan_id.to_string(),
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Records approval of a pending plan. `planHash` and `repoFullName` are
/// copied verbatim from the pending plan on disk right now, never
/// recomputed from caller-supplied values — an approver can only approve
/// what currently exists.
pub fn approve(
    compliance_root: &Path,
    plan_id: &str,
    approved_by: &str,
    reason: Option<String>,
) -> CnResult<Approval> {
    let pending = read_pending_plan(compliance_root, plan_id)?;

    let approval = Approval {
        plan_id: plan_id.to_string(),
        approved_at: Utc::now(),
        approved_by: approved_by.to_string(),
        reason,
        plan_hash: pending.plan_hash,
        repo_full_name: pending.repo_full_name,
    };

    let path = approved_path(compliance_root, plan_id);
    path_policy::assert_under(compliance_root, &path)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_vec_pretty(&approval)?)?;

    Ok(approval)
}

pub fn read_approval(compliance_root: &Path, plan_id: &str) -> CnResult<Approval> {
    let path = approved_path(compliance_root, plan_id);
    let bytes = std::fs::read(&path).map_err(|_| CnError::ApprovalMissing {
        plan_id: plan_id.to_string(),
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// The gate `create_tickets` must pass before writing anything: re-reads
/// the pending plan fresh, recomputes its hash, and checks both the hash
/// and the repo binding against what was actually approved. Any edit to
/// the plan items or a switch of target after approval fails this check.
pub fn verify_approved(compliance_root: &Path, plan_id: &str, target: &Target) -> CnResult<PendingPlan> {
    let pending = read_pending_plan(compliance_root, plan_id)?;
    let approval = read_approval(compliance_root, plan_id)?;

    let current_hash = compute_plan_hash(&pending.repo_full_name, &pending.run_id, &pending.items)?;
    if current_hash != approval.plan_hash {
        return Err(CnError::PlanHashMismatch {
            plan_id: plan_id.to_string(),
            approved: approval.plan_hash,
            current: current_hash,
        });
    }

    let current_repo_full_name = target.repo_full_name();
    if approval.repo_full_name != current_repo_full_name {
        return Err(CnError::TargetMismatch {
            plan_id: plan_id.to_string(),
            approved_repo: approval.repo_full_name,
            pending_repo: current_repo_full_name,
        });
    }

    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cn_core::PlanItem;

    fn item(finding_id: &str) -> PlanItem {
        PlanItem {
            finding_id: finding_id.to_string(),
            title: "t".to_string(),
            body: "b".to_string(),
            labels: vec![],
            dedupe_query: "q".to_string(),
        }
    }

    #[test]
    fn approve_then_verify_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target::GitHub {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
        };
        let plan = write_pending_plan(dir.path(), "plan-1", "run-1", &target, vec![item("f1")]).unwrap();
        approve(dir.path(), "plan-1", "alice", None).unwrap();
        let verified = verify_approved(dir.path(), "plan-1", &target).unwrap();
        assert_eq!(verified.plan_hash, plan.plan_hash);
    }

    #[test]
    fn tampering_with_pending_plan_after_approval_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target::GitHub {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
        };
        write_pending_plan(dir.path(), "plan-1", "run-1", &target, vec![item("f1")]).unwrap();
        approve(dir.path(), "plan-1", "alice", None).unwrap();

        // Tamper: append a second item directly to the persisted pending plan.
        let mut pending = read_pending_plan(dir.path(), "plan-1").unwrap();
        pending.items.push(item("f2"));
        let path = pending_path(dir.path(), "plan-1");
        std::fs::write(&path, serde_json::to_vec_pretty(&pending).unwrap()).unwrap();

        let result = verify_approved(dir.path(), "plan-1", &target);
        assert!(matches!(result, Err(CnError::PlanHashMismatch { .. })));
    }

    #[test]
    fn retargeting_after_approval_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let original = Target::GitHub {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
        };
        write_pending_plan(dir.path(), "plan-1", "run-1", &original, vec![item("f1")]).unwrap();
        approve(dir.path(), "plan-1", "alice", None).unwrap();

        let other = Target::GitHub {
            owner: "acme".to_string(),
            repo: "gadgets".to_string(),
        };
        let result = verify_approved(dir.path(), "plan-1", &other);
        assert!(matches!(result, Err(CnError::TargetMismatch { .. })));
    }

    #[test]
    fn missing_approval_is_reported_distinctly() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target::GitHub {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
        };
        write_pending_plan(dir.path(), "plan-1", "run-1", &target, vec![item("f1")]).unwrap();
        let result = verify_approved(dir.path(), "plan-1", &target);
        assert!(matches!(result, Err(CnError::ApprovalMissing { .. })));
    }
}
