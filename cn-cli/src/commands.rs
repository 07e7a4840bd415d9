use crate::utils::{print_error, print_info, print_json, print_success};
use clap::Args;
use cn_handlers::HandlerContext;

#[derive(Args)]
pub struct ScanCommand {
    #[arg(long)]
    pub repo_path: String,
    #[arg(long)]
    pub framework: String,
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl ScanCommand {
    pub async fn execute(self) -> anyhow::Result<()> {
        let ctx = HandlerContext::new(&self.repo_path)?;
        print_info(&format!("scanning {} ({})", self.repo_path, self.framework));
        let response = cn_handlers::scan_repo(
            &ctx,
            cn_handlers::ScanRepoRequest {
                repo_path: self.repo_path,
                framework: self.framework,
                timeout_secs: self.timeout_secs,
            },
        )
        .await?;
        print_success(&format!(
            "run {} complete: {} findings, {:.1}% coverage",
            response.run_id, response.finding_count, response.coverage_pct
        ));
        print_json(&response)?;
        Ok(())
    }
}

#[derive(Args)]
pub struct PacketCommand {
    #[arg(long)]
    pub repo_path: String,
    #[arg(long)]
    pub run_id: Option<String>,
}

impl PacketCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let ctx = HandlerContext::new(&self.repo_path)?;
        let response = cn_handlers::generate_audit_packet(
            &ctx,
            cn_handlers::GenerateAuditPacketRequest { run_id: self.run_id },
        )?;
        print_success(&format!("audit packet written: {}", response.index_path));
        print_json(&response)?;
        Ok(())
    }
}

#[derive(Args)]
pub struct PlanCommand {
    #[arg(long)]
    pub repo_path: String,
    #[arg(long)]
    pub run_id: Option<String>,
    #[arg(long)]
    pub max_items: Option<usize>,
}

impl PlanCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let ctx = HandlerContext::new(&self.repo_path)?;
        let response = cn_handlers::plan_remediation(
            &ctx,
            cn_handlers::PlanRemediationRequest {
                run_id: self.run_id,
                max_items: self.max_items,
            },
        )?;
        print_success(&format!(
            "remediation plan written: {} ({} items, {} omitted)",
            response.plan_path, response.item_count, response.omitted_count
        ));
        print_json(&response)?;
        Ok(())
    }
}

#[derive(Args)]
pub struct TicketsCommand {
    #[arg(long)]
    pub repo_path: String,
    #[arg(long)]
    pub run_id: Option<String>,
    #[arg(long)]
    pub tracker: String,
    #[arg(long)]
    pub target_repo: Option<String>,
    #[arg(long)]
    pub project_key: Option<String>,
    #[arg(long)]
    pub label_policy: Option<String>,
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long)]
    pub approved_plan_id: Option<String>,
    /// Leave a closed duplicate closed (skipped) instead of reopening it.
    #[arg(long)]
    pub no_reopen_closed: bool,
}

impl TicketsCommand {
    pub async fn execute(self) -> anyhow::Result<()> {
        let ctx = HandlerContext::new(&self.repo_path)?;
        let response = cn_handlers::create_tickets(
            &ctx,
            cn_handlers::CreateTicketsRequest {
                run_id: self.run_id,
                tracker: self.tracker,
                target_repo: self.target_repo,
                project_key: self.project_key,
                label_policy: self.label_policy,
                dry_run: self.dry_run,
                approved_plan_id: self.approved_plan_id,
                reopen_closed: !self.no_reopen_closed,
            },
        )
        .await?;
        match &response {
            cn_handlers::CreateTicketsResponse::DryRun { plan_id, plan_hash, item_count } => {
                print_info(&format!(
                    "dry run: plan {plan_id} ({item_count} items, hash {plan_hash}) — awaiting approval"
                ));
            }
            cn_handlers::CreateTicketsResponse::Executed {
                created,
                reopened,
                already_open,
                skipped_as_duplicate,
                failed,
                ..
            } => {
                print_success(&format!(
                    "filed: {created} created, {reopened} reopened, {already_open} already open, {skipped_as_duplicate} skipped as duplicate, {failed} failed"
                ));
            }
        }
        print_json(&response)?;
        Ok(())
    }
}

#[derive(Args)]
pub struct ApproveCommand {
    #[arg(long)]
    pub repo_path: String,
    #[arg(long)]
    pub plan_id: String,
    #[arg(long)]
    pub approved_by: String,
    #[arg(long)]
    pub reason: Option<String>,
}

impl ApproveCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let ctx = HandlerContext::new(&self.repo_path)?;
        let response = cn_handlers::approve_ticket_plan(
            &ctx,
            cn_handlers::ApproveTicketPlanRequest {
                plan_id: self.plan_id,
                approved_by: self.approved_by,
                reason: self.reason,
            },
        )?;
        print_success(&format!("plan {} approved for {}", response.plan_id, response.repo_full_name));
        print_json(&response)?;
        Ok(())
    }
}

#[derive(Args)]
pub struct VerifyChainCommand {
    #[arg(long)]
    pub repo_path: String,
}

impl VerifyChainCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let ctx = HandlerContext::new(&self.repo_path)?;
        let result = cn_handlers::verify_audit_chain(&ctx, cn_handlers::VerifyAuditChainRequest::default())?;
        if result.valid {
            print_success(&format!("chain valid: {} entries", result.total_entries));
        } else {
            print_error(&format!(
                "chain broken at line {:?}: {:?}",
                result.broken_at, result.broken_reason
            ));
        }
        print_json(&result)?;
        Ok(())
    }
}

#[derive(Args)]
pub struct ExportCommand {
    #[arg(long)]
    pub repo_path: String,
    #[arg(long)]
    pub run_id: Option<String>,
}

impl ExportCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let ctx = HandlerContext::new(&self.repo_path)?;
        let response = cn_handlers::export_audit_packet(
            &ctx,
            cn_handlers::ExportAuditPacketRequest { run_id: self.run_id },
        )?;
        print_success(&format!("exported {} (sha256 {})", response.zip_path, response.sha256));
        print_json(&response)?;
        Ok(())
    }
}

#[derive(Args)]
pub struct DemoCommand {
    #[arg(long)]
    pub target_dir: String,
}

impl DemoCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let response = cn_handlers::create_demo_fixture(cn_handlers::CreateDemoFixtureRequest {
            target_dir: self.target_dir,
        })?;
        print_success(&format!("demo fixture written under {}", response.repo_path));
        print_json(&response)?;
        Ok(())
    }
}

#[derive(Args)]
pub struct DashboardCommand {
    #[arg(long)]
    pub repo_path: String,
    #[arg(long)]
    pub run_id: Option<String>,
}

impl DashboardCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let ctx = HandlerContext::new(&self.repo_path)?;
        let response =
            cn_handlers::open_dashboard(&ctx, cn_handlers::OpenDashboardRequest { run_id: self.run_id })?;
        print_info(&response.note);
        print_json(&response)?;
        Ok(())
    }
}
