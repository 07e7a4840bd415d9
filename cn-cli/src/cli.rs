use crate::commands::*;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cn")]
#[command(about = "Compliance Navigator: local SOC 2 / HIPAA audit pipeline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose tracing output.
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run scanners over a repository and write a scan result.
    Scan(ScanCommand),
    /// Render an audit packet for a run.
    Packet(PacketCommand),
    /// Build a remediation plan for a run.
    Plan(PlanCommand),
    /// Dry-run or execute ticket filing for a run's findings.
    Tickets(TicketsCommand),
    /// Record human approval of a pending ticket plan.
    Approve(ApproveCommand),
    /// Verify the audit log's hash chain.
    VerifyChain(VerifyChainCommand),
    /// Export an audit packet as a deterministic ZIP archive.
    Export(ExportCommand),
    /// Materialize the synthetic demo fixture repository.
    Demo(DemoCommand),
    /// Print the path to a run's dashboard index.
    Dashboard(DashboardCommand),
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        if self.verbose {
            tracing::info!("running in verbose mode");
        }

        match self.command {
            Commands::Scan(cmd) => cmd.execute().await,
            Commands::Packet(cmd) => cmd.execute(),
            Commands::Plan(cmd) => cmd.execute(),
            Commands::Tickets(cmd) => cmd.execute().await,
            Commands::Approve(cmd) => cmd.execute(),
            Commands::VerifyChain(cmd) => cmd.execute(),
            Commands::Export(cmd) => cmd.execute(),
            Commands::Demo(cmd) => cmd.execute(),
            Commands::Dashboard(cmd) => cmd.execute(),
        }
    }
}
