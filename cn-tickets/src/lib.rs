pub mod adapter;
pub mod approval;
pub mod github;
pub mod http;
pub mod jira;
pub mod plan;
pub mod rate_limit;
pub mod target;

pub use adapter::{ExistingTicket, LabelPolicy, TicketOutcome, TrackerAdapter};
pub use approval::{approve, compute_plan_hash, read_approval, read_pending_plan, verify_approved, write_pending_plan};
pub use github::GitHubAdapter;
pub use jira::JiraAdapter;
pub use plan::{build_plan_items, finding_id_from_body};
pub use rate_limit::{file_tickets, TicketResult, BATCH_DELAY_MS, MAX_CONCURRENT_WRITES, READ_DELAY_MS};
pub use target::{resolve_github_target, resolve_jira_target, Target};
