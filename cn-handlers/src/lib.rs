pub mod approve_ticket_plan;
pub mod context;
pub mod create_demo_fixture;
pub mod create_tickets;
pub mod export_audit_packet;
pub mod generate_audit_packet;
pub mod open_dashboard;
pub mod plan_remediation;
pub mod scan_repo;
pub mod validate;
pub mod verify_audit_chain;

pub use approve_ticket_plan::{approve_ticket_plan, ApproveTicketPlanRequest, ApproveTicketPlanResponse};
pub use context::HandlerContext;
pub use create_demo_fixture::{create_demo_fixture, CreateDemoFixtureRequest, CreateDemoFixtureResponse};
pub use create_tickets::{create_tickets, CreateTicketsRequest, CreateTicketsResponse};
pub use export_audit_packet::{export_audit_packet, ExportAuditPacketRequest, ExportAuditPacketResponse};
pub use generate_audit_packet::{generate_audit_packet, GenerateAuditPacketRequest, GenerateAuditPacketResponse};
pub use open_dashboard::{open_dashboard, OpenDashboardRequest, OpenDashboardResponse};
pub use plan_remediation::{plan_remediation, PlanRemediationRequest, PlanRemediationResponse};
pub use scan_repo::{read_scan_result, scan_repo, ScanRepoRequest, ScanRepoResponse};
pub use verify_audit_chain::{verify_audit_chain, VerifyAuditChainRequest};
