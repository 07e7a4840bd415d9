pub mod packet;
pub mod plan;

pub use packet::{latest_packet_index, packet_dir, write_packet};
pub use plan::{build_plan, write_plan, RemediationItem, RemediationPlan, DEFAULT_MAX_ITEMS};
