pub mod frameworks;
pub mod mapping;
pub mod roi;

pub use frameworks::{controls_for, Control, ScannerMapping, HIPAA, SOC2_LITE};
pub use mapping::{annotate_findings, compute_coverage};
pub use roi::{estimate_roi, ROI_BASIS};
