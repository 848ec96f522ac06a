//! Application layer: the fan-out acquisition coordinator and report
//! presentation.

pub mod acquisition;
pub mod reporting;

pub use acquisition::AcquisitionService;
pub use reporting::{format_summary, format_vnd, save_report};
