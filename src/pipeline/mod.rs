//! Pipeline entry points.
//!
//! - `CheckService::run`: check a published week against a folio
//! - `CheckService::scan_files`: the same check over local bulletin files
//! - `render_summary`: plain-text report

pub mod check;
pub mod summary;

pub use check::{CheckService, attach_chart_blocks, compile_report};
pub use summary::render_summary;
