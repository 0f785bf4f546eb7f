pub mod handlers;
pub mod server;

pub use handlers::{MapOptions, MapOutcome, ReportFormat, handle_map, render_report};
