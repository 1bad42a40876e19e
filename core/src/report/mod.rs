mod build;
mod model;
mod render;
mod write;

pub use build::{build_report, ReportInput};
pub use model::{
    CategoryStatus, CategorySummary, FailureDetail, RunFlags, RunReport, Totals, WarningDetail,
};
pub use render::render_text;
pub use write::{report_file_name, write_report, LATEST_REPORT_FILE};
