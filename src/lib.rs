pub mod analysis;
pub mod cli;
pub mod model;
pub mod report;
pub mod status;
pub mod store;
pub mod trace;

pub use analysis::flaky::{FlakyAnalysis, FlakyTestDetail, analyze_flakiness};
pub use analysis::trend::{TrendPoint, summarize_trend};
pub use model::report_model::{PulseReport, TestRecord, TestStatus};
pub use status::resolver::effective_status;
pub use store::report_store::ReportStore;
