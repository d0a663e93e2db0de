pub mod error;
pub mod report_store;
