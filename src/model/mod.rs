pub mod report_model;
pub mod report_value;
pub mod timestamp;
