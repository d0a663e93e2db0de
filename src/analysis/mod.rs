pub mod failures;
pub mod flaky;
pub mod summary;
pub mod trend;
