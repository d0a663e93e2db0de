use std::path::Path;

use pulse_insights::model::report_model::{PulseReport, TestRecord, TestStatus};
use serde_json::{Value, json};

pub fn passed(id: &str) -> TestRecord {
    TestRecord::new(id, "S", TestStatus::Passed)
}

pub fn failed(id: &str) -> TestRecord {
    TestRecord::new(id, "S", TestStatus::Failed)
}

pub fn report(timestamp: &str, results: Vec<TestRecord>) -> PulseReport {
    PulseReport::new(timestamp, results)
}

/// Raw report JSON in the upstream reporter's shape.
pub fn report_json(timestamp: &str, results: Value) -> Value {
    json!({
        "run": {
            "id": format!("run-{}", timestamp),
            "timestamp": timestamp,
            "totalTests": results.as_array().map_or(0, |r| r.len()),
            "passed": 0,
            "failed": 0,
            "skipped": 0,
            "duration": 1200
        },
        "results": results,
        "metadata": { "generatedAt": timestamp }
    })
}

pub fn test_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "name": format!("test {}", id),
        "suiteName": "S",
        "status": status,
        "duration": 100
    })
}

pub fn write_current(report_dir: &Path, report: &Value) {
    std::fs::create_dir_all(report_dir).unwrap();
    std::fs::write(
        report_dir.join("playwright-pulse-report.json"),
        serde_json::to_string_pretty(report).unwrap(),
    )
    .unwrap();
}

pub fn write_history(report_dir: &Path, file_name: &str, contents: &str) {
    let history = report_dir.join("history");
    std::fs::create_dir_all(&history).unwrap();
    std::fs::write(history.join(file_name), contents).unwrap();
}
