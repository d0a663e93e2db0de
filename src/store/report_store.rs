use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::model::report_model::{PulseReport, ReportMetadata};
use crate::model::timestamp::chronological;
use crate::store::error::StoreError;

/// File name of the current run's report inside the report directory.
pub const CURRENT_REPORT_FILE: &str = "playwright-pulse-report.json";

/// Sub-directory holding historical run snapshots.
pub const HISTORY_DIR: &str = "history";

/// Default report directory name, relative to the project directory.
pub const DEFAULT_REPORT_DIR: &str = "pulse-report";

const HISTORY_PREFIX: &str = "trend-";
const HISTORY_SUFFIX: &str = ".json";

// ============================================================================
// Report store
// ============================================================================

/// Read-only access to a report directory.
///
/// ```text
/// <report_dir>/playwright-pulse-report.json   current run
/// <report_dir>/history/trend-*.json           historical runs
/// ```
///
/// The directory is fixed at construction; nothing is derived from the
/// process environment afterwards.
#[derive(Debug, Clone)]
pub struct ReportStore {
    report_dir: PathBuf,
    project_dir: Option<PathBuf>,
}

/// Public view of where the store reads from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    /// Last path component of the report directory
    pub report_dir: String,
    pub report_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<String>,
}

impl ReportStore {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
            project_dir: None,
        }
    }

    /// Record the project directory so loaded reports can carry it in
    /// their metadata.
    pub fn with_project_dir(mut self, project_dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(project_dir.into());
        self
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    pub fn current_report_path(&self) -> PathBuf {
        self.report_dir.join(CURRENT_REPORT_FILE)
    }

    pub fn history_dir(&self) -> PathBuf {
        self.report_dir.join(HISTORY_DIR)
    }

    pub fn report_config(&self) -> ReportConfig {
        let report_dir = self
            .report_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_REPORT_DIR.to_string());
        ReportConfig {
            report_dir,
            report_path: self.report_dir.display().to_string(),
            project_dir: self.project_dir.as_ref().map(|p| p.display().to_string()),
        }
    }

    /// Load the current run.
    ///
    /// A missing report file is not an error: it returns `Ok(None)` so
    /// callers can show a "no data" state.
    pub fn load_current_run(&self) -> Result<Option<PulseReport>, StoreError> {
        let path = self.current_report_path();
        debug!(path = %path.display(), "loading current run report");

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no current run report found");
                return Ok(None);
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        let mut report: PulseReport = serde_json::from_str(&content)
            .map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?;

        if let Some(project_dir) = &self.project_dir {
            let project_dir = project_dir.display().to_string();
            match report.metadata.as_mut() {
                Some(metadata) => metadata.user_project_dir = Some(project_dir),
                None => {
                    report.metadata = Some(ReportMetadata {
                        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                        user_project_dir: Some(project_dir),
                    })
                }
            }
        }

        debug!(
            results = report.results.len(),
            timestamp = %report.run.timestamp,
            "loaded current run report"
        );
        Ok(Some(report))
    }

    /// Load every historical snapshot, oldest first.
    ///
    /// A missing history directory yields an empty list. Individual files
    /// that cannot be read or parsed are logged and skipped.
    pub fn load_historical_runs(&self) -> Result<Vec<PulseReport>, StoreError> {
        let history_dir = self.history_dir();
        debug!(path = %history_dir.display(), "reading history directory");

        let entries = match std::fs::read_dir(&history_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    path = %history_dir.display(),
                    "history directory not found; no historical reports yet"
                );
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::HistoryDir {
                    path: history_dir,
                    source,
                });
            }
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::HistoryDir {
                path: history_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if is_history_file(&path) {
                paths.push(path);
            }
        }
        // Directory order is platform dependent
        paths.sort();
        debug!(count = paths.len(), "found trend files");

        let mut reports = Vec::with_capacity(paths.len());
        for path in &paths {
            match read_history_file(path) {
                Ok(report) => reports.push(report),
                Err(e) => warn!(error = %e, "skipping historical report"),
            }
        }

        reports.sort_by(|a, b| chronological(a.timestamp(), b.timestamp()));
        info!(
            loaded = reports.len(),
            skipped = paths.len() - reports.len(),
            "loaded historical reports"
        );
        Ok(reports)
    }
}

/// `trend-*.json`
fn is_history_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(HISTORY_PREFIX) && name.ends_with(HISTORY_SUFFIX))
}

fn read_history_file(path: &Path) -> Result<PulseReport, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut report: PulseReport =
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    if report.run.flakiness_rate.is_none() {
        report.run.flakiness_rate = Some(0.0);
    }
    Ok(report)
}
