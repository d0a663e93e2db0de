use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading report files from disk.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Report file exists but could not be read
    #[error("report file unreadable at '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Report file is not a valid report document
    #[error("invalid JSON format in report file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// History directory exists but could not be listed
    #[error("could not read history directory '{}': {source}", .path.display())]
    HistoryDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            StoreError::Read { path, .. }
            | StoreError::Parse { path, .. }
            | StoreError::HistoryDir { path, .. } => path,
        }
    }
}
