use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::report_model::TestStatus;
use crate::store::report_store::DEFAULT_REPORT_DIR;
use crate::trace::logger::LogFormat;

/// Config file looked up in the current directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "pulse-insights.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "pulse-insights",
    version,
    about = "Flakiness, trend and failure analysis for Playwright pulse reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Report directory (contains playwright-pulse-report.json and history/)
    #[arg(long, global = true, env = "PULSE_REPORT_DIR")]
    pub report_dir: Option<String>,

    /// Project directory the default report directory is resolved against
    #[arg(long, global = true, env = "PULSE_USER_CWD")]
    pub project_dir: Option<String>,

    /// Path to config file (default: pulse-insights.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summary metrics of the current run
    Summary {
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Flaky tests in the current run and across history
    Flaky {
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Per-run trend series from historical reports
    Trends {
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Failed tests of the current run grouped by error category
    Failures {
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Tests of the current run with their effective status
    Tests {
        /// Only show tests with this effective status
        #[arg(long)]
        status: Option<TestStatus>,

        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show the resolved report location
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `pulse-insights.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Report directory, relative paths resolved against the project dir
    #[serde(default)]
    pub report_dir: Option<String>,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load the config file.
///
/// `Ok(None)` when the file does not exist; read and parse failures are
/// returned so the caller can report them once logging is up.
pub fn try_load_config(path: Option<&str>) -> Result<Option<AppConfig>, ConfigError> {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    let content = match std::fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: config_path.to_string(),
                source,
            });
        }
    };
    serde_yaml::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: config_path.to_string(),
            source,
        })
}

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    try_load_config(path).ok().flatten().unwrap_or_default()
}

// ============================================================================
// Report location resolution (CLI > env > config > defaults)
// ============================================================================

/// Resolved locations the report store is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLocation {
    pub report_dir: PathBuf,
    pub project_dir: PathBuf,
}

/// Decide where reports live.
///
/// `report_dir` is the CLI flag or `PULSE_REPORT_DIR` (clap merges the
/// two), then the config file, then `<project_dir>/pulse-report`. The
/// project dir is `PULSE_USER_CWD` or the working directory. Blank values
/// count as unset.
pub fn resolve_report_location(
    report_dir: Option<&str>,
    config: &AppConfig,
    project_dir: Option<&str>,
    cwd: &Path,
) -> ReportLocation {
    let project_dir = non_blank(project_dir)
        .map(|p| absolutize(Path::new(p), cwd))
        .unwrap_or_else(|| cwd.to_path_buf());

    let report_dir = non_blank(report_dir)
        .or_else(|| non_blank(config.report_dir.as_deref()))
        .map(|dir| absolutize(Path::new(dir), &project_dir))
        .unwrap_or_else(|| project_dir.join(DEFAULT_REPORT_DIR));

    ReportLocation {
        report_dir,
        project_dir,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
