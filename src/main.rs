use anyhow::Context;
use clap::Parser;
use pulse_insights::cli::commands::{
    cmd_config, cmd_failures, cmd_flaky, cmd_summary, cmd_tests, cmd_trends,
};
use pulse_insights::cli::config::{Cli, Commands, resolve_report_location, try_load_config};
use pulse_insights::store::report_store::ReportStore;
use pulse_insights::trace::logger::init_logging;
use tracing::{debug, warn};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = try_load_config(cli.config.as_deref());
    let config = match &loaded {
        Ok(Some(config)) => config.clone(),
        _ => Default::default(),
    };

    // Resolve log format: CLI > config > default
    let log_format = cli.log_format.unwrap_or(config.logging.format);
    init_logging(cli.verbose, log_format)?;

    if let Err(e) = &loaded {
        warn!(error = %e, "ignoring config file, using defaults");
    }

    let cwd = std::env::current_dir().context("could not determine working directory")?;
    let location = resolve_report_location(
        cli.report_dir.as_deref(),
        &config,
        cli.project_dir.as_deref(),
        &cwd,
    );
    debug!(
        report_dir = %location.report_dir.display(),
        project_dir = %location.project_dir.display(),
        "resolved report location"
    );
    let store = ReportStore::new(location.report_dir).with_project_dir(location.project_dir);

    let default_format = config.output.format;
    let ok = match cli.command {
        Commands::Summary { format } => cmd_summary(&store, format.unwrap_or(default_format))?,
        Commands::Flaky { format } => cmd_flaky(&store, format.unwrap_or(default_format))?,
        Commands::Trends { format } => cmd_trends(&store, format.unwrap_or(default_format))?,
        Commands::Failures { format } => cmd_failures(&store, format.unwrap_or(default_format))?,
        Commands::Tests { status, format } => {
            cmd_tests(&store, status, format.unwrap_or(default_format))?
        }
        Commands::Config => cmd_config(&store)?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
