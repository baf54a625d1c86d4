//! taxq - main entry point

use clap::Parser;
use std::io::IsTerminal;
use std::process;
use taxq_cli::{Cli, Commands};
use taxq_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    // Quiet by default so stdout and stderr carry only records and diagnostics
    let log_config = LogConfig::builder()
        .level(if cli.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        })
        .output(LogOutput::Console)
        .log_file_prefix("taxq")
        .build();

    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _guard = init_logging(&log_config).ok().flatten();

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn execute_command(cli: &Cli) -> taxq_cli::Result<()> {
    let config = cli.taxq_config()?;

    match &cli.command {
        Commands::Query { tokens, format } => {
            taxq_cli::commands::query::run(config, tokens, format).await
        },
        Commands::Lineage { taxid, ids } => {
            taxq_cli::commands::lineage::run(config, taxid, *ids).await
        },
        Commands::Build { force } => taxq_cli::commands::build::run(config, *force).await,
        Commands::Fetch => taxq_cli::commands::fetch::run(config).await,
        Commands::Stats => taxq_cli::commands::stats::run(config).await,
    }
}
