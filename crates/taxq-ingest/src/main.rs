//! taxq-ingest - taxonomy dump fetch and build tool

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taxq_common::logging::{init_logging, LogConfig, LogLevel};
use taxq_ingest::{TaxonomyPipeline, TaxqConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "taxq-ingest")]
#[command(author, version, about = "Fetch the NCBI taxdump and build taxq lookup artifacts")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Artifact directory
    #[arg(long, global = true, env = "TAXQ_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory holding the extracted .dmp files
    #[arg(long, global = true, env = "TAXQ_DUMP_DIR")]
    dump_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download and extract taxdump.tar.gz
    Fetch {
        /// Rebuild the artifacts after downloading
        #[arg(long)]
        build: bool,
    },

    /// Build the lookup artifacts from the dump directory
    Build {
        /// Rebuild even when artifacts exist
        #[arg(short, long)]
        force: bool,

        /// Only parse this many nodes.dmp lines
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("taxq-ingest")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    let mut config = TaxqConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(dir) = cli.dump_dir {
        config = config.with_dump_dir(dir);
    }

    match cli.command {
        Command::Fetch { build } => {
            let pipeline = TaxonomyPipeline::new(config);
            if build {
                let result = pipeline.run_fetch_and_build().await?;
                info!(version = ?result.fetched_version, "Fetched and built taxonomy");
            } else {
                let summary = pipeline.run_fetch().await?;
                info!(version = %summary.external_version, files = summary.files.len(), "Fetched taxdump");
            }
        },
        Command::Build { force, limit } => {
            if let Some(limit) = limit {
                config = config.with_parse_limit(limit);
            }
            let result = TaxonomyPipeline::new(config).run_build(force)?;
            if result.skipped {
                info!("Artifacts up to date; use --force to rebuild");
            }
        },
    }

    info!("Done");
    Ok(())
}
