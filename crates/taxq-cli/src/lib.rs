//! taxq CLI library
//!
//! Query engine over an NCBI taxonomy database built by `taxq-ingest`.
//!
//! - **Queries**: resolve taxids, names, division codes and genetic code
//!   names to taxonomy records (`taxq query`)
//! - **Lineages**: print the ancestor chain of a taxid (`taxq lineage`)
//! - **Data management**: build artifacts from a dump (`taxq build`),
//!   download a dump (`taxq fetch`), show what is loaded (`taxq stats`)

pub mod commands;
pub mod error;
pub mod lineage;
pub mod query;
pub mod record;

pub use error::{CliError, Result};
pub use lineage::{Lineage, LineageWalker};
pub use query::{Outcome, QueryEngine, QueryResult, TokenClass, TokenResolution};
pub use record::TaxonomyRecord;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taxq_ingest::TaxqConfig;

/// taxq - NCBI taxonomy lookup
#[derive(Parser, Debug)]
#[command(name = "taxq")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the built lookup artifacts
    #[arg(long, env = "TAXQ_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory holding the extracted .dmp files
    #[arg(long, env = "TAXQ_DUMP_DIR", global = true)]
    pub dump_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve comma-separated taxids, names, divisions or genetic codes
    Query {
        /// Tokens, e.g. "9606,Escherichia coli,PRI"
        tokens: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Print the lineage of a taxid
    Lineage {
        taxid: String,

        /// Print taxids instead of names
        #[arg(long)]
        ids: bool,
    },

    /// Build lookup artifacts from the dump directory
    Build {
        /// Rebuild even when artifacts exist
        #[arg(short, long)]
        force: bool,
    },

    /// Download the taxdump and rebuild the artifacts
    Fetch,

    /// Show counts and version of the built artifacts
    Stats,
}

impl Cli {
    /// Loader configuration from the environment, overridden by flags
    pub fn taxq_config(&self) -> Result<TaxqConfig> {
        let mut config = TaxqConfig::from_env()?;

        if let Some(ref dir) = self.data_dir {
            config = config.with_data_dir(dir);
        }
        if let Some(ref dir) = self.dump_dir {
            config = config.with_dump_dir(dir);
        }

        config.validate()?;
        Ok(config)
    }
}
