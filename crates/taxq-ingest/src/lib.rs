//! taxq ingest library
//!
//! Loads an NCBI taxonomy dump (`names.dmp`, `nodes.dmp`, `division.dmp`,
//! `gencode.dmp`, `merged.dmp`, `delnodes.dmp`) into an in-memory
//! [`TaxonomyDatabase`] and persists its lookup tables as JSON artifacts.
//!
//! # Example
//!
//! ```no_run
//! use taxq_ingest::{TaxonomyPipeline, TaxqConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = TaxqConfig::from_env()?;
//! let db = TaxonomyPipeline::new(config).open_or_rebuild().await?;
//!
//! if let Some(taxid) = db.taxid_for_name("Homo sapiens") {
//!     println!("{}", taxid);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod fetch;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod progress;
pub mod store;

pub use config::TaxqConfig;
pub use database::{normalize_key, DatabaseStats, TaxonomyDatabase};
pub use fetch::{FetchSummary, TaxdumpFetcher};
pub use models::{Division, GeneticCode, GeneticCodeId, Node, TaxId, TaxdumpData};
pub use parser::{TaxdumpFiles, TaxdumpParser};
pub use pipeline::{PipelineResult, TaxonomyPipeline};
pub use store::{ArtifactStore, Manifest};
