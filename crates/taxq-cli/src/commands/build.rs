//! `taxq build` command implementation

use crate::error::Result;
use colored::Colorize;
use taxq_ingest::{TaxonomyPipeline, TaxqConfig};

/// Build the lookup artifacts from the dump directory
pub async fn run(config: TaxqConfig, force: bool) -> Result<()> {
    let pipeline = TaxonomyPipeline::new(config);
    let result = tokio::task::spawn_blocking(move || pipeline.run_build(force))
        .await
        .map_err(anyhow::Error::from)??;

    match result.manifest {
        Some(manifest) => {
            println!("{} Built taxonomy ({})", "✓".green(), manifest.source_version);
            super::stats::print_counts(&manifest.stats);
        },
        None => {
            println!("Artifacts are up to date. Use --force to rebuild.");
        },
    }

    Ok(())
}
