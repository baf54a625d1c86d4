//! `taxq fetch` command implementation

use crate::error::Result;
use colored::Colorize;
use taxq_ingest::progress::format_bytes;
use taxq_ingest::{TaxonomyPipeline, TaxqConfig};

/// Download the taxdump into the dump directory and rebuild
pub async fn run(config: TaxqConfig) -> Result<()> {
    let pipeline = TaxonomyPipeline::new(config);

    let summary = pipeline.run_fetch().await?;
    println!(
        "{} Downloaded taxdump {} ({})",
        "✓".green(),
        summary.external_version,
        format_bytes(summary.archive_bytes as u64)
    );

    let result = tokio::task::spawn_blocking(move || pipeline.run_build(true))
        .await
        .map_err(anyhow::Error::from)??;

    if let Some(manifest) = result.manifest {
        println!("{} Built taxonomy ({})", "✓".green(), manifest.source_version);
        super::stats::print_counts(&manifest.stats);
    }

    Ok(())
}
