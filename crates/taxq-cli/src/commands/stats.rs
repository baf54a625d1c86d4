//! `taxq stats` command implementation

use crate::error::Result;
use colored::Colorize;
use taxq_ingest::{ArtifactStore, DatabaseStats, TaxqConfig};

/// Show what the artifact directory holds
pub async fn run(config: TaxqConfig) -> Result<()> {
    let store = ArtifactStore::new(&config.data_dir);
    let manifest = store.manifest()?;

    println!("{}", "Taxonomy Database:".cyan().bold());
    println!("  Version:   {}", manifest.source_version);
    println!("  Built:     {}", manifest.built_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Directory: {}", store.dir().display());
    if let Some(missing) = store.missing_artifact() {
        println!("  {} {} is missing; run 'taxq build --force'", "Warning:".yellow(), missing);
    }
    println!();
    print_counts(&manifest.stats);

    Ok(())
}

pub(crate) fn print_counts(stats: &DatabaseStats) {
    println!("{}", "Summary:".cyan().bold());
    println!("  Nodes:          {}", stats.nodes);
    println!("  Indexed names:  {}", stats.indexed_names);
    println!("  Divisions:      {}", stats.divisions);
    println!("  Genetic codes:  {}", stats.genetic_codes);
    println!("  Merged taxids:  {}", stats.merged);
    println!("  Deleted taxids: {}", stats.deleted);
}
