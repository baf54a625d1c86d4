//! `taxq lineage` command implementation

use crate::error::{CliError, Result};
use crate::lineage::LineageWalker;
use crate::query::{Outcome, QueryEngine};
use colored::Colorize;
use taxq_ingest::{TaxId, TaxonomyPipeline, TaxqConfig};

/// Print the lineage of one taxid, following merges
pub async fn run(config: TaxqConfig, taxid: &str, ids: bool) -> Result<()> {
    let taxid = parse_taxid(taxid)?;

    let db = TaxonomyPipeline::new(config).open_or_rebuild().await?;
    let outcome = QueryEngine::new(&db).resolve_taxid(taxid);

    if let Outcome::Merged { from, record } = &outcome {
        eprintln!("{}", format!("Taxid {} was merged into {}", from, record.taxid).dimmed());
    }

    match outcome.records().first() {
        Some(record) if ids => {
            println!("{}", LineageWalker::new(&db).walk(record.taxid).id_string());
        },
        Some(record) => println!("{}", record.lineage),
        None => {
            if let Some(diagnostic) = outcome.diagnostic() {
                eprintln!("{}", diagnostic.yellow());
            }
        },
    }

    Ok(())
}

fn parse_taxid(token: &str) -> Result<TaxId> {
    let token = token.trim();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CliError::InvalidTaxid(token.to_string()));
    }
    token
        .parse()
        .map_err(|_| CliError::InvalidTaxid(token.to_string()))
}
