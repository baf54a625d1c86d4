//! `taxq query` command implementation

use crate::error::Result;
use crate::query::{QueryEngine, QueryResult};
use crate::record::TaxonomyRecord;
use colored::Colorize;
use taxq_ingest::{TaxonomyPipeline, TaxqConfig};

/// Resolve the tokens and print the records
///
/// Records go to stdout, diagnostics to stderr. Unresolved tokens do not
/// fail the command.
pub async fn run(config: TaxqConfig, tokens: &str, format: &str) -> Result<()> {
    let db = TaxonomyPipeline::new(config).open_or_rebuild().await?;
    let result = QueryEngine::new(&db).run(tokens);

    let output = match format {
        "json" => format_as_json(&result)?,
        _ => format_as_text(&result),
    };
    if !output.is_empty() {
        println!("{}", output);
    }

    for diagnostic in result.diagnostics() {
        eprintln!("{}", diagnostic.yellow());
    }

    Ok(())
}

fn format_as_text(result: &QueryResult) -> String {
    result
        .records()
        .map(format_record)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_record(record: &TaxonomyRecord) -> String {
    let fields = record.fields();
    let width = fields.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

    fields
        .iter()
        .map(|(key, value)| format!("{}: {}", format!("{:<width$}", key).cyan(), value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_as_json(result: &QueryResult) -> Result<String> {
    let records: Vec<&TaxonomyRecord> = result.records().collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Outcome, TokenClass, TokenResolution};

    fn result() -> QueryResult {
        let record = TaxonomyRecord {
            taxid: 562,
            scientific_name: "Escherichia coli".to_string(),
            common_name: None,
            formal_name: None,
            rank: "species".to_string(),
            division: "BCT".to_string(),
            lineage: "Escherichia coli".to_string(),
            genetic_code: 11,
            mitochondrial_genetic_code: 0,
            submittable: true,
        };

        QueryResult {
            resolutions: vec![
                TokenResolution {
                    token: "562".to_string(),
                    class: TokenClass::Taxid(562),
                    outcome: Outcome::Found(record),
                },
                TokenResolution {
                    token: "nothing".to_string(),
                    class: TokenClass::Name,
                    outcome: Outcome::NoMatch("nothing".to_string()),
                },
            ],
        }
    }

    #[test]
    fn test_format_as_text() {
        colored::control::set_override(false);
        let text = format_as_text(&result());

        assert!(text.starts_with("taxid                   : 562\n"));
        assert!(text.contains("scientificName          : Escherichia coli"));
        assert!(text.ends_with("submittable             : true"));
    }

    #[test]
    fn test_format_as_json() {
        let json = format_as_json(&result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["taxid"], "562");
        assert_eq!(value[0]["geneticCode"], "11");
    }

    #[test]
    fn test_format_empty() {
        let empty = QueryResult::default();
        assert_eq!(format_as_text(&empty), "");
        assert_eq!(format_as_json(&empty).unwrap(), "[]");
    }
}
