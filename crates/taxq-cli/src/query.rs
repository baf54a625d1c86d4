//! Query dispatcher
//!
//! A query is a comma-separated list of tokens. Each token is classified as a
//! taxid, a division, a genetic code or a name, resolved against the matching
//! index, and turned into a typed [`Outcome`]. Unresolved tokens are values,
//! never errors, so one bad token cannot abort the batch.

use std::collections::HashSet;
use taxq_ingest::{GeneticCodeId, TaxId, TaxonomyDatabase};
use tracing::debug;

use crate::lineage::LineageWalker;
use crate::record::TaxonomyRecord;

/// How a token was read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenClass {
    Taxid(TaxId),
    /// All digits but too large for a taxid
    OversizedTaxid,
    /// Division code
    Division(String),
    GeneticCode(GeneticCodeId),
    Name,
}

/// Classify a trimmed, non-empty token
///
/// Digits come first, then division codes and names, then genetic code
/// names and abbreviations. Anything else is a taxon name.
pub fn classify(db: &TaxonomyDatabase, token: &str) -> TokenClass {
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        return match token.parse() {
            Ok(taxid) => TokenClass::Taxid(taxid),
            Err(_) => TokenClass::OversizedTaxid,
        };
    }

    if let Some(code) = db.division_code(token) {
        return TokenClass::Division(code.to_string());
    }

    if let Some(id) = db.genetic_code_id(token) {
        return TokenClass::GeneticCode(id);
    }

    TokenClass::Name
}

/// Result of resolving one token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Found(TaxonomyRecord),
    /// The taxid was merged into `record.taxid`
    Merged { from: TaxId, record: TaxonomyRecord },
    /// Every taxon of a division or genetic code, possibly none
    Group { records: Vec<TaxonomyRecord> },
    Deleted(TaxId),
    /// A taxid that is neither present, deleted nor merged
    NotFound(String),
    /// A name that matches nothing
    NoMatch(String),
}

impl Outcome {
    pub fn records(&self) -> &[TaxonomyRecord] {
        match self {
            Outcome::Found(record) | Outcome::Merged { record, .. } => std::slice::from_ref(record),
            Outcome::Group { records } => records,
            Outcome::Deleted(_) | Outcome::NotFound(_) | Outcome::NoMatch(_) => &[],
        }
    }

    /// User-facing message for tokens that produced no record
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Outcome::Deleted(taxid) => Some(format!(
                "Given taxid {} is deleted, no taxonomy information provided.",
                taxid
            )),
            Outcome::NotFound(token) => Some(format!("Given taxid {} does not exist.", token)),
            Outcome::NoMatch(token) => Some(format!("No match for given taxon {}", token)),
            Outcome::Found(_) | Outcome::Merged { .. } | Outcome::Group { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResolution {
    pub token: String,
    pub class: TokenClass,
    pub outcome: Outcome,
}

/// Per-token resolutions in first-appearance order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub resolutions: Vec<TokenResolution>,
}

impl QueryResult {
    pub fn records(&self) -> impl Iterator<Item = &TaxonomyRecord> {
        self.resolutions.iter().flat_map(|r| r.outcome.records())
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.resolutions
            .iter()
            .filter_map(|r| r.outcome.diagnostic())
            .collect()
    }
}

/// Resolves queries against a loaded database
pub struct QueryEngine<'a> {
    db: &'a TaxonomyDatabase,
    walker: LineageWalker<'a>,
}

impl<'a> QueryEngine<'a> {
    pub fn new(db: &'a TaxonomyDatabase) -> Self {
        Self {
            db,
            walker: LineageWalker::new(db),
        }
    }

    /// Resolve a comma-separated token list
    ///
    /// Tokens are trimmed, empty ones dropped and repeats collapsed.
    pub fn run(&self, input: &str) -> QueryResult {
        let mut seen = HashSet::new();
        let resolutions = input
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .filter(|token| seen.insert(*token))
            .map(|token| self.resolve(token))
            .collect();

        QueryResult { resolutions }
    }

    /// Resolve a single token
    pub fn resolve(&self, token: &str) -> TokenResolution {
        let class = classify(self.db, token);
        debug!(token, class = ?class, "Classified token");

        let outcome = match &class {
            TokenClass::Taxid(taxid) => self.resolve_taxid(*taxid),
            TokenClass::OversizedTaxid => Outcome::NotFound(token.to_string()),
            TokenClass::Division(code) => Outcome::Group {
                records: self.records_for(self.db.division_members(code)),
            },
            TokenClass::GeneticCode(id) => Outcome::Group {
                records: self.records_for(&self.db.genetic_code_members(*id)),
            },
            TokenClass::Name => match self.db.taxid_for_name(token) {
                Some(taxid) => self.resolve_taxid(taxid),
                None => Outcome::NoMatch(token.to_string()),
            },
        };

        TokenResolution {
            token: token.to_string(),
            class,
            outcome,
        }
    }

    /// Present, then deleted, then merged
    pub fn resolve_taxid(&self, taxid: TaxId) -> Outcome {
        if let Some(record) = self.record(taxid) {
            return Outcome::Found(record);
        }

        if self.db.is_deleted(taxid) {
            return Outcome::Deleted(taxid);
        }

        if let Some(new_taxid) = self.db.merged_into(taxid) {
            debug!(from = taxid, to = new_taxid, "Following merge");
            if let Some(record) = self.record(new_taxid) {
                return Outcome::Merged {
                    from: taxid,
                    record,
                };
            }
            if self.db.is_deleted(new_taxid) {
                return Outcome::Deleted(taxid);
            }
        }

        Outcome::NotFound(taxid.to_string())
    }

    /// Build the record of a present taxid
    pub fn record(&self, taxid: TaxId) -> Option<TaxonomyRecord> {
        let node = self.db.node(taxid)?;
        Some(TaxonomyRecord::from_node(node, &self.walker.walk(taxid)))
    }

    fn records_for(&self, taxids: &[TaxId]) -> Vec<TaxonomyRecord> {
        taxids.iter().filter_map(|taxid| self.record(*taxid)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxq_ingest::models::{Division, GeneticCode, MergedTaxon, NameEntry, NodeEntry, TaxdumpData, DeletedTaxon};

    fn node(taxid: TaxId, parent: TaxId, rank: &str, division_id: u32, gc: u8, mgc: u8) -> NodeEntry {
        NodeEntry {
            taxid,
            parent_taxid: parent,
            rank: rank.to_string(),
            embl_code: String::new(),
            division_id,
            inherited_division: false,
            genetic_code: gc,
            inherited_genetic_code: false,
            mitochondrial_genetic_code: mgc,
            inherited_mitochondrial_genetic_code: false,
            genbank_hidden: false,
            hidden_subtree_root: false,
        }
    }

    fn name(taxid: TaxId, name: &str, class: &str) -> NameEntry {
        NameEntry {
            taxid,
            name: name.to_string(),
            unique_name: String::new(),
            name_class: class.to_string(),
        }
    }

    fn gencode(id: u8, abbreviation: &str, name: &str) -> GeneticCode {
        GeneticCode {
            id,
            abbreviation: abbreviation.to_string(),
            name: name.to_string(),
            translation_table: String::new(),
            start_codons: String::new(),
        }
    }

    fn sample_db() -> TaxonomyDatabase {
        TaxonomyDatabase::build(TaxdumpData {
            nodes: vec![
                node(2759, 1, "superkingdom", 1, 1, 1),
                node(9605, 2759, "genus", 5, 1, 2),
                node(9606, 9605, "species", 5, 1, 2),
                node(7227, 2759, "species", 1, 1, 5),
            ],
            names: vec![
                name(2759, "Eukaryota", "scientific name"),
                name(9605, "Homo", "scientific name"),
                name(9606, "Homo sapiens", "scientific name"),
                name(9606, "human", "genbank common name"),
                name(7227, "Drosophila melanogaster", "scientific name"),
                name(7227, "fruit fly", "common name"),
            ],
            divisions: vec![
                Division {
                    id: 1,
                    code: "INV".to_string(),
                    name: "Invertebrates".to_string(),
                    comments: String::new(),
                },
                Division {
                    id: 5,
                    code: "PRI".to_string(),
                    name: "Primates".to_string(),
                    comments: String::new(),
                },
            ],
            genetic_codes: vec![
                gencode(1, "SGC0", "Standard"),
                gencode(2, "SGC1", "Vertebrate Mitochondrial"),
                gencode(5, "SGC4", "Invertebrate Mitochondrial"),
                gencode(25, "", "Candidate Division SR1 and Gracilibacteria"),
            ],
            merged: vec![MergedTaxon::new(9607, 9606), MergedTaxon::new(111, 222)],
            deleted: vec![DeletedTaxon::new(12345), DeletedTaxon::new(222)],
            external_version: "test".to_string(),
        })
    }

    #[test]
    fn test_classify_order() {
        let db = sample_db();

        assert_eq!(classify(&db, "9606"), TokenClass::Taxid(9606));
        assert_eq!(classify(&db, "99999999999"), TokenClass::OversizedTaxid);
        assert_eq!(classify(&db, "pri"), TokenClass::Division("PRI".to_string()));
        assert_eq!(classify(&db, "Primates"), TokenClass::Division("PRI".to_string()));
        assert_eq!(classify(&db, "vertebrate mitochondrial"), TokenClass::GeneticCode(2));
        assert_eq!(classify(&db, "SGC4"), TokenClass::GeneticCode(5));
        assert_eq!(classify(&db, "Homo sapiens"), TokenClass::Name);
        assert_eq!(classify(&db, "-9606"), TokenClass::Name);
    }

    #[test]
    fn test_taxid_found() {
        let db = sample_db();
        let result = QueryEngine::new(&db).run("9606");

        let records: Vec<_> = result.records().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].taxid, 9606);
        assert_eq!(records[0].scientific_name, "Homo sapiens");
        assert_eq!(records[0].lineage, "Homo; Homo sapiens");
        assert_eq!(records[0].common_name.as_deref(), Some("human"));
        assert_eq!(records[0].formal_name, Some(true));
        assert!(records[0].submittable);
        assert!(result.diagnostics().is_empty());
    }

    #[test]
    fn test_deleted_taxid() {
        let db = sample_db();
        let result = QueryEngine::new(&db).run("12345");

        assert_eq!(result.records().count(), 0);
        assert_eq!(
            result.diagnostics(),
            vec!["Given taxid 12345 is deleted, no taxonomy information provided.".to_string()]
        );
    }

    #[test]
    fn test_merged_taxid_matches_new_record() {
        let db = sample_db();
        let engine = QueryEngine::new(&db);

        let merged = engine.resolve("9607");
        let current = engine.resolve("9606");

        assert_eq!(merged.outcome.records(), current.outcome.records());
        assert!(matches!(merged.outcome, Outcome::Merged { from: 9607, .. }));
        assert!(merged.outcome.diagnostic().is_none());
    }

    #[test]
    fn test_merged_into_deleted_taxid() {
        let db = sample_db();
        assert_eq!(QueryEngine::new(&db).resolve_taxid(111), Outcome::Deleted(111));
    }

    #[test]
    fn test_unknown_taxids() {
        let db = sample_db();
        let result = QueryEngine::new(&db).run("424242, 99999999999");

        assert_eq!(
            result.diagnostics(),
            vec![
                "Given taxid 424242 does not exist.".to_string(),
                "Given taxid 99999999999 does not exist.".to_string(),
            ]
        );
    }

    #[test]
    fn test_name_lookup_and_no_match() {
        let db = sample_db();
        let result = QueryEngine::new(&db).run("fruit  fly, notaspecies123");

        let records: Vec<_> = result.records().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].taxid, 7227);
        assert_eq!(records[0].formal_name, Some(false));
        assert_eq!(
            result.diagnostics(),
            vec!["No match for given taxon notaspecies123".to_string()]
        );
    }

    #[test]
    fn test_division_group() {
        let db = sample_db();
        let result = QueryEngine::new(&db).run("PRI");

        let taxids: Vec<_> = result.records().map(|r| r.taxid).collect();
        assert_eq!(taxids, vec![9605, 9606]);
    }

    #[test]
    fn test_genetic_code_union() {
        let db = sample_db();
        let result = QueryEngine::new(&db).run("Standard");

        let taxids: Vec<_> = result.records().map(|r| r.taxid).collect();
        assert_eq!(taxids, vec![2759, 7227, 9605, 9606]);

        let mito = QueryEngine::new(&db).run("Invertebrate Mitochondrial");
        let taxids: Vec<_> = mito.records().map(|r| r.taxid).collect();
        assert_eq!(taxids, vec![7227]);
    }

    #[test]
    fn test_empty_genetic_code_group_is_silent() {
        let db = sample_db();
        let result = QueryEngine::new(&db).run("Candidate Division SR1 and Gracilibacteria");

        assert_eq!(result.resolutions.len(), 1);
        assert_eq!(result.records().count(), 0);
        assert!(result.diagnostics().is_empty());
    }

    #[test]
    fn test_tokens_deduplicated_and_trimmed() {
        let db = sample_db();
        let result = QueryEngine::new(&db).run(" 9606,9606 ,, homo sapiens ,9606");

        let tokens: Vec<_> = result.resolutions.iter().map(|r| r.token.as_str()).collect();
        assert_eq!(tokens, vec!["9606", "homo sapiens"]);
    }

    #[test]
    fn test_empty_query() {
        let db = sample_db();
        assert_eq!(QueryEngine::new(&db).run(" , ,"), QueryResult::default());
    }
}
