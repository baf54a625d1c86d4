//! NCBI taxdump data models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// NCBI taxonomy identifier (e.g. 9606 for Homo sapiens)
pub type TaxId = u32;

/// Genetic code identifier from gencode.dmp
pub type GeneticCodeId = u8;

/// Name class holding the canonical name of a node
pub const SCIENTIFIC_NAME: &str = "scientific name";
/// Preferred common name class
pub const GENBANK_COMMON_NAME: &str = "genbank common name";
/// Fallback common name class
pub const COMMON_NAME: &str = "common name";

/// One line of names.dmp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameEntry {
    pub taxid: TaxId,
    /// The name itself
    pub name: String,
    /// Disambiguated form of the name, empty when the name is already unique
    pub unique_name: String,
    /// e.g. "scientific name", "genbank common name", "synonym"
    pub name_class: String,
}

/// One line of nodes.dmp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeEntry {
    pub taxid: TaxId,
    pub parent_taxid: TaxId,
    pub rank: String,
    /// Locus-name prefix; not unique
    pub embl_code: String,
    pub division_id: u32,
    pub inherited_division: bool,
    pub genetic_code: GeneticCodeId,
    pub inherited_genetic_code: bool,
    pub mitochondrial_genetic_code: GeneticCodeId,
    pub inherited_mitochondrial_genetic_code: bool,
    /// Name is suppressed in GenBank entry lineages
    pub genbank_hidden: bool,
    /// Subtree has no sequence data yet
    pub hidden_subtree_root: bool,
}

/// One line of division.dmp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Division {
    pub id: u32,
    /// Three-letter code, e.g. "PRI"
    pub code: String,
    /// e.g. "Primates"
    pub name: String,
    pub comments: String,
}

/// One line of gencode.dmp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneticCode {
    pub id: GeneticCodeId,
    pub abbreviation: String,
    /// e.g. "Vertebrate Mitochondrial"
    pub name: String,
    pub translation_table: String,
    pub start_codons: String,
}

/// An old taxid merged into a current one
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergedTaxon {
    pub old_taxid: TaxId,
    pub new_taxid: TaxId,
}

impl MergedTaxon {
    pub fn new(old_taxid: TaxId, new_taxid: TaxId) -> Self {
        Self {
            old_taxid,
            new_taxid,
        }
    }
}

/// A taxid that was deleted from the taxonomy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletedTaxon {
    pub taxid: TaxId,
}

impl DeletedTaxon {
    pub fn new(taxid: TaxId) -> Self {
        Self { taxid }
    }
}

/// Everything parsed out of one taxdump
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxdumpData {
    pub names: Vec<NameEntry>,
    pub nodes: Vec<NodeEntry>,
    pub divisions: Vec<Division>,
    pub genetic_codes: Vec<GeneticCode>,
    pub merged: Vec<MergedTaxon>,
    pub deleted: Vec<DeletedTaxon>,
    /// Version label of the dump (archive date or "local")
    pub external_version: String,
}

impl TaxdumpData {
    pub fn stats(&self) -> TaxdumpStats {
        TaxdumpStats {
            names: self.names.len(),
            nodes: self.nodes.len(),
            divisions: self.divisions.len(),
            genetic_codes: self.genetic_codes.len(),
            merged: self.merged.len(),
            deleted: self.deleted.len(),
        }
    }
}

/// Line counts of a parsed taxdump
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaxdumpStats {
    pub names: usize,
    pub nodes: usize,
    pub divisions: usize,
    pub genetic_codes: usize,
    pub merged: usize,
    pub deleted: usize,
}

/// A node of the taxonomy table, with its names attached
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub taxid: TaxId,
    pub parent_taxid: TaxId,
    pub rank: String,
    pub embl_code: String,
    /// Division code resolved from the numeric division id
    pub division: String,
    pub inherited_division: bool,
    pub genetic_code: GeneticCodeId,
    pub inherited_genetic_code: bool,
    pub mitochondrial_genetic_code: GeneticCodeId,
    pub inherited_mitochondrial_genetic_code: bool,
    pub genbank_hidden: bool,
    pub hidden_subtree_root: bool,
    /// name class -> names in file order
    #[serde(default)]
    pub names: BTreeMap<String, Vec<String>>,
    /// name class -> non-empty unique names in file order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub unique_names: BTreeMap<String, Vec<String>>,
    /// Retired taxids merged into this node
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub old_taxids: Vec<TaxId>,
}

impl Node {
    /// Build a node from its nodes.dmp line and resolved division code
    pub fn from_entry(entry: &NodeEntry, division: String) -> Self {
        Self {
            taxid: entry.taxid,
            parent_taxid: entry.parent_taxid,
            rank: entry.rank.clone(),
            embl_code: entry.embl_code.clone(),
            division,
            inherited_division: entry.inherited_division,
            genetic_code: entry.genetic_code,
            inherited_genetic_code: entry.inherited_genetic_code,
            mitochondrial_genetic_code: entry.mitochondrial_genetic_code,
            inherited_mitochondrial_genetic_code: entry.inherited_mitochondrial_genetic_code,
            genbank_hidden: entry.genbank_hidden,
            hidden_subtree_root: entry.hidden_subtree_root,
            names: BTreeMap::new(),
            unique_names: BTreeMap::new(),
            old_taxids: Vec::new(),
        }
    }

    /// First name of a class
    pub fn first_name(&self, name_class: &str) -> Option<&str> {
        self.names
            .get(name_class)
            .and_then(|names| names.first())
            .map(String::as_str)
    }

    pub fn scientific_name(&self) -> Option<&str> {
        self.first_name(SCIENTIFIC_NAME)
    }

    /// Common name and whether it is the formal GenBank one
    pub fn common_name(&self) -> Option<(&str, bool)> {
        self.first_name(GENBANK_COMMON_NAME)
            .map(|name| (name, true))
            .or_else(|| self.first_name(COMMON_NAME).map(|name| (name, false)))
    }

    pub fn is_species(&self) -> bool {
        self.rank == "species"
    }

    /// The node is its own parent (the NCBI root)
    pub fn is_root(&self) -> bool {
        self.parent_taxid == self.taxid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn human_entry() -> NodeEntry {
        NodeEntry {
            taxid: 9606,
            parent_taxid: 9605,
            rank: "species".to_string(),
            embl_code: "HS".to_string(),
            division_id: 5,
            inherited_division: true,
            genetic_code: 1,
            inherited_genetic_code: true,
            mitochondrial_genetic_code: 2,
            inherited_mitochondrial_genetic_code: true,
            genbank_hidden: false,
            hidden_subtree_root: false,
        }
    }

    #[test]
    fn test_node_from_entry() {
        let node = Node::from_entry(&human_entry(), "PRI".to_string());
        assert_eq!(node.taxid, 9606);
        assert_eq!(node.parent_taxid, 9605);
        assert_eq!(node.division, "PRI");
        assert_eq!(node.mitochondrial_genetic_code, 2);
        assert!(node.is_species());
        assert!(!node.is_root());
        assert!(node.names.is_empty());
    }

    #[test]
    fn test_common_name_prefers_genbank() {
        let mut node = Node::from_entry(&human_entry(), "PRI".to_string());
        node.names.insert(COMMON_NAME.to_string(), vec!["man".to_string()]);
        assert_eq!(node.common_name(), Some(("man", false)));

        node.names.insert(GENBANK_COMMON_NAME.to_string(), vec!["human".to_string()]);
        assert_eq!(node.common_name(), Some(("human", true)));
    }

    #[test]
    fn test_scientific_name_is_first_entry() {
        let mut node = Node::from_entry(&human_entry(), "PRI".to_string());
        assert_eq!(node.scientific_name(), None);

        node.names.insert(
            SCIENTIFIC_NAME.to_string(),
            vec!["Homo sapiens".to_string(), "Homo sapiens sapiens".to_string()],
        );
        assert_eq!(node.scientific_name(), Some("Homo sapiens"));
    }

    #[test]
    fn test_node_json_omits_empty_optionals() {
        let node = Node::from_entry(&human_entry(), "PRI".to_string());
        let json = serde_json::to_string(&node).unwrap();
        assert!(!json.contains("old_taxids"));
        assert!(!json.contains("unique_names"));

        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_taxdump_stats() {
        let data = TaxdumpData {
            nodes: vec![human_entry()],
            merged: vec![MergedTaxon::new(63221, 9606)],
            deleted: vec![DeletedTaxon::new(789)],
            ..Default::default()
        };

        let stats = data.stats();
        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.merged, 1);
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.names, 0);
    }
}
