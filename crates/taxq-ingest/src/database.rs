//! In-memory taxonomy database
//!
//! [`TaxonomyDatabase::build`] turns a parsed taxdump into the node table and
//! its lookup indices in one pass. The result is never mutated afterwards;
//! query code holds it by shared reference.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

use super::models::{
    Division, GeneticCode, GeneticCodeId, Node, TaxId, TaxdumpData, COMMON_NAME,
    GENBANK_COMMON_NAME, SCIENTIFIC_NAME,
};

/// Normalize a name or code for index lookup: drop whitespace, uppercase
pub fn normalize_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Lower value wins when two taxa share a normalized name
fn name_priority(name_class: &str) -> u8 {
    match name_class {
        SCIENTIFIC_NAME => 0,
        GENBANK_COMMON_NAME | COMMON_NAME => 1,
        _ => 2,
    }
}

/// Row counts of a built database
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseStats {
    pub nodes: usize,
    pub indexed_names: usize,
    pub divisions: usize,
    pub genetic_codes: usize,
    pub merged: usize,
    pub deleted: usize,
}

/// Node table plus lookup indices
#[derive(Debug, Clone, Default)]
pub struct TaxonomyDatabase {
    pub(crate) nodes: HashMap<TaxId, Node>,
    /// normalized name -> taxid
    pub(crate) name_index: HashMap<String, TaxId>,
    /// division code -> taxids
    pub(crate) division_index: HashMap<String, Vec<TaxId>>,
    /// nuclear genetic code -> taxids
    pub(crate) gencode_index: HashMap<GeneticCodeId, Vec<TaxId>>,
    /// mitochondrial genetic code -> taxids
    pub(crate) mito_gencode_index: HashMap<GeneticCodeId, Vec<TaxId>>,
    /// old taxid -> new taxid
    pub(crate) merged: HashMap<TaxId, TaxId>,
    pub(crate) deleted: HashSet<TaxId>,
    pub(crate) divisions: Vec<Division>,
    pub(crate) genetic_codes: Vec<GeneticCode>,
    /// normalized division code or name -> division code
    division_lookup: HashMap<String, String>,
    /// normalized genetic code name or abbreviation -> id
    gencode_lookup: HashMap<String, GeneticCodeId>,
}

impl TaxonomyDatabase {
    /// Build the database from a parsed taxdump
    pub fn build(data: TaxdumpData) -> Self {
        info!(stats = ?data.stats(), "Building taxonomy database");

        let deleted: HashSet<TaxId> = data.deleted.iter().map(|d| d.taxid).collect();

        let division_codes: HashMap<u32, &str> =
            data.divisions.iter().map(|d| (d.id, d.code.as_str())).collect();

        let mut nodes = HashMap::with_capacity(data.nodes.len());
        let mut division_index: HashMap<String, Vec<TaxId>> = HashMap::new();
        let mut gencode_index: HashMap<GeneticCodeId, Vec<TaxId>> = HashMap::new();
        let mut mito_gencode_index: HashMap<GeneticCodeId, Vec<TaxId>> = HashMap::new();

        for entry in &data.nodes {
            if deleted.contains(&entry.taxid) {
                debug!(taxid = entry.taxid, "Skipping deleted node");
                continue;
            }

            let division = match division_codes.get(&entry.division_id) {
                Some(code) => (*code).to_string(),
                None => {
                    warn!(
                        taxid = entry.taxid,
                        division_id = entry.division_id,
                        "Unknown division id"
                    );
                    entry.division_id.to_string()
                },
            };

            division_index
                .entry(division.clone())
                .or_default()
                .push(entry.taxid);
            gencode_index
                .entry(entry.genetic_code)
                .or_default()
                .push(entry.taxid);
            mito_gencode_index
                .entry(entry.mitochondrial_genetic_code)
                .or_default()
                .push(entry.taxid);

            nodes.insert(entry.taxid, Node::from_entry(entry, division));
        }

        let mut ranked_names: HashMap<String, (TaxId, u8)> = HashMap::new();
        let mut orphan_names = 0usize;

        for name in &data.names {
            let Some(node) = nodes.get_mut(&name.taxid) else {
                orphan_names += 1;
                continue;
            };

            node.names
                .entry(name.name_class.clone())
                .or_default()
                .push(name.name.clone());
            index_name(&mut ranked_names, &name.name, name.taxid, name_priority(&name.name_class));

            if !name.unique_name.is_empty() {
                node.unique_names
                    .entry(name.name_class.clone())
                    .or_default()
                    .push(name.unique_name.clone());
                index_name(&mut ranked_names, &name.unique_name, name.taxid, 0);
            }
        }

        if orphan_names > 0 {
            debug!(count = orphan_names, "Names without a node were ignored");
        }

        let mut merged = HashMap::with_capacity(data.merged.len());
        for m in &data.merged {
            if let Some(node) = nodes.get_mut(&m.new_taxid) {
                node.old_taxids.push(m.old_taxid);
            }
            merged.insert(m.old_taxid, m.new_taxid);
        }

        for members in division_index
            .values_mut()
            .chain(gencode_index.values_mut())
            .chain(mito_gencode_index.values_mut())
        {
            members.sort_unstable();
        }

        let name_index = ranked_names
            .into_iter()
            .map(|(name, (taxid, _))| (name, taxid))
            .collect();

        let db = Self::assemble(
            nodes,
            name_index,
            division_index,
            gencode_index,
            mito_gencode_index,
            merged,
            deleted,
            data.divisions,
            data.genetic_codes,
        );

        info!(stats = ?db.stats(), "Taxonomy database built");
        db
    }

    /// Put the tables together and derive the division / genetic code
    /// lookups from their lists
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        nodes: HashMap<TaxId, Node>,
        name_index: HashMap<String, TaxId>,
        division_index: HashMap<String, Vec<TaxId>>,
        gencode_index: HashMap<GeneticCodeId, Vec<TaxId>>,
        mito_gencode_index: HashMap<GeneticCodeId, Vec<TaxId>>,
        merged: HashMap<TaxId, TaxId>,
        deleted: HashSet<TaxId>,
        divisions: Vec<Division>,
        genetic_codes: Vec<GeneticCode>,
    ) -> Self {
        let mut division_lookup = HashMap::new();
        for division in &divisions {
            division_lookup.insert(normalize_key(&division.code), division.code.clone());
            division_lookup
                .entry(normalize_key(&division.name))
                .or_insert_with(|| division.code.clone());
        }

        let mut gencode_lookup = HashMap::new();
        for code in &genetic_codes {
            gencode_lookup.insert(normalize_key(&code.name), code.id);
            if !code.abbreviation.is_empty() {
                gencode_lookup
                    .entry(normalize_key(&code.abbreviation))
                    .or_insert(code.id);
            }
        }
        division_lookup.remove("");
        gencode_lookup.remove("");

        Self {
            nodes,
            name_index,
            division_index,
            gencode_index,
            mito_gencode_index,
            merged,
            deleted,
            divisions,
            genetic_codes,
            division_lookup,
            gencode_lookup,
        }
    }

    pub fn node(&self, taxid: TaxId) -> Option<&Node> {
        self.nodes.get(&taxid)
    }

    pub fn scientific_name(&self, taxid: TaxId) -> Option<&str> {
        self.node(taxid).and_then(Node::scientific_name)
    }

    /// Taxid registered for a name (any class, normalized)
    pub fn taxid_for_name(&self, name: &str) -> Option<TaxId> {
        self.name_index.get(&normalize_key(name)).copied()
    }

    /// Division code for a division code or name
    pub fn division_code(&self, token: &str) -> Option<&str> {
        self.division_lookup
            .get(&normalize_key(token))
            .map(String::as_str)
    }

    /// Genetic code id for a genetic code name or abbreviation
    pub fn genetic_code_id(&self, token: &str) -> Option<GeneticCodeId> {
        self.gencode_lookup.get(&normalize_key(token)).copied()
    }

    /// Taxids in a division, sorted
    pub fn division_members(&self, code: &str) -> &[TaxId] {
        self.division_index
            .get(code)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Taxids using a genetic code for either the nuclear or the
    /// mitochondrial genome, sorted and deduplicated
    pub fn genetic_code_members(&self, id: GeneticCodeId) -> Vec<TaxId> {
        let nuclear = self.gencode_index.get(&id).into_iter().flatten();
        let mitochondrial = self.mito_gencode_index.get(&id).into_iter().flatten();

        nuclear
            .chain(mitochondrial)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// New taxid for a merged one
    pub fn merged_into(&self, old_taxid: TaxId) -> Option<TaxId> {
        self.merged.get(&old_taxid).copied()
    }

    pub fn is_deleted(&self, taxid: TaxId) -> bool {
        self.deleted.contains(&taxid)
    }

    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            nodes: self.nodes.len(),
            indexed_names: self.name_index.len(),
            divisions: self.divisions.len(),
            genetic_codes: self.genetic_codes.len(),
            merged: self.merged.len(),
            deleted: self.deleted.len(),
        }
    }
}

fn index_name(index: &mut HashMap<String, (TaxId, u8)>, name: &str, taxid: TaxId, priority: u8) {
    let key = normalize_key(name);
    if key.is_empty() {
        return;
    }

    match index.get(&key) {
        Some(&(_, existing)) if existing <= priority => {},
        _ => {
            index.insert(key, (taxid, priority));
        },
    }
}
