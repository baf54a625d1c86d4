//! Lineage walker
//!
//! Follows parent links from a node up to the first superkingdom or rank-less
//! ancestor and collects the scientific names of the nodes GenBank shows.

use std::collections::HashSet;
use std::fmt;
use taxq_ingest::{TaxId, TaxonomyDatabase};
use tracing::{debug, warn};

/// Ranks that end a walk; the node holding one is not part of the lineage
pub const TERMINAL_RANKS: [&str; 2] = ["superkingdom", "no rank"];

pub fn is_terminal_rank(rank: &str) -> bool {
    let rank = rank.trim();
    TERMINAL_RANKS.iter().any(|t| rank.eq_ignore_ascii_case(t))
}

/// One emitted lineage segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageStep {
    pub taxid: TaxId,
    pub name: String,
}

/// Ancestor names from the highest ancestor down to the queried node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lineage {
    steps: Vec<LineageStep>,
}

impl Lineage {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn taxids(&self) -> Vec<TaxId> {
        self.steps.iter().map(|s| s.taxid).collect()
    }

    /// Same layout as the name form, with taxids instead of names
    pub fn id_string(&self) -> String {
        self.taxids()
            .iter()
            .map(TaxId::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, step) in self.steps.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            f.write_str(&step.name)?;
        }
        Ok(())
    }
}

pub struct LineageWalker<'a> {
    db: &'a TaxonomyDatabase,
}

impl<'a> LineageWalker<'a> {
    pub fn new(db: &'a TaxonomyDatabase) -> Self {
        Self { db }
    }

    /// Walk from `taxid` towards the root
    ///
    /// Stops at a terminal rank, at the self-parented root, at a parent id
    /// missing from the table, or when a taxid repeats.
    pub fn walk(&self, taxid: TaxId) -> Lineage {
        let mut steps = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = taxid;

        loop {
            if !visited.insert(cursor) {
                warn!(taxid, repeated = cursor, "Parent links form a cycle, lineage truncated");
                break;
            }

            let Some(node) = self.db.node(cursor) else {
                if cursor != taxid {
                    warn!(taxid, parent = cursor, "Dangling parent id, lineage truncated");
                }
                break;
            };

            if is_terminal_rank(&node.rank) {
                break;
            }

            if !node.genbank_hidden {
                match node.scientific_name() {
                    Some(name) => steps.push(LineageStep {
                        taxid: cursor,
                        name: name.to_string(),
                    }),
                    None => debug!(taxid = cursor, "Node has no scientific name"),
                }
            }

            if node.is_root() {
                break;
            }
            cursor = node.parent_taxid;
        }

        steps.reverse();
        Lineage { steps }
    }
}
