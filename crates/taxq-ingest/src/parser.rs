//! NCBI taxdump parser
//!
//! Parses the six `.dmp` files of `taxdump.tar.gz`:
//! - names.dmp: names of every node, grouped by name class
//! - nodes.dmp: tree structure, rank, division and genetic codes
//! - division.dmp: division ids, codes and names
//! - gencode.dmp: genetic code ids and names
//! - merged.dmp: retired taxids merged into current ones (old → new)
//! - delnodes.dmp: deleted taxids
//!
//! # File Format
//! Fields are separated by `\t|\t` and lines end with `\t|`. Every field is
//! trimmed of surrounding whitespace.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

use super::models::{
    DeletedTaxon, Division, GeneticCode, MergedTaxon, NameEntry, NodeEntry, TaxId, TaxdumpData,
};
use taxq_common::TaxqError;

pub const NAMES_FILE: &str = "names.dmp";
pub const NODES_FILE: &str = "nodes.dmp";
pub const DIVISION_FILE: &str = "division.dmp";
pub const GENCODE_FILE: &str = "gencode.dmp";
pub const MERGED_FILE: &str = "merged.dmp";
pub const DELNODES_FILE: &str = "delnodes.dmp";

/// Dump members needed to build the database
pub const REQUIRED_FILES: [&str; 6] = [
    NAMES_FILE,
    NODES_FILE,
    DIVISION_FILE,
    GENCODE_FILE,
    MERGED_FILE,
    DELNODES_FILE,
];

/// Raw contents of the taxdump files
#[derive(Debug, Clone, Default)]
pub struct TaxdumpFiles {
    pub names: String,
    pub nodes: String,
    pub division: String,
    pub gencode: String,
    pub merged: String,
    pub delnodes: String,
}

impl TaxdumpFiles {
    /// True when every required `.dmp` file exists in `dir`
    pub fn present_in(dir: &Path) -> bool {
        REQUIRED_FILES.iter().all(|name| dir.join(name).is_file())
    }

    /// Read the required `.dmp` files from a directory
    pub fn read_dir(dir: &Path) -> taxq_common::Result<Self> {
        let read = |name: &str| -> taxq_common::Result<String> {
            let path = dir.join(name);
            if !path.is_file() {
                return Err(TaxqError::MissingDumpFile(path.display().to_string()));
            }
            Ok(std::fs::read_to_string(path)?)
        };

        Ok(Self {
            names: read(NAMES_FILE)?,
            nodes: read(NODES_FILE)?,
            division: read(DIVISION_FILE)?,
            gencode: read(GENCODE_FILE)?,
            merged: read(MERGED_FILE)?,
            delnodes: read(DELNODES_FILE)?,
        })
    }
}

/// Split a `.dmp` line into trimmed fields, dropping the `\t|` terminator
pub fn split_fields(line: &str) -> Vec<&str> {
    let line = line.trim_end();
    let body = line.strip_suffix('|').unwrap_or(line);
    body.split('|').map(str::trim).collect()
}

fn parse_id<T: std::str::FromStr>(field: &str, what: &str, line_num: usize) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    field
        .parse()
        .with_context(|| format!("Line {}: Invalid {}: {:?}", line_num, what, field))
}

fn parse_flag(field: &str) -> bool {
    field == "1"
}

fn expect_fields(fields: &[&str], min: usize, line_num: usize) -> Result<()> {
    anyhow::ensure!(
        fields.len() >= min,
        "Line {}: Expected at least {} fields, got {}",
        line_num,
        min,
        fields.len()
    );
    Ok(())
}

/// Parser for NCBI taxdump files
pub struct TaxdumpParser {
    /// Maximum number of nodes.dmp lines to parse (None for unlimited)
    parse_limit: Option<usize>,
}

impl TaxdumpParser {
    pub fn new() -> Self {
        Self { parse_limit: None }
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            parse_limit: Some(limit),
        }
    }

    /// Parse all taxdump files
    pub fn parse(&self, files: &TaxdumpFiles, external_version: String) -> Result<TaxdumpData> {
        let data = TaxdumpData {
            names: self.parse_names(&files.names)?,
            nodes: self.parse_nodes(&files.nodes)?,
            divisions: self.parse_divisions(&files.division)?,
            genetic_codes: self.parse_gencodes(&files.gencode)?,
            merged: self.parse_merged(&files.merged)?,
            deleted: self.parse_delnodes(&files.delnodes)?,
            external_version,
        };

        debug!(stats = ?data.stats(), "Parsed taxdump");
        Ok(data)
    }

    /// Run `parse_line` over every non-empty line, warning on and skipping
    /// lines that fail
    fn parse_lines<T>(
        &self,
        content: &str,
        file: &str,
        limit: Option<usize>,
        parse_line: impl Fn(&Self, &str, usize) -> Result<T>,
    ) -> Vec<T> {
        let mut parsed = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            let line_num = idx + 1;

            if line.trim().is_empty() {
                continue;
            }

            match parse_line(self, line, line_num) {
                Ok(item) => {
                    parsed.push(item);

                    if limit.is_some_and(|limit| parsed.len() >= limit) {
                        debug!("Reached parse limit of {} lines in {}", parsed.len(), file);
                        break;
                    }
                },
                Err(e) => {
                    warn!("Failed to parse {} line {}: {} - Error: {}", file, line_num, line, e);
                },
            }
        }

        debug!("Parsed {} entries from {}", parsed.len(), file);
        parsed
    }

    /// Parse names.dmp
    ///
    /// # Format
    /// ```text
    /// tax_id | name_txt | unique name | name class |
    /// 9606 | Homo sapiens | | scientific name |
    /// ```
    pub fn parse_names(&self, content: &str) -> Result<Vec<NameEntry>> {
        Ok(self.parse_lines(content, NAMES_FILE, None, Self::parse_names_line))
    }

    pub fn parse_names_line(&self, line: &str, line_num: usize) -> Result<NameEntry> {
        let fields = split_fields(line);
        expect_fields(&fields, 4, line_num)?;

        Ok(NameEntry {
            taxid: parse_id(fields[0], "tax_id", line_num)?,
            name: fields[1].to_string(),
            unique_name: fields[2].to_string(),
            name_class: fields[3].to_string(),
        })
    }

    /// Parse nodes.dmp
    ///
    /// # Format
    /// ```text
    /// tax_id | parent | rank | embl code | division id | inherited div flag |
    /// genetic code id | inherited GC flag | mito code id | inherited MGC flag |
    /// GenBank hidden flag | hidden subtree root flag | comments |
    /// ```
    pub fn parse_nodes(&self, content: &str) -> Result<Vec<NodeEntry>> {
        Ok(self.parse_lines(content, NODES_FILE, self.parse_limit, Self::parse_nodes_line))
    }

    pub fn parse_nodes_line(&self, line: &str, line_num: usize) -> Result<NodeEntry> {
        let fields = split_fields(line);
        expect_fields(&fields, 12, line_num)?;

        Ok(NodeEntry {
            taxid: parse_id(fields[0], "tax_id", line_num)?,
            parent_taxid: parse_id(fields[1], "parent tax_id", line_num)?,
            rank: fields[2].to_string(),
            embl_code: fields[3].to_string(),
            division_id: parse_id(fields[4], "division id", line_num)?,
            inherited_division: parse_flag(fields[5]),
            genetic_code: parse_id(fields[6], "genetic code id", line_num)?,
            inherited_genetic_code: parse_flag(fields[7]),
            mitochondrial_genetic_code: parse_id(fields[8], "mitochondrial genetic code id", line_num)?,
            inherited_mitochondrial_genetic_code: parse_flag(fields[9]),
            genbank_hidden: parse_flag(fields[10]),
            hidden_subtree_root: parse_flag(fields[11]),
        })
    }

    /// Parse division.dmp
    ///
    /// # Format
    /// ```text
    /// division id | division code | division name | comments |
    /// 5 | PRI | Primates | |
    /// ```
    pub fn parse_divisions(&self, content: &str) -> Result<Vec<Division>> {
        Ok(self.parse_lines(content, DIVISION_FILE, None, Self::parse_division_line))
    }

    pub fn parse_division_line(&self, line: &str, line_num: usize) -> Result<Division> {
        let fields = split_fields(line);
        expect_fields(&fields, 3, line_num)?;

        Ok(Division {
            id: parse_id(fields[0], "division id", line_num)?,
            code: fields[1].to_string(),
            name: fields[2].to_string(),
            comments: fields.get(3).copied().unwrap_or_default().to_string(),
        })
    }

    /// Parse gencode.dmp
    ///
    /// # Format
    /// ```text
    /// genetic code id | abbreviation | name | cde | starts |
    /// 2 | | Vertebrate Mitochondrial | FFLLSS... | ---- |
    /// ```
    pub fn parse_gencodes(&self, content: &str) -> Result<Vec<GeneticCode>> {
        Ok(self.parse_lines(content, GENCODE_FILE, None, Self::parse_gencode_line))
    }

    pub fn parse_gencode_line(&self, line: &str, line_num: usize) -> Result<GeneticCode> {
        let fields = split_fields(line);
        expect_fields(&fields, 3, line_num)?;

        Ok(GeneticCode {
            id: parse_id(fields[0], "genetic code id", line_num)?,
            abbreviation: fields[1].to_string(),
            name: fields[2].to_string(),
            translation_table: fields.get(3).copied().unwrap_or_default().to_string(),
            start_codons: fields.get(4).copied().unwrap_or_default().to_string(),
        })
    }

    /// Parse merged.dmp
    ///
    /// # Format
    /// ```text
    /// old_tax_id | new_tax_id |
    /// 12 | 74109 |
    /// ```
    pub fn parse_merged(&self, content: &str) -> Result<Vec<MergedTaxon>> {
        Ok(self.parse_lines(content, MERGED_FILE, None, Self::parse_merged_line))
    }

    pub fn parse_merged_line(&self, line: &str, line_num: usize) -> Result<MergedTaxon> {
        let fields = split_fields(line);
        expect_fields(&fields, 2, line_num)?;

        let old_taxid: TaxId = parse_id(fields[0], "old_tax_id", line_num)?;
        let new_taxid: TaxId = parse_id(fields[1], "new_tax_id", line_num)?;

        Ok(MergedTaxon::new(old_taxid, new_taxid))
    }

    /// Parse delnodes.dmp
    ///
    /// # Format
    /// ```text
    /// tax_id |
    /// 3417 |
    /// ```
    pub fn parse_delnodes(&self, content: &str) -> Result<Vec<DeletedTaxon>> {
        Ok(self.parse_lines(content, DELNODES_FILE, None, Self::parse_delnodes_line))
    }

    pub fn parse_delnodes_line(&self, line: &str, line_num: usize) -> Result<DeletedTaxon> {
        let fields = split_fields(line);
        let taxid = parse_id(fields[0], "tax_id", line_num)?;
        Ok(DeletedTaxon::new(taxid))
    }
}

impl Default for TaxdumpParser {
    fn default() -> Self {
        Self::new()
    }
}
