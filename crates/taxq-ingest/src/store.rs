//! Persisted lookup artifacts
//!
//! The database is written as a set of JSON files in one directory. The
//! manifest is written last, so a directory with a manifest and every file
//! it lists holds a complete build. Loading checks each file against the
//! SHA-256 the manifest recorded for it.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use taxq_common::{checksum::sha256_file, Result, TaxqError};
use tracing::{debug, info};

use super::database::{DatabaseStats, TaxonomyDatabase};
use super::models::{Division, GeneticCode, GeneticCodeId, Node, TaxId};

/// Full node table keyed by taxid
pub const NODES_ARTIFACT: &str = "db.json";
pub const NAME_INDEX_ARTIFACT: &str = "name_index.json";
pub const DIVISION_INDEX_ARTIFACT: &str = "division_index.json";
pub const GENCODE_INDEX_ARTIFACT: &str = "gencode_index.json";
pub const MITO_GENCODE_INDEX_ARTIFACT: &str = "mito_gencode_index.json";
pub const DELETED_ARTIFACT: &str = "deleted.json";
pub const MERGED_ARTIFACT: &str = "merged.json";
pub const DIVISIONS_ARTIFACT: &str = "divisions.json";
pub const GENCODES_ARTIFACT: &str = "gencodes.json";
pub const MANIFEST_ARTIFACT: &str = "manifest.json";

/// Data artifacts, in write order
pub const DATA_ARTIFACTS: [&str; 9] = [
    NODES_ARTIFACT,
    NAME_INDEX_ARTIFACT,
    DIVISION_INDEX_ARTIFACT,
    GENCODE_INDEX_ARTIFACT,
    MITO_GENCODE_INDEX_ARTIFACT,
    DELETED_ARTIFACT,
    MERGED_ARTIFACT,
    DIVISIONS_ARTIFACT,
    GENCODES_ARTIFACT,
];

/// Bumped when the artifact layout changes
pub const FORMAT_VERSION: u32 = 1;

/// Description of one build, written as `manifest.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub format_version: u32,
    pub built_at: DateTime<Utc>,
    /// Version label of the source dump
    pub source_version: String,
    pub stats: DatabaseStats,
    /// Node limit the build was parsed with, None for a full build
    #[serde(default)]
    pub parse_limit: Option<usize>,
    /// artifact file name -> SHA-256
    pub checksums: BTreeMap<String, String>,
}

impl Manifest {
    pub fn is_full_build(&self) -> bool {
        self.parse_limit.is_none()
    }
}

/// Directory of persisted artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, artifact: &str) -> PathBuf {
        self.dir.join(artifact)
    }

    /// First artifact that is not on disk
    pub fn missing_artifact(&self) -> Option<&'static str> {
        DATA_ARTIFACTS
            .iter()
            .chain(std::iter::once(&MANIFEST_ARTIFACT))
            .find(|artifact| !self.path(artifact).is_file())
            .copied()
    }

    /// True when every artifact exists
    pub fn is_complete(&self) -> bool {
        self.missing_artifact().is_none()
    }

    /// Write every artifact, manifest last
    pub fn write(
        &self,
        db: &TaxonomyDatabase,
        source_version: &str,
        parse_limit: Option<usize>,
    ) -> Result<Manifest> {
        std::fs::create_dir_all(&self.dir)?;
        // A stale manifest must not vouch for half-written files
        let manifest_path = self.path(MANIFEST_ARTIFACT);
        if manifest_path.exists() {
            std::fs::remove_file(&manifest_path)?;
        }

        info!(dir = %self.dir.display(), "Writing taxonomy artifacts");

        let nodes: BTreeMap<TaxId, &Node> = db.nodes.iter().map(|(id, n)| (*id, n)).collect();
        self.write_json(NODES_ARTIFACT, &nodes)?;

        let name_index: BTreeMap<&String, &TaxId> = db.name_index.iter().collect();
        self.write_json(NAME_INDEX_ARTIFACT, &name_index)?;

        let division_index: BTreeMap<&String, &Vec<TaxId>> = db.division_index.iter().collect();
        self.write_json(DIVISION_INDEX_ARTIFACT, &division_index)?;

        let gencode_index: BTreeMap<&GeneticCodeId, &Vec<TaxId>> =
            db.gencode_index.iter().collect();
        self.write_json(GENCODE_INDEX_ARTIFACT, &gencode_index)?;

        let mito_gencode_index: BTreeMap<&GeneticCodeId, &Vec<TaxId>> =
            db.mito_gencode_index.iter().collect();
        self.write_json(MITO_GENCODE_INDEX_ARTIFACT, &mito_gencode_index)?;

        let mut deleted: Vec<TaxId> = db.deleted.iter().copied().collect();
        deleted.sort_unstable();
        self.write_json(DELETED_ARTIFACT, &deleted)?;

        let merged: BTreeMap<&TaxId, &TaxId> = db.merged.iter().collect();
        self.write_json(MERGED_ARTIFACT, &merged)?;

        self.write_json(DIVISIONS_ARTIFACT, &db.divisions)?;
        self.write_json(GENCODES_ARTIFACT, &db.genetic_codes)?;

        let mut checksums = BTreeMap::new();
        for artifact in DATA_ARTIFACTS {
            checksums.insert(artifact.to_string(), sha256_file(self.path(artifact))?);
        }

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            built_at: Utc::now(),
            source_version: source_version.to_string(),
            stats: db.stats(),
            parse_limit,
            checksums,
        };
        self.write_json(MANIFEST_ARTIFACT, &manifest)?;

        info!(stats = ?manifest.stats, "Taxonomy artifacts written");
        Ok(manifest)
    }

    /// Read the manifest of the current build
    pub fn manifest(&self) -> Result<Manifest> {
        self.read_json(MANIFEST_ARTIFACT)
    }

    /// Load the database from the artifacts
    pub fn load(&self) -> Result<TaxonomyDatabase> {
        if let Some(missing) = self.missing_artifact() {
            return Err(TaxqError::MissingArtifact(self.path(missing).display().to_string()));
        }

        let manifest = self.manifest()?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(TaxqError::config(format!(
                "artifacts in {} use format {}, expected {}; rebuild them",
                self.dir.display(),
                manifest.format_version,
                FORMAT_VERSION
            )));
        }

        self.verify_checksums(&manifest)?;

        info!(dir = %self.dir.display(), version = %manifest.source_version, "Loading taxonomy artifacts");

        let nodes: HashMap<TaxId, Node> = self.read_json(NODES_ARTIFACT)?;
        let name_index: HashMap<String, TaxId> = self.read_json(NAME_INDEX_ARTIFACT)?;
        let division_index: HashMap<String, Vec<TaxId>> =
            self.read_json(DIVISION_INDEX_ARTIFACT)?;
        let gencode_index: HashMap<GeneticCodeId, Vec<TaxId>> =
            self.read_json(GENCODE_INDEX_ARTIFACT)?;
        let mito_gencode_index: HashMap<GeneticCodeId, Vec<TaxId>> =
            self.read_json(MITO_GENCODE_INDEX_ARTIFACT)?;
        let deleted: HashSet<TaxId> = self.read_json(DELETED_ARTIFACT)?;
        let merged: HashMap<TaxId, TaxId> = self.read_json(MERGED_ARTIFACT)?;
        let divisions: Vec<Division> = self.read_json(DIVISIONS_ARTIFACT)?;
        let genetic_codes: Vec<GeneticCode> = self.read_json(GENCODES_ARTIFACT)?;

        let db = TaxonomyDatabase::assemble(
            nodes,
            name_index,
            division_index,
            gencode_index,
            mito_gencode_index,
            merged,
            deleted,
            divisions,
            genetic_codes,
        );

        debug!(stats = ?db.stats(), "Taxonomy database loaded");
        Ok(db)
    }

    /// Compare every data artifact with the checksum in `manifest`
    pub fn verify_checksums(&self, manifest: &Manifest) -> Result<()> {
        for artifact in DATA_ARTIFACTS {
            let path = self.path(artifact);
            let expected = manifest
                .checksums
                .get(artifact)
                .map(String::as_str)
                .unwrap_or_default();
            let actual = sha256_file(&path)?;

            if actual != expected {
                return Err(TaxqError::ChecksumMismatch {
                    file: path.display().to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        debug!(dir = %self.dir.display(), "Artifact checksums verified");
        Ok(())
    }

    fn write_json<T: Serialize + ?Sized>(&self, artifact: &str, value: &T) -> Result<()> {
        let path = self.path(artifact);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
        debug!(path = %path.display(), "Wrote artifact");
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, artifact: &str) -> Result<T> {
        let path = self.path(artifact);
        let file = File::open(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TaxqError::MissingArtifact(path.display().to_string()),
            _ => TaxqError::Io(e),
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DeletedTaxon, MergedTaxon, NameEntry, NodeEntry, TaxdumpData, SCIENTIFIC_NAME,
    };

    fn tiny_db() -> TaxonomyDatabase {
        let node = |taxid, parent| NodeEntry {
            taxid,
            parent_taxid: parent,
            rank: "species".to_string(),
            embl_code: String::new(),
            division_id: 5,
            inherited_division: false,
            genetic_code: 1,
            inherited_genetic_code: false,
            mitochondrial_genetic_code: 2,
            inherited_mitochondrial_genetic_code: false,
            genbank_hidden: false,
            hidden_subtree_root: false,
        };

        TaxonomyDatabase::build(TaxdumpData {
            names: vec![NameEntry {
                taxid: 9606,
                name: "Homo sapiens".to_string(),
                unique_name: String::new(),
                name_class: SCIENTIFIC_NAME.to_string(),
            }],
            nodes: vec![node(9606, 9605), node(9598, 9596)],
            divisions: vec![Division {
                id: 5,
                code: "PRI".to_string(),
                name: "Primates".to_string(),
                comments: String::new(),
            }],
            genetic_codes: vec![GeneticCode {
                id: 2,
                abbreviation: String::new(),
                name: "Vertebrate Mitochondrial".to_string(),
                translation_table: String::new(),
                start_codons: String::new(),
            }],
            merged: vec![MergedTaxon::new(63221, 9606)],
            deleted: vec![DeletedTaxon::new(3417)],
            external_version: "2026-10-01".to_string(),
        })
    }

    #[test]
    fn test_empty_dir_is_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        assert!(!store.is_complete());
        assert_eq!(store.missing_artifact(), Some(NODES_ARTIFACT));
        assert!(matches!(store.load(), Err(TaxqError::MissingArtifact(_))));
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("db"));
        let db = tiny_db();

        let manifest = store.write(&db, "2026-10-01", None).unwrap();
        assert!(store.is_complete());
        assert_eq!(manifest.source_version, "2026-10-01");
        assert_eq!(manifest.stats, db.stats());
        assert_eq!(manifest.checksums.len(), DATA_ARTIFACTS.len());
        assert!(manifest.is_full_build());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.stats(), db.stats());
        assert_eq!(loaded.node(9606), db.node(9606));
        assert_eq!(loaded.taxid_for_name("homo sapiens"), Some(9606));
        assert_eq!(loaded.division_members("PRI"), &[9598, 9606]);
        assert_eq!(loaded.genetic_code_members(2), vec![9598, 9606]);
        assert_eq!(loaded.genetic_code_id("vertebrate mitochondrial"), Some(2));
        assert_eq!(loaded.division_code("primates"), Some("PRI"));
        assert_eq!(loaded.merged_into(63221), Some(9606));
        assert!(loaded.is_deleted(3417));
    }

    #[test]
    fn test_missing_file_marks_store_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.write(&tiny_db(), "local", None).unwrap();

        std::fs::remove_file(dir.path().join(MERGED_ARTIFACT)).unwrap();

        assert!(!store.is_complete());
        assert_eq!(store.missing_artifact(), Some(MERGED_ARTIFACT));
    }

    #[test]
    fn test_manifest_checksums_match_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let manifest = store.write(&tiny_db(), "local", None).unwrap();

        let on_disk = sha256_file(dir.path().join(NODES_ARTIFACT)).unwrap();
        assert_eq!(manifest.checksums[NODES_ARTIFACT], on_disk);
        assert_eq!(store.manifest().unwrap(), manifest);
    }

    #[test]
    fn test_load_rejects_tampered_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.write(&tiny_db(), "local", None).unwrap();

        std::fs::write(dir.path().join(MERGED_ARTIFACT), "{}").unwrap();

        assert!(store.is_complete());
        match store.load() {
            Err(TaxqError::ChecksumMismatch { file, .. }) => {
                assert!(file.ends_with(MERGED_ARTIFACT))
            },
            other => panic!("expected checksum mismatch, got {:?}", other.map(|db| db.stats())),
        }
    }

    #[test]
    fn test_manifest_records_parse_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let manifest = store.write(&tiny_db(), "local", Some(1)).unwrap();
        assert_eq!(manifest.parse_limit, Some(1));
        assert!(!manifest.is_full_build());
        assert!(!store.manifest().unwrap().is_full_build());
    }
}
