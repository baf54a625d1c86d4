//! Taxonomy build pipeline
//!
//! Turns a dump directory into persisted lookup artifacts, fetching the dump
//! first when asked to.

use anyhow::{Context, Result};
use serde::Serialize;
use taxq_common::TaxqError;
use tracing::{info, warn};

use super::config::TaxqConfig;
use super::database::TaxonomyDatabase;
use super::fetch::{recorded_version, FetchSummary, TaxdumpFetcher};
use super::parser::{TaxdumpFiles, TaxdumpParser};
use super::progress::create_spinner;
use super::store::{ArtifactStore, Manifest};

/// Version label used when the dump directory has no fetch record
pub const LOCAL_VERSION: &str = "local";

/// Outcome of a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// Set when the run downloaded a fresh dump
    pub fetched_version: Option<String>,
    /// Manifest of the artifacts written, None when the build was skipped
    pub manifest: Option<Manifest>,
    pub skipped: bool,
}

/// Dump-to-artifacts pipeline
pub struct TaxonomyPipeline {
    config: TaxqConfig,
}

impl TaxonomyPipeline {
    pub fn new(config: TaxqConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TaxqConfig {
        &self.config
    }

    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.config.data_dir)
    }

    /// Build the artifacts from the dump directory
    ///
    /// Skips the build when a complete artifact set from a full build
    /// exists, unless `force`.
    pub fn run_build(&self, force: bool) -> Result<PipelineResult> {
        let store = self.store();

        if !force && store.is_complete() && store.manifest().is_ok_and(|m| m.is_full_build()) {
            info!(dir = %store.dir().display(), "Artifacts already built, skipping");
            return Ok(PipelineResult {
                fetched_version: None,
                manifest: None,
                skipped: true,
            });
        }

        let (_, manifest) = self.build_database()?;

        Ok(PipelineResult {
            fetched_version: None,
            manifest: Some(manifest),
            skipped: false,
        })
    }

    /// Download the dump into the dump directory
    pub async fn run_fetch(&self) -> Result<FetchSummary> {
        info!("Phase 1: Downloading taxdump");
        let fetcher = TaxdumpFetcher::new(self.config.clone())?;
        fetcher
            .fetch(&self.config.dump_dir)
            .await
            .context("Failed to download taxdump")
    }

    /// Download the dump and rebuild the artifacts from it
    pub async fn run_fetch_and_build(&self) -> Result<PipelineResult> {
        let summary = self.run_fetch().await?;
        let (_, manifest) = self.build_database()?;

        Ok(PipelineResult {
            fetched_version: Some(summary.external_version),
            manifest: Some(manifest),
            skipped: false,
        })
    }

    /// Load the database, rebuilding it when artifacts are missing or fail
    /// their checksums
    ///
    /// A missing dump is downloaded unless `auto_fetch` is turned off.
    pub async fn open_or_rebuild(&self) -> Result<TaxonomyDatabase> {
        let store = self.store();

        if let Some(missing) = store.missing_artifact() {
            info!(artifact = missing, "Taxonomy artifacts incomplete, rebuilding");
            return self.rebuild().await;
        }

        let loaded = tokio::task::spawn_blocking(move || store.load())
            .await
            .context("Load task panicked")?;

        match loaded {
            Ok(db) => Ok(db),
            Err(TaxqError::ChecksumMismatch { file, .. }) => {
                info!(file = %file, "Taxonomy artifact changed since build, rebuilding");
                self.rebuild().await
            },
            Err(e) => Err(e).context("Failed to load taxonomy artifacts"),
        }
    }

    async fn rebuild(&self) -> Result<TaxonomyDatabase> {
        if !TaxdumpFiles::present_in(&self.config.dump_dir) {
            if !self.config.auto_fetch {
                return Err(TaxqError::MissingDumpFile(format!(
                    "no taxdump in {}",
                    self.config.dump_dir.display()
                ))
                .into());
            }
            self.run_fetch().await?;
        }

        let pipeline = Self::new(self.config.clone());
        let (db, _) = tokio::task::spawn_blocking(move || pipeline.build_database())
            .await
            .context("Build task panicked")??;
        Ok(db)
    }

    fn build_database(&self) -> Result<(TaxonomyDatabase, Manifest)> {
        let dump_dir = &self.config.dump_dir;
        let version = recorded_version(dump_dir).unwrap_or_else(|| LOCAL_VERSION.to_string());
        info!(dump_dir = %dump_dir.display(), version = %version, "Building taxonomy database");

        info!("Phase 2: Parsing taxdump files");
        let files = TaxdumpFiles::read_dir(dump_dir)?;
        let parser = if let Some(limit) = self.config.parse_limit {
            warn!(limit = limit, "Parse limit is set, will only process {} nodes", limit);
            TaxdumpParser::with_limit(limit)
        } else {
            TaxdumpParser::new()
        };

        let spinner = create_spinner("Parsing taxdump");
        let data = parser
            .parse(&files, version.clone())
            .context("Failed to parse taxdump")?;
        drop(files);

        info!(stats = ?data.stats(), "Parsed taxdump");

        info!("Phase 3: Building lookup tables");
        spinner.set_message("Building lookup tables");
        let db = TaxonomyDatabase::build(data);

        info!("Phase 4: Writing artifacts");
        spinner.set_message("Writing artifacts");
        let manifest = self
            .store()
            .write(&db, &version, self.config.parse_limit)
            .context("Failed to write taxonomy artifacts")?;
        spinner.finish_and_clear();

        info!(
            nodes = manifest.stats.nodes,
            names = manifest.stats.indexed_names,
            merged = manifest.stats.merged,
            deleted = manifest.stats.deleted,
            "Build completed"
        );

        Ok((db, manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_dump(dir: &Path) {
        let files = [
            ("names.dmp", "1\t|\troot\t|\t\t|\tscientific name\t|\n2\t|\tBacteria\t|\tBacteria <bacteria>\t|\tscientific name\t|\n"),
            ("nodes.dmp", "1\t|\t1\t|\tno rank\t|\t\t|\t8\t|\t0\t|\t1\t|\t0\t|\t0\t|\t0\t|\t0\t|\t0\t|\t\t|\n2\t|\t1\t|\tsuperkingdom\t|\t\t|\t0\t|\t0\t|\t11\t|\t0\t|\t0\t|\t0\t|\t0\t|\t0\t|\t\t|\n"),
            ("division.dmp", "0\t|\tBCT\t|\tBacteria\t|\t\t|\n8\t|\tUNA\t|\tUnassigned\t|\t\t|\n"),
            ("gencode.dmp", "1\t|\t\t|\tStandard\t|\t\t|\t\t|\n11\t|\t\t|\tBacterial, Archaeal and Plant Plastid\t|\t\t|\t\t|\n"),
            ("merged.dmp", ""),
            ("delnodes.dmp", ""),
        ];
        for (name, content) in files {
            std::fs::write(dir.join(name), content).unwrap();
        }
    }

    fn config(root: &Path) -> TaxqConfig {
        TaxqConfig::new()
            .with_dump_dir(root.join("dump"))
            .with_data_dir(root.join("db"))
    }

    #[test]
    fn test_run_build_then_skip() {
        let root = tempfile::tempdir().unwrap();
        let config = config(root.path());
        std::fs::create_dir_all(&config.dump_dir).unwrap();
        write_dump(&config.dump_dir);

        let pipeline = TaxonomyPipeline::new(config);
        let first = pipeline.run_build(false).unwrap();
        assert!(!first.skipped);
        let manifest = first.manifest.unwrap();
        assert_eq!(manifest.stats.nodes, 2);
        assert_eq!(manifest.source_version, LOCAL_VERSION);

        let second = pipeline.run_build(false).unwrap();
        assert!(second.skipped);

        let forced = pipeline.run_build(true).unwrap();
        assert!(!forced.skipped);
    }

    #[tokio::test]
    async fn test_open_or_rebuild_builds_missing_artifacts() {
        let root = tempfile::tempdir().unwrap();
        let config = config(root.path());
        std::fs::create_dir_all(&config.dump_dir).unwrap();
        write_dump(&config.dump_dir);

        let pipeline = TaxonomyPipeline::new(config);
        assert!(!pipeline.store().is_complete());

        let db = pipeline.open_or_rebuild().await.unwrap();
        assert_eq!(db.scientific_name(2), Some("Bacteria"));
        assert!(pipeline.store().is_complete());

        let reopened = pipeline.open_or_rebuild().await.unwrap();
        assert_eq!(reopened.division_members("BCT"), &[2]);
    }

    #[tokio::test]
    async fn test_open_or_rebuild_without_dump() {
        let root = tempfile::tempdir().unwrap();
        let pipeline = TaxonomyPipeline::new(config(root.path()).with_auto_fetch(false));

        let err = pipeline.open_or_rebuild().await.unwrap_err();
        assert!(err.to_string().contains("no taxdump"));
    }

    #[test]
    fn test_limited_build_is_not_skipped() {
        let root = tempfile::tempdir().unwrap();
        let config = config(root.path());
        std::fs::create_dir_all(&config.dump_dir).unwrap();
        write_dump(&config.dump_dir);

        let limited = TaxonomyPipeline::new(config.clone().with_parse_limit(1));
        let manifest = limited.run_build(false).unwrap().manifest.unwrap();
        assert_eq!(manifest.parse_limit, Some(1));
        assert_eq!(manifest.stats.nodes, 1);

        let full = TaxonomyPipeline::new(config);
        let rebuilt = full.run_build(false).unwrap();
        assert!(!rebuilt.skipped);
        assert_eq!(rebuilt.manifest.unwrap().stats.nodes, 2);

        assert!(full.run_build(false).unwrap().skipped);
    }

    #[tokio::test]
    async fn test_open_or_rebuild_replaces_tampered_artifacts() {
        let root = tempfile::tempdir().unwrap();
        let config = config(root.path());
        std::fs::create_dir_all(&config.dump_dir).unwrap();
        write_dump(&config.dump_dir);

        let pipeline = TaxonomyPipeline::new(config.with_auto_fetch(false));
        pipeline.run_build(false).unwrap();
        let index = pipeline.store().dir().join(crate::store::DIVISION_INDEX_ARTIFACT);
        std::fs::write(&index, "{}").unwrap();

        let db = pipeline.open_or_rebuild().await.unwrap();
        assert_eq!(db.division_members("BCT"), &[2]);

        let manifest = pipeline.store().manifest().unwrap();
        pipeline.store().verify_checksums(&manifest).unwrap();
    }
}
