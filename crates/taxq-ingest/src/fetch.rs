//! Taxdump download and extraction

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tar::Archive;
use taxq_common::checksum::{parse_md5_sidecar, verify_md5};
use taxq_common::TaxqError;
use tracing::{debug, info, warn};

use super::config::TaxqConfig;
use super::parser::REQUIRED_FILES;
use super::progress::{create_download_progress, format_bytes};

/// Attempts per request before giving up
pub const MAX_RETRIES: u32 = 3;

/// Base delay between attempts; attempt `n` waits `n` times this
pub const RETRY_DELAY_SECS: u64 = 5;

/// File in the dump directory recording which dump it holds
pub const VERSION_FILE: &str = "taxdump.version";

/// Result of a fetch
#[derive(Debug, Clone)]
pub struct FetchSummary {
    /// Dump date (from Last-Modified, else the download date)
    pub external_version: String,
    pub archive_bytes: usize,
    pub files: Vec<PathBuf>,
}

/// HTTP client for NCBI taxdump archives
pub struct TaxdumpFetcher {
    config: TaxqConfig,
    client: reqwest::Client,
}

impl TaxdumpFetcher {
    pub fn new(config: TaxqConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { config, client })
    }

    /// Download, verify and extract the taxdump into `dump_dir`
    pub async fn fetch(&self, dump_dir: &Path) -> Result<FetchSummary> {
        let checksum_url = self.config.checksum_url();
        info!(url = %checksum_url, "Fetching taxdump checksum");
        let sidecar = self
            .get_with_retry(&checksum_url)
            .await?
            .text()
            .await
            .context("Failed to read checksum body")?;
        let expected_md5 = parse_md5_sidecar(&sidecar)?;

        let (archive, external_version) = self.download_archive().await?;

        verify_md5(&self.config.taxdump_url, &archive, &expected_md5)?;
        debug!(md5 = %expected_md5, "Archive checksum verified");

        info!("Extracting taxdump into {}", dump_dir.display());
        let dest = dump_dir.to_path_buf();
        let archive_bytes = archive.len();
        let files = tokio::task::spawn_blocking(move || extract_taxdump(&archive, &dest))
            .await
            .context("Extraction task panicked")??;

        std::fs::write(dump_dir.join(VERSION_FILE), &external_version)
            .with_context(|| format!("Failed to write {}", VERSION_FILE))?;

        info!(version = %external_version, files = files.len(), "Taxdump ready");

        Ok(FetchSummary {
            external_version,
            archive_bytes,
            files,
        })
    }

    async fn download_archive(&self) -> Result<(Vec<u8>, String)> {
        let url = &self.config.taxdump_url;
        info!(url = %url, "Downloading taxdump archive");

        let mut response = self.get_with_retry(url).await?;

        let external_version = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now)
            .format("%Y-%m-%d")
            .to_string();

        let pb = create_download_progress(response.content_length(), "Downloading taxdump.tar.gz");
        let mut data = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read archive body")?
        {
            data.extend_from_slice(&chunk);
            pb.inc(chunk.len() as u64);
        }
        pb.finish_and_clear();

        info!(
            size = %format_bytes(data.len() as u64),
            version = %external_version,
            "Downloaded taxdump archive"
        );

        Ok((data, external_version))
    }

    /// GET with retries on transport errors and server errors; client errors
    /// fail at once
    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response> {
        let mut attempt = 1;

        loop {
            debug!("Request attempt {}/{} for: {}", attempt, MAX_RETRIES, url);

            let failure = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) if response.status().is_client_error() => {
                    return Err(TaxqError::Network(format!(
                        "GET {} returned {}",
                        url,
                        response.status()
                    ))
                    .into());
                },
                Ok(response) => format!("server returned {}", response.status()),
                Err(e) => e.to_string(),
            };

            if attempt >= MAX_RETRIES {
                return Err(TaxqError::Network(format!(
                    "GET {} failed after {} attempts: {}",
                    url, MAX_RETRIES, failure
                ))
                .into());
            }

            warn!(
                "Attempt {}/{} failed: {}. Retrying in {}s...",
                attempt,
                MAX_RETRIES,
                failure,
                RETRY_DELAY_SECS * attempt as u64
            );
            tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECS * attempt as u64)).await;
            attempt += 1;
        }
    }
}

/// Version label recorded by the last fetch into `dump_dir`, if any
pub fn recorded_version(dump_dir: &Path) -> Option<String> {
    std::fs::read_to_string(dump_dir.join(VERSION_FILE))
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Extract the required `.dmp` members of a taxdump `.tar.gz` into `dest`
pub fn extract_taxdump(compressed: &[u8], dest: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?;

    let mut archive = Archive::new(GzDecoder::new(compressed));
    let mut extracted = Vec::new();

    for entry in archive.entries().context("Failed to read tar archive")? {
        let mut entry = entry.context("Failed to read tar entry")?;
        let path = entry.path().context("Failed to get entry path")?;
        let Some(filename) = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
        else {
            continue;
        };

        if !REQUIRED_FILES.contains(&filename.as_str()) {
            debug!("Skipping file: {}", filename);
            continue;
        }

        let target = dest.join(&filename);
        entry
            .unpack(&target)
            .with_context(|| format!("Failed to extract {}", filename))?;
        debug!("Extracted {} ({} bytes)", filename, entry.size());
        extracted.push(target);
    }

    for required in REQUIRED_FILES {
        anyhow::ensure!(
            extracted.iter().any(|p| p.ends_with(required)),
            "{} not found in archive",
            required
        );
    }

    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};

    fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, content.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_extract_taxdump() {
        let mut files: Vec<(&str, &str)> = REQUIRED_FILES.iter().map(|f| (*f, "1\t|\n")).collect();
        files.push(("gc.prt", "ignored"));
        let archive = tarball(&files);

        let dir = tempfile::tempdir().unwrap();
        let extracted = extract_taxdump(&archive, dir.path()).unwrap();

        assert_eq!(extracted.len(), REQUIRED_FILES.len());
        assert!(dir.path().join("nodes.dmp").is_file());
        assert!(!dir.path().join("gc.prt").exists());
    }

    #[test]
    fn test_extract_taxdump_nested_members() {
        let files: Vec<(String, &str)> = REQUIRED_FILES
            .iter()
            .map(|f| (format!("taxdump/{}", f), "1\t|\n"))
            .collect();
        let refs: Vec<(&str, &str)> = files.iter().map(|(n, c)| (n.as_str(), *c)).collect();
        let archive = tarball(&refs);

        let dir = tempfile::tempdir().unwrap();
        let extracted = extract_taxdump(&archive, dir.path()).unwrap();

        assert_eq!(extracted.len(), REQUIRED_FILES.len());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("merged.dmp")).unwrap(),
            "1\t|\n"
        );
    }

    #[test]
    fn test_extract_taxdump_missing_member() {
        let archive = tarball(&[("names.dmp", ""), ("nodes.dmp", "")]);
        let dir = tempfile::tempdir().unwrap();

        let err = extract_taxdump(&archive, dir.path()).unwrap_err();
        assert!(err.to_string().contains("division.dmp"));
    }

    #[test]
    fn test_recorded_version() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(recorded_version(dir.path()), None);

        std::fs::write(dir.path().join(VERSION_FILE), "2026-10-01\n").unwrap();
        assert_eq!(recorded_version(dir.path()), Some("2026-10-01".to_string()));
    }
}
