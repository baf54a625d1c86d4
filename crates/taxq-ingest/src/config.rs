//! Loader configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use taxq_common::TaxqError;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default directory holding the persisted lookup artifacts.
pub const DEFAULT_DATA_DIR: &str = "./ncbi_tax/db";

/// Default directory holding the extracted `.dmp` files.
pub const DEFAULT_DUMP_DIR: &str = "./ncbi_tax";

/// NCBI taxonomy dump archive.
pub const DEFAULT_TAXDUMP_URL: &str = "https://ftp.ncbi.nlm.nih.gov/pub/taxonomy/taxdump.tar.gz";

/// Default HTTP request timeout in seconds (the archive is ~60 MB).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 1800;

/// Configuration for building and locating the taxonomy database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxqConfig {
    /// Directory for the JSON lookup artifacts
    pub data_dir: PathBuf,
    /// Directory for the raw `.dmp` files
    pub dump_dir: PathBuf,
    /// URL of `taxdump.tar.gz`; its checksum lives at `<url>.md5`
    pub taxdump_url: String,
    /// HTTP timeout in seconds
    pub request_timeout_secs: u64,
    /// Download the dump when neither artifacts nor dump files exist.
    /// On by default; `TAXQ_AUTO_FETCH=false` turns it off.
    pub auto_fetch: bool,
    /// Maximum number of nodes.dmp lines to parse (None for unlimited)
    pub parse_limit: Option<usize>,
}

impl Default for TaxqConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            dump_dir: PathBuf::from(DEFAULT_DUMP_DIR),
            taxdump_url: DEFAULT_TAXDUMP_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            auto_fetch: true,
            parse_limit: None,
        }
    }
}

impl TaxqConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the environment (and `.env`) over defaults
    ///
    /// Variables: `TAXQ_DATA_DIR`, `TAXQ_DUMP_DIR`, `TAXQ_TAXDUMP_URL`,
    /// `TAXQ_REQUEST_TIMEOUT`, `TAXQ_AUTO_FETCH`.
    pub fn from_env() -> taxq_common::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(dir) = std::env::var("TAXQ_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("TAXQ_DUMP_DIR") {
            config.dump_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("TAXQ_TAXDUMP_URL") {
            config.taxdump_url = url;
        }
        if let Some(timeout) = std::env::var("TAXQ_REQUEST_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.request_timeout_secs = timeout;
        }
        if let Some(auto_fetch) = std::env::var("TAXQ_AUTO_FETCH")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.auto_fetch = auto_fetch;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = dir.into();
        self
    }

    pub fn with_taxdump_url(mut self, url: impl Into<String>) -> Self {
        self.taxdump_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout_secs: u64) -> Self {
        self.request_timeout_secs = timeout_secs;
        self
    }

    pub fn with_auto_fetch(mut self, auto_fetch: bool) -> Self {
        self.auto_fetch = auto_fetch;
        self
    }

    pub fn with_parse_limit(mut self, limit: usize) -> Self {
        self.parse_limit = Some(limit);
        self
    }

    /// URL of the MD5 sidecar published next to the archive
    pub fn checksum_url(&self) -> String {
        format!("{}.md5", self.taxdump_url)
    }

    /// Validate configuration
    pub fn validate(&self) -> taxq_common::Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(TaxqError::config("data directory cannot be empty"));
        }
        if self.dump_dir.as_os_str().is_empty() {
            return Err(TaxqError::config("dump directory cannot be empty"));
        }
        if self.taxdump_url.trim().is_empty() {
            return Err(TaxqError::config("taxdump URL cannot be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(TaxqError::config("request timeout must be greater than 0"));
        }
        Ok(())
    }
}
