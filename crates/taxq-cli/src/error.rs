//! Error types for the taxq CLI
//!
//! Messages are user-facing and end with what to do next.

use taxq_common::TaxqError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Artifacts missing and no way to rebuild them
    #[error("Taxonomy data not built: {0}. Run 'taxq build' (or 'taxq fetch') first.")]
    NotBuilt(String),

    /// Dump files missing
    #[error("Taxonomy dump not found: {0}. Run 'taxq fetch' to download it, or point --dump-dir at an extracted taxdump.")]
    MissingDump(String),

    /// Lineage argument is not a taxid
    #[error("Invalid taxid: '{0}'. A taxid is a non-negative integer such as 9606.")]
    InvalidTaxid(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your TAXQ_* environment variables and flags.")]
    Config(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// JSON rendering failed
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(anyhow::Error),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<TaxqError> for CliError {
    fn from(err: TaxqError) -> Self {
        match err {
            TaxqError::MissingArtifact(path) => Self::NotBuilt(path),
            TaxqError::MissingDumpFile(path) => Self::MissingDump(path),
            TaxqError::Config(msg) => Self::Config(msg),
            TaxqError::Io(e) => Self::Io(e),
            other => Self::Other(other.into()),
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<TaxqError>() {
            Some(TaxqError::MissingArtifact(path)) => Self::NotBuilt(path.clone()),
            Some(TaxqError::MissingDumpFile(path)) => Self::MissingDump(path.clone()),
            Some(TaxqError::Config(msg)) => Self::Config(msg.clone()),
            _ => Self::Other(err),
        }
    }
}
