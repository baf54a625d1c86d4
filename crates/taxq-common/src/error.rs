//! Error types for taxq

use thiserror::Error;

/// Result type alias for taxq operations
pub type Result<T> = std::result::Result<T, TaxqError>;

/// Main error type for taxq
#[derive(Error, Debug)]
pub enum TaxqError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    #[error("Missing dump file: {0}")]
    MissingDumpFile(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl TaxqError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
