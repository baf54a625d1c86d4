//! taxq common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling, logging and checksum helpers for the taxq crates.
//!
//! - **Error Handling**: [`TaxqError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//! - **Checksums**: archive and artifact integrity checks
//!
//! # Example
//!
//! ```no_run
//! use taxq_common::checksum::sha256_file;
//!
//! fn fingerprint(path: &str) -> taxq_common::Result<()> {
//!     let digest = sha256_file(path)?;
//!     println!("{path}: {digest}");
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

pub use error::{Result, TaxqError};
