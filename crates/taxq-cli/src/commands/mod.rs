//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod build;
pub mod fetch;
pub mod lineage;
pub mod query;
pub mod stats;
