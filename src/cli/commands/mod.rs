//! CLI command implementations.

pub mod ingest;
pub mod plan;
pub mod serve;
