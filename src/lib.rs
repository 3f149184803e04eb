//! Siwaht Media Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog;
pub mod config;
pub mod ingestion;
pub mod projection;
pub mod server;

// Re-export commonly used types for convenience
pub use catalog::{CatalogStore, SqliteCatalogStore};
pub use ingestion::{FfmpegTranscoder, IngestionOrchestrator, Transcoder};
pub use server::{run_server, RequestsLoggingLevel};
