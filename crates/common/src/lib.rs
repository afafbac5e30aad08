//! Citegraph Common Library
//!
//! Shared code for the Citegraph analytics crates including:
//! - Corpus models (papers, authors, venues, history events)
//! - The corpus store abstraction and its in-memory implementation
//! - PostgreSQL-backed store (SeaORM)
//! - Error types and handling
//! - Configuration management
//! - Metrics

pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use store::{CorpusStore, MemoryStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
