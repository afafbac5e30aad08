//! Citegraph analytics engine
//!
//! Derived analytics over the citation corpus:
//! - h-index computation and the incremental bulk fill job
//! - Co-authorship graphs (ego networks and corpus-wide) with an ego-graph memo
//! - The append-only like/unlike engagement ledger
//! - Nearest-author lookups over mean paper embeddings
//!
//! Every service takes an `Arc<dyn CorpusStore>` at construction.

pub mod citation;
pub mod coauthor;
pub mod ledger;
pub mod similarity;
pub mod stats;

mod progress;
mod retry;

pub use citation::{h_index, CitationIndex, FillConfig, FillReport};
pub use coauthor::{CoauthorGraph, EgoGraphCache, GraphBuilder, GraphConfig, GraphSnapshot};
pub use ledger::EngagementLedger;
pub use similarity::{AuthorSimilarity, SimilarAuthor};
pub use stats::CorpusStats;
