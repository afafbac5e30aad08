//! Co-authorship graphs
//!
//! Ego networks around a single author and corpus-wide graphs capped by a
//! paper count, plus the in-process memo for ego graphs.

mod builder;
mod cache;
mod graph;

pub use builder::{GraphBuilder, GraphConfig};
pub use cache::EgoGraphCache;
pub use graph::{CoauthorEdge, CoauthorGraph, GraphNode, GraphSnapshot};
