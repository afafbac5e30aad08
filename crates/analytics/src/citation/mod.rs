//! Citation index
//!
//! Per-author h-index computation, the incremental bulk fill job and top-N
//! ranking.

mod fill;
mod hindex;

pub use fill::{FillConfig, FillReport};
pub use hindex::{h_index, CitationIndex};
