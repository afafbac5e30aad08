//! Corpus-wide counts

use citegraph_common::store::AuthorFilter;
use citegraph_common::{CorpusStore, Result};
use futures::try_join;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub papers: u64,
    pub authors: u64,
    pub venues: u64,
    /// Authors the h-index fill job has not reached yet
    pub authors_missing_h_index: u64,
}

impl CorpusStats {
    pub async fn collect(store: &dyn CorpusStore) -> Result<Self> {
        let (papers, authors, venues, authors_missing_h_index) = try_join!(
            store.count_papers(),
            store.count_authors(AuthorFilter::All),
            store.count_venues(),
            store.count_authors(AuthorFilter::MissingHIndex),
        )?;

        Ok(Self {
            papers,
            authors,
            venues,
            authors_missing_h_index,
        })
    }

    /// Share of authors with an h-index, in percent
    pub fn h_index_coverage(&self) -> f64 {
        if self.authors == 0 {
            return 100.0;
        }
        let done = self.authors.saturating_sub(self.authors_missing_h_index);
        done as f64 / self.authors as f64 * 100.0
    }
}
