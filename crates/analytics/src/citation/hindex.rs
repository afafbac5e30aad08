//! h-index computation

use citegraph_common::metrics::record_h_index;
use citegraph_common::models::Author;
use citegraph_common::store::AuthorUpdate;
use citegraph_common::{AppError, CorpusStore, Result};
use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Paper ids fetched per store round trip
const PAPER_LOOKUP_CHUNK: usize = 500;

/// Largest `h` such that at least `h` of the counts are `>= h`
pub fn h_index<I>(citations: I) -> u32
where
    I: IntoIterator<Item = u64>,
{
    let mut counts: Vec<u64> = citations.into_iter().collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));

    // Descending order makes the predicate monotone
    counts
        .iter()
        .enumerate()
        .take_while(|(i, &c)| c >= *i as u64 + 1)
        .count() as u32
}

/// h-index service over a corpus store
#[derive(Clone)]
pub struct CitationIndex {
    pub(super) store: Arc<dyn CorpusStore>,
}

impl CitationIndex {
    pub fn new(store: Arc<dyn CorpusStore>) -> Self {
        Self { store }
    }

    /// Compute an author's h-index from the current citation counts
    #[instrument(skip(self))]
    pub async fn compute_h_index(&self, author_id: &str) -> Result<u32> {
        let author = self.load_author(author_id).await?;
        let h = self.h_index_for(&author).await?;
        record_h_index(1);
        debug!(author_id, h_index = h, "Computed h-index");
        Ok(h)
    }

    /// Compute and persist an author's h-index, overwriting any previous value
    #[instrument(skip(self))]
    pub async fn set_h_index(&self, author_id: &str) -> Result<u32> {
        let h = self.compute_h_index(author_id).await?;
        let result = self
            .store
            .bulk_update_authors(vec![AuthorUpdate::set_h_index(author_id, h)])
            .await?;

        // Deleted between the read and the write
        if result.requested > 0 && result.modified == 0 {
            let still_there = self.store.get_author(author_id).await?.is_some();
            if !still_there {
                return Err(AppError::AuthorNotFound { id: author_id.to_string() });
            }
        }

        info!(author_id, h_index = h, "Stored h-index");
        Ok(h)
    }

    /// Ids of the `top_n` authors by h-index, highest first, ties by ascending id.
    ///
    /// Authors without an h-index are never ranked.
    #[instrument(skip(self))]
    pub async fn get_top_h_index_authors(&self, top_n: usize) -> Result<Vec<String>> {
        if top_n == 0 {
            return Ok(Vec::new());
        }
        let authors = self.store.top_authors_by_h_index(top_n).await?;
        Ok(authors.into_iter().map(|a| a.id).collect())
    }

    async fn load_author(&self, author_id: &str) -> Result<Author> {
        self.store
            .get_author(author_id)
            .await?
            .ok_or_else(|| AppError::AuthorNotFound { id: author_id.to_string() })
    }

    /// h-index over the author's own paper list.
    ///
    /// Repeated paper ids count once; dangling ids count as zero citations.
    pub(super) async fn h_index_for(&self, author: &Author) -> Result<u32> {
        let mut seen = HashSet::with_capacity(author.papers.len());
        let paper_ids: Vec<String> = author
            .papers
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();
        if paper_ids.is_empty() {
            return Ok(0);
        }

        let lookups = paper_ids
            .chunks(PAPER_LOOKUP_CHUNK)
            .map(|chunk| self.store.get_papers(chunk));
        let citations: HashMap<String, u64> = try_join_all(lookups)
            .await?
            .into_iter()
            .flatten()
            .map(|paper| {
                let citations = paper.citations();
                (paper.id, citations)
            })
            .collect();

        Ok(h_index(
            paper_ids
                .iter()
                .map(|id| citations.get(id).copied().unwrap_or(0)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::citation_store;
    use citegraph_common::models::Paper;
    use citegraph_common::MemoryStore;

    #[test]
    fn test_h_index_basic() {
        assert_eq!(h_index([3, 0, 6, 1, 5]), 3);
        assert_eq!(h_index([10, 8, 5, 4, 3]), 4);
        assert_eq!(h_index([25, 8, 5, 3, 3]), 3);
    }

    #[test]
    fn test_h_index_edges() {
        assert_eq!(h_index(Vec::<u64>::new()), 0);
        assert_eq!(h_index([0, 0, 0]), 0);
        assert_eq!(h_index([100]), 1);
        assert_eq!(h_index([1, 1, 1, 1]), 1);
        assert_eq!(h_index([4, 4, 4, 4]), 4);
    }

    #[tokio::test]
    async fn test_compute_h_index() {
        let index = CitationIndex::new(citation_store().await);

        assert_eq!(index.compute_h_index("id1").await.unwrap(), 3);
        assert_eq!(index.compute_h_index("id2").await.unwrap(), 3);
        assert_eq!(index.compute_h_index("id3").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_compute_h_index_unknown_author() {
        let index = CitationIndex::new(citation_store().await);

        let err = index.compute_h_index("nobody").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_dangling_and_repeated_papers() {
        let papers = vec![
            Paper::new("p1").with_citations(2),
            Paper::new("p2").with_citations(2),
            Paper::new("p3"),
        ];
        let authors = vec![Author::new("a").with_papers(["p1", "p1", "p1", "gone", "p3"])];
        let store = MemoryStore::with_corpus(papers, authors).await.unwrap();
        let index = CitationIndex::new(Arc::new(store));

        // p1 counted once; "gone" and p3 contribute zero
        assert_eq!(index.compute_h_index("a").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_h_index_persists() {
        let store = citation_store().await;
        let index = CitationIndex::new(store.clone());

        assert_eq!(index.set_h_index("id2").await.unwrap(), 3);
        let author = store.get_author("id2").await.unwrap().unwrap();
        assert_eq!(author.h_index, Some(3));

        assert!(index.set_h_index("nobody").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_top_h_index_authors() {
        let store = citation_store().await;
        let index = CitationIndex::new(store);
        for id in ["id1", "id2", "id3"] {
            index.set_h_index(id).await.unwrap();
        }

        assert_eq!(index.get_top_h_index_authors(1).await.unwrap(), vec!["id1"]);
        assert_eq!(
            index.get_top_h_index_authors(3).await.unwrap(),
            vec!["id1", "id2", "id3"]
        );
        assert!(index.get_top_h_index_authors(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_top_h_index_skips_uncomputed() {
        let index = CitationIndex::new(citation_store().await);
        index.set_h_index("id2").await.unwrap();

        assert_eq!(index.get_top_h_index_authors(5).await.unwrap(), vec!["id2"]);
    }
}
