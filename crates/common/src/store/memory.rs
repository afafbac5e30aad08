//! In-memory corpus store
//!
//! Keeps every collection in a `BTreeMap` so the natural order is ascending id,
//! matching the keyset pagination of the database store.

use super::{AuthorFilter, AuthorUpdate, BulkWriteResult, CorpusStore};
use crate::errors::{AppError, Result};
use crate::models::{Author, HistoryEvent, Paper, Venue};
use async_trait::async_trait;
use rand::seq::IteratorRandom;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;

#[derive(Default)]
struct Collections {
    papers: BTreeMap<String, Paper>,
    authors: BTreeMap<String, Author>,
    venues: BTreeMap<String, Venue>,
}

/// Corpus store backed by process memory
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with the given documents
    pub async fn with_corpus(
        papers: impl IntoIterator<Item = Paper>,
        authors: impl IntoIterator<Item = Author>,
    ) -> Result<Self> {
        let store = Self::new();
        for paper in papers {
            store.insert_paper(paper).await?;
        }
        for author in authors {
            store.insert_author(author).await?;
        }
        Ok(store)
    }

    /// Add venues; a repeated id replaces the earlier venue
    pub fn with_venues(mut self, venues: impl IntoIterator<Item = Venue>) -> Self {
        let inner = self.inner.get_mut();
        for venue in venues {
            inner.venues.insert(venue.id.clone(), venue);
        }
        self
    }
}

fn after_range(after: Option<&str>) -> (Bound<String>, Bound<String>) {
    match after {
        Some(id) => (Bound::Excluded(id.to_string()), Bound::Unbounded),
        None => (Bound::Unbounded, Bound::Unbounded),
    }
}

fn duplicate(kind: &str, id: &str) -> AppError {
    AppError::Duplicate {
        message: format!("{} with id {} already exists", kind, id),
    }
}

#[async_trait]
impl CorpusStore for MemoryStore {
    async fn get_paper(&self, id: &str) -> Result<Option<Paper>> {
        Ok(self.inner.read().await.papers.get(id).cloned())
    }

    async fn get_papers(&self, ids: &[String]) -> Result<Vec<Paper>> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| inner.papers.get(id).cloned()).collect())
    }

    async fn get_author(&self, id: &str) -> Result<Option<Author>> {
        Ok(self.inner.read().await.authors.get(id).cloned())
    }

    async fn get_venue(&self, id: &str) -> Result<Option<Venue>> {
        Ok(self.inner.read().await.venues.get(id).cloned())
    }

    async fn scan_papers(&self, after: Option<&str>, limit: usize) -> Result<Vec<Paper>> {
        let inner = self.inner.read().await;
        Ok(inner
            .papers
            .range(after_range(after))
            .take(limit)
            .map(|(_, paper)| paper.clone())
            .collect())
    }

    async fn scan_authors(
        &self,
        filter: AuthorFilter,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Author>> {
        let inner = self.inner.read().await;
        Ok(inner
            .authors
            .range(after_range(after))
            .map(|(_, author)| author)
            .filter(|author| filter.matches(author))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_papers(&self) -> Result<u64> {
        Ok(self.inner.read().await.papers.len() as u64)
    }

    async fn count_authors(&self, filter: AuthorFilter) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner.authors.values().filter(|a| filter.matches(a)).count() as u64)
    }

    async fn count_venues(&self) -> Result<u64> {
        Ok(self.inner.read().await.venues.len() as u64)
    }

    async fn bulk_update_authors(&self, updates: Vec<AuthorUpdate>) -> Result<BulkWriteResult> {
        let mut inner = self.inner.write().await;
        let mut result = BulkWriteResult {
            requested: updates.len() as u64,
            modified: 0,
        };

        for update in &updates {
            if let Some(author) = inner.authors.get_mut(update.filter.author_id()) {
                if update.filter.matches(author) {
                    update.apply(author);
                    result.modified += 1;
                }
            }
        }

        Ok(result)
    }

    async fn append_history(&self, author_id: &str, event: HistoryEvent) -> Result<Option<Author>> {
        let mut inner = self.inner.write().await;
        Ok(inner.authors.get_mut(author_id).map(|author| {
            author.history.push(event);
            author.clone()
        }))
    }

    async fn top_authors_by_h_index(&self, limit: usize) -> Result<Vec<Author>> {
        let inner = self.inner.read().await;
        let mut ranked: Vec<&Author> = inner
            .authors
            .values()
            .filter(|a| a.h_index.is_some())
            .collect();
        // values() is already id-ascending, a stable sort keeps that for ties
        ranked.sort_by(|a, b| b.h_index.cmp(&a.h_index));
        Ok(ranked.into_iter().take(limit).cloned().collect())
    }

    async fn sample_authors(&self, size: usize) -> Result<Vec<Author>> {
        let inner = self.inner.read().await;
        let mut rng = rand::thread_rng();
        Ok(inner
            .authors
            .values()
            .choose_multiple(&mut rng, size)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn insert_paper(&self, paper: Paper) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.papers.contains_key(&paper.id) {
            return Err(duplicate("Paper", &paper.id));
        }
        inner.papers.insert(paper.id.clone(), paper);
        Ok(())
    }

    async fn insert_author(&self, author: Author) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.authors.contains_key(&author.id) {
            return Err(duplicate("Author", &author.id));
        }
        inner.authors.insert(author.id.clone(), author);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fixture() -> MemoryStore {
        MemoryStore::with_corpus(
            vec![Paper::new("p1"), Paper::new("p2"), Paper::new("p3")],
            vec![
                Author::new("a1").with_h_index(2),
                Author::new("a2"),
                Author::new("a3").with_h_index(5),
                Author::new("a4"),
            ],
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_keyset_scan() {
        let store = fixture().await;

        let first = store.scan_papers(None, 2).await.unwrap();
        assert_eq!(first.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), ["p1", "p2"]);

        let rest = store.scan_papers(Some("p2"), 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, "p3");

        let missing = store
            .scan_authors(AuthorFilter::MissingHIndex, Some("a2"), 10)
            .await
            .unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id, "a4");
    }

    #[tokio::test]
    async fn test_counts() {
        let store = fixture().await;
        assert_eq!(store.count_papers().await.unwrap(), 3);
        assert_eq!(store.count_authors(AuthorFilter::All).await.unwrap(), 4);
        assert_eq!(store.count_authors(AuthorFilter::HasHIndex).await.unwrap(), 2);
        assert_eq!(store.count_venues().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bulk_update_respects_filter() {
        let store = fixture().await;
        let result = store
            .bulk_update_authors(vec![
                AuthorUpdate::set_h_index_if_missing("a1", 9),
                AuthorUpdate::set_h_index_if_missing("a2", 3),
                AuthorUpdate::set_h_index("a3", 1),
                AuthorUpdate::set_h_index("ghost", 1),
            ])
            .await
            .unwrap();

        assert_eq!(result, BulkWriteResult { requested: 4, modified: 2 });
        assert_eq!(store.get_author("a1").await.unwrap().unwrap().h_index, Some(2));
        assert_eq!(store.get_author("a2").await.unwrap().unwrap().h_index, Some(3));
        assert_eq!(store.get_author("a3").await.unwrap().unwrap().h_index, Some(1));
    }

    #[tokio::test]
    async fn test_duplicate_insert() {
        let store = fixture().await;
        let err = store.insert_paper(Paper::new("p1")).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_append_history_unknown_author() {
        let store = fixture().await;
        let result = store
            .append_history("ghost", HistoryEvent::like("p1"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_sample_bounded() {
        let store = fixture().await;
        assert_eq!(store.sample_authors(2).await.unwrap().len(), 2);
        assert_eq!(store.sample_authors(10).await.unwrap().len(), 4);
    }

    #[test]
    fn test_top_authors_ties_by_id() {
        let store = tokio_test::block_on(MemoryStore::with_corpus(
            Vec::new(),
            vec![
                Author::new("b").with_h_index(4),
                Author::new("a").with_h_index(4),
                Author::new("c").with_h_index(7),
                Author::new("d"),
            ],
        ))
        .unwrap();

        let top = tokio_test::block_on(store.top_authors_by_h_index(10)).unwrap();
        let ids: Vec<&str> = top.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }
}
