//! Engagement ledger
//!
//! Per-author append-only like/unlike log. Nothing is ever removed from the
//! history; the "currently liked" set is derived by replaying it. Events are
//! ordered by timestamp, then by position in the log.

use citegraph_common::metrics::record_ledger_event;
use citegraph_common::models::{Author, EventKind, HistoryEvent};
use citegraph_common::{AppError, CorpusStore, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};

/// History in (timestamp, insertion) order
fn chronological(history: &[HistoryEvent]) -> Vec<&HistoryEvent> {
    let mut ordered: Vec<&HistoryEvent> = history.iter().collect();
    ordered.sort_by_key(|e| e.time);
    ordered
}

/// Whether the most recent event for `paper_id` is a like
pub fn is_liked(history: &[HistoryEvent], paper_id: &str) -> bool {
    chronological(history)
        .into_iter()
        .rev()
        .find(|e| e.paper_id() == paper_id)
        .is_some_and(|e| e.event == EventKind::Like)
}

/// Currently liked papers, most recently liked first, each id once
pub fn liked_papers(history: &[HistoryEvent]) -> Vec<String> {
    let mut decided = HashSet::new();
    let mut liked = Vec::new();
    for event in chronological(history).into_iter().rev() {
        if decided.insert(event.paper_id()) && event.event == EventKind::Like {
            liked.push(event.paper_id().to_string());
        }
    }
    liked
}

/// Like/unlike operations over a corpus store.
///
/// There is no lock around the check-then-append: two concurrent calls for the
/// same author may both pass the check, and the later append wins on replay.
#[derive(Clone)]
pub struct EngagementLedger {
    store: Arc<dyn CorpusStore>,
}

impl EngagementLedger {
    pub fn new(store: Arc<dyn CorpusStore>) -> Self {
        Self { store }
    }

    async fn load_author(&self, author_id: &str) -> Result<Author> {
        self.store
            .get_author(author_id)
            .await?
            .ok_or_else(|| AppError::AuthorNotFound { id: author_id.to_string() })
    }

    async fn ensure_paper(&self, paper_id: &str) -> Result<()> {
        match self.store.get_paper(paper_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::PaperNotFound { id: paper_id.to_string() }),
        }
    }

    async fn append(&self, author_id: &str, event: HistoryEvent) -> Result<Author> {
        let kind = match event.event {
            EventKind::Like => "like",
            EventKind::Unlike => "unlike",
        };
        let author = self
            .store
            .append_history(author_id, event)
            .await?
            .ok_or_else(|| AppError::AuthorNotFound { id: author_id.to_string() })?;
        record_ledger_event(kind);
        Ok(author)
    }

    /// Record that `author_id` likes `paper_id`; returns the updated author
    #[instrument(skip(self))]
    pub async fn like(&self, author_id: &str, paper_id: &str) -> Result<Author> {
        let author = self.load_author(author_id).await?;
        self.ensure_paper(paper_id).await?;

        if is_liked(&author.history, paper_id) {
            return Err(AppError::DuplicateLike {
                author_id: author_id.to_string(),
                paper_id: paper_id.to_string(),
            });
        }

        let author = self.append(author_id, HistoryEvent::like(paper_id)).await?;
        info!(author_id, paper_id, "Paper liked");
        Ok(author)
    }

    /// Withdraw an active like; returns the updated author
    #[instrument(skip(self))]
    pub async fn unlike(&self, author_id: &str, paper_id: &str) -> Result<Author> {
        let author = self.load_author(author_id).await?;
        self.ensure_paper(paper_id).await?;

        if !is_liked(&author.history, paper_id) {
            return Err(AppError::LikeNotFound {
                author_id: author_id.to_string(),
                paper_id: paper_id.to_string(),
            });
        }

        let author = self.append(author_id, HistoryEvent::unlike(paper_id)).await?;
        info!(author_id, paper_id, "Paper unliked");
        Ok(author)
    }

    /// Full history in insertion order
    pub async fn get_history(&self, author_id: &str) -> Result<Vec<HistoryEvent>> {
        Ok(self.load_author(author_id).await?.history)
    }

    /// Currently liked paper ids, newest like first
    pub async fn get_liked_papers(&self, author_id: &str) -> Result<Vec<String>> {
        let author = self.load_author(author_id).await?;
        Ok(liked_papers(&author.history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citegraph_common::models::Paper;
    use citegraph_common::MemoryStore;

    async fn ledger() -> EngagementLedger {
        let papers = vec![Paper::new("p1"), Paper::new("p2"), Paper::new("p3")];
        let authors = vec![Author::new("u1")];
        let store = MemoryStore::with_corpus(papers, authors).await.unwrap();
        EngagementLedger::new(Arc::new(store))
    }

    #[test]
    fn test_replay_uses_latest_event() {
        let history = vec![
            HistoryEvent::at(EventKind::Like, "p1", 10),
            HistoryEvent::at(EventKind::Like, "p2", 11),
            HistoryEvent::at(EventKind::Unlike, "p1", 12),
            HistoryEvent::at(EventKind::Like, "p1", 13),
            HistoryEvent::at(EventKind::Unlike, "p2", 14),
        ];
        assert!(is_liked(&history, "p1"));
        assert!(!is_liked(&history, "p2"));
        assert!(!is_liked(&history, "p9"));
        assert_eq!(liked_papers(&history), vec!["p1"]);
    }

    #[test]
    fn test_replay_orders_by_timestamp_then_position() {
        // Appended out of clock order
        let history = vec![
            HistoryEvent::at(EventKind::Unlike, "p1", 20),
            HistoryEvent::at(EventKind::Like, "p1", 10),
            HistoryEvent::at(EventKind::Like, "p2", 20),
            HistoryEvent::at(EventKind::Like, "p3", 20),
        ];
        assert!(!is_liked(&history, "p1"));
        assert_eq!(liked_papers(&history), vec!["p3", "p2"]);
    }

    #[tokio::test]
    async fn test_like_twice_conflicts() {
        let ledger = ledger().await;
        ledger.like("u1", "p1").await.unwrap();

        let err = ledger.like("u1", "p1").await.unwrap_err();
        assert!(err.is_conflict());
        assert!(matches!(err, AppError::DuplicateLike { .. }));
    }

    #[tokio::test]
    async fn test_unlike_without_like() {
        let ledger = ledger().await;

        let err = ledger.unlike("u1", "p1").await.unwrap_err();
        assert!(matches!(err, AppError::LikeNotFound { .. }));
    }

    #[tokio::test]
    async fn test_like_requires_author_and_paper() {
        let ledger = ledger().await;

        let err = ledger.like("nobody", "p1").await.unwrap_err();
        assert!(matches!(err, AppError::AuthorNotFound { .. }));

        let err = ledger.like("u1", "missing").await.unwrap_err();
        assert!(matches!(err, AppError::PaperNotFound { .. }));

        let err = ledger.unlike("u1", "missing").await.unwrap_err();
        assert!(matches!(err, AppError::PaperNotFound { .. }));

        assert!(ledger.get_history("nobody").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_liked_papers_after_unlike() {
        let ledger = ledger().await;
        ledger.like("u1", "p1").await.unwrap();
        let author = ledger.like("u1", "p2").await.unwrap();
        assert_eq!(author.history.len(), 2);

        assert_eq!(ledger.get_liked_papers("u1").await.unwrap(), vec!["p2", "p1"]);

        ledger.unlike("u1", "p1").await.unwrap();
        assert_eq!(ledger.get_liked_papers("u1").await.unwrap(), vec!["p2"]);

        let history = ledger.get_history("u1").await.unwrap();
        let kinds: Vec<(EventKind, &str)> =
            history.iter().map(|e| (e.event, e.paper_id())).collect();
        assert_eq!(
            kinds,
            vec![
                (EventKind::Like, "p1"),
                (EventKind::Like, "p2"),
                (EventKind::Unlike, "p1"),
            ]
        );
    }

    #[tokio::test]
    async fn test_relike_after_unlike() {
        let ledger = ledger().await;
        ledger.like("u1", "p3").await.unwrap();
        ledger.unlike("u1", "p3").await.unwrap();
        ledger.like("u1", "p3").await.unwrap();

        assert_eq!(ledger.get_liked_papers("u1").await.unwrap(), vec!["p3"]);
        assert_eq!(ledger.get_history("u1").await.unwrap().len(), 3);
    }
}
