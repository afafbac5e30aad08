//! Nearest-author lookup over paper embeddings
//!
//! An author's vector is the mean of their per-paper embeddings. Candidates are
//! scanned page by page and ranked by cosine similarity with a bounded heap.

use crate::retry::with_retry;
use citegraph_common::store::AuthorFilter;
use citegraph_common::{AppError, CorpusStore, Result};
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// A ranked neighbor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarAuthor {
    pub author_id: String,
    /// Cosine similarity in `[-1, 1]`
    pub score: f32,
}

/// Cosine similarity, or `None` for empty, mismatched, non-finite or zero vectors
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Option<f32> {
    if left.is_empty() || left.len() != right.len() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut left_squares = 0.0f64;
    let mut right_squares = 0.0f64;
    for (&l, &r) in left.iter().zip(right) {
        if !l.is_finite() || !r.is_finite() {
            return None;
        }
        dot += f64::from(l) * f64::from(r);
        left_squares += f64::from(l) * f64::from(l);
        right_squares += f64::from(r) * f64::from(r);
    }

    let denominator = left_squares.sqrt() * right_squares.sqrt();
    if denominator == 0.0 {
        return None;
    }
    Some(((dot / denominator) as f32).clamp(-1.0, 1.0))
}

/// Higher score first, then ascending id
#[derive(Debug, PartialEq)]
struct Ranked(SimilarAuthor);

impl Eq for Ranked {}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .score
            .total_cmp(&other.0.score)
            .then_with(|| other.0.author_id.cmp(&self.0.author_id))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Embedding-based author similarity
#[derive(Clone)]
pub struct AuthorSimilarity {
    store: Arc<dyn CorpusStore>,
    scan_batch_size: usize,
    retry_max_elapsed: Duration,
}

impl AuthorSimilarity {
    pub fn new(store: Arc<dyn CorpusStore>, scan_batch_size: usize) -> Self {
        Self {
            store,
            scan_batch_size: scan_batch_size.max(1),
            retry_max_elapsed: Duration::from_secs(60),
        }
    }

    /// The `k` authors most similar to `author_id`, best first.
    ///
    /// The author itself and authors without a comparable embedding are
    /// excluded.
    #[instrument(skip(self))]
    pub async fn nearest_authors(&self, author_id: &str, k: usize) -> Result<Vec<SimilarAuthor>> {
        let author = self
            .store
            .get_author(author_id)
            .await?
            .ok_or_else(|| AppError::AuthorNotFound { id: author_id.to_string() })?;
        let query = author.mean_embedding().ok_or_else(|| {
            AppError::invalid_argument("author_id", format!("author {} has no paper embeddings", author_id))
        })?;

        if k == 0 {
            return Ok(Vec::new());
        }

        let mut best: BinaryHeap<Reverse<Ranked>> = BinaryHeap::with_capacity(k + 1);
        let mut cursor: Option<String> = None;
        let mut scanned = 0usize;

        loop {
            let page = with_retry("scan_authors", self.retry_max_elapsed, || {
                self.store.scan_authors(
                    AuthorFilter::HasEmbedding,
                    cursor.as_deref(),
                    self.scan_batch_size,
                )
            })
            .await?;
            let Some(last) = page.last() else {
                break;
            };
            cursor = Some(last.id.clone());
            scanned += page.len();

            for candidate in page {
                if candidate.id == author_id {
                    continue;
                }
                let Some(score) = candidate
                    .mean_embedding()
                    .and_then(|v| cosine_similarity(&query, &v))
                else {
                    continue;
                };

                best.push(Reverse(Ranked(SimilarAuthor {
                    author_id: candidate.id,
                    score,
                })));
                if best.len() > k {
                    best.pop();
                }
            }
        }

        debug!(author_id, scanned, "Nearest-author scan finished");

        // Ascending order of Reverse is descending rank
        Ok(best
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(Ranked(similar))| similar)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citegraph_common::models::Author;
    use citegraph_common::MemoryStore;

    async fn similarity() -> AuthorSimilarity {
        let authors = vec![
            Author::new("me")
                .with_paper_vector("p1", vec![1.0, 0.0])
                .with_paper_vector("p2", vec![1.0, 0.2]),
            Author::new("close").with_paper_vector("p3", vec![1.0, 0.1]),
            Author::new("twin").with_paper_vector("p4", vec![1.0, 0.1]),
            Author::new("far").with_paper_vector("p5", vec![0.0, 1.0]),
            Author::new("opposite").with_paper_vector("p6", vec![-1.0, 0.0]),
            Author::new("other_dim").with_paper_vector("p7", vec![1.0, 0.0, 0.0]),
            Author::new("plain"),
        ];
        let store = MemoryStore::with_corpus(Vec::new(), authors).await.unwrap();
        AuthorSimilarity::new(Arc::new(store), 2)
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]).unwrap() - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).unwrap().abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap() + 1.0).abs() < 1e-6);

        assert_eq!(cosine_similarity(&[], &[]), None);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), None);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), None);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 2.0]), None);
    }

    #[tokio::test]
    async fn test_nearest_authors_ranking() {
        let similarity = similarity().await;

        let nearest = similarity.nearest_authors("me", 3).await.unwrap();
        let ids: Vec<&str> = nearest.iter().map(|s| s.author_id.as_str()).collect();
        // "close" and "twin" tie; ascending id breaks it
        assert_eq!(ids, vec!["close", "twin", "far"]);
        assert!(nearest[0].score > nearest[2].score);
    }

    #[tokio::test]
    async fn test_nearest_authors_excludes_self_and_incomparable() {
        let similarity = similarity().await;

        let nearest = similarity.nearest_authors("me", 100).await.unwrap();
        let ids: Vec<&str> = nearest.iter().map(|s| s.author_id.as_str()).collect();
        assert_eq!(ids, vec!["close", "twin", "far", "opposite"]);

        assert!(similarity.nearest_authors("me", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nearest_authors_errors() {
        let similarity = similarity().await;

        let err = similarity.nearest_authors("ghost", 3).await.unwrap_err();
        assert!(err.is_not_found());

        let err = similarity.nearest_authors("plain", 3).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument { .. }));
    }
}
