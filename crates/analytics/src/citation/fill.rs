//! Incremental bulk h-index fill
//!
//! Walks authors that still lack an h-index with a keyset cursor, computes each
//! one and flushes one unordered bulk write per page. Every write is guarded by
//! "h-index still missing", so a rerun or a concurrent run never overwrites a
//! value that is already there.

use super::hindex::CitationIndex;
use crate::progress::Progress;
use crate::retry::with_retry;
use citegraph_common::config::AnalyticsConfig;
use citegraph_common::metrics::{record_h_index, record_h_index_flush};
use citegraph_common::store::{AuthorFilter, AuthorUpdate};
use citegraph_common::{AppError, Result};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

/// Bulk fill tuning
#[derive(Debug, Clone)]
pub struct FillConfig {
    /// Authors logged between progress lines
    pub progress_interval: u64,
    /// Give up on a failing store call after this long
    pub retry_max_elapsed: Duration,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            progress_interval: 10_000,
            retry_max_elapsed: Duration::from_secs(60),
        }
    }
}

impl From<&AnalyticsConfig> for FillConfig {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            progress_interval: config.progress_interval,
            ..Default::default()
        }
    }
}

/// Outcome of one fill pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FillReport {
    /// Authors lacking an h-index when the pass started
    pub pending: u64,
    /// Authors visited
    pub processed: u64,
    /// h-index values written
    pub updated: u64,
    /// Authors skipped because of an error
    pub failed: u64,
    pub elapsed_secs: f64,
}

impl CitationIndex {
    /// Compute and store the h-index of every author that does not have one yet
    #[instrument(skip(self, config))]
    pub async fn fill_missing_h_indexes(
        &self,
        batch_size: usize,
        config: &FillConfig,
    ) -> Result<FillReport> {
        if batch_size == 0 {
            return Err(AppError::invalid_argument("batch_size", "must be at least 1"));
        }

        let pending = with_retry("count_authors", config.retry_max_elapsed, || {
            self.store.count_authors(AuthorFilter::MissingHIndex)
        })
        .await?;
        info!(pending, batch_size, "Starting h-index fill");

        let mut progress = Progress::new("h_index_fill", pending, config.progress_interval);
        let mut report = FillReport { pending, ..Default::default() };
        let mut cursor: Option<String> = None;

        loop {
            let page = with_retry("scan_authors", config.retry_max_elapsed, || {
                self.store
                    .scan_authors(AuthorFilter::MissingHIndex, cursor.as_deref(), batch_size)
            })
            .await?;

            let Some(last) = page.last() else {
                break;
            };
            cursor = Some(last.id.clone());

            let mut updates = Vec::with_capacity(page.len());
            let mut page_failures = 0u64;
            for author in &page {
                match self.h_index_for(author).await {
                    Ok(h) => updates.push(AuthorUpdate::set_h_index_if_missing(&author.id, h)),
                    Err(e) => {
                        page_failures += 1;
                        warn!(author_id = %author.id, error = %e, "Skipping author");
                    }
                }
            }

            let computed = updates.len() as u64;
            let flush_started = Instant::now();
            let flushed = with_retry("bulk_update_authors", config.retry_max_elapsed, || {
                self.store.bulk_update_authors(updates.clone())
            })
            .await;

            match flushed {
                Ok(result) => {
                    report.updated += result.modified;
                    record_h_index(computed);
                }
                Err(e) => {
                    // The page stays unset and is picked up by the next run
                    error!(
                        error = %e,
                        authors = computed,
                        after = cursor.as_deref().unwrap_or_default(),
                        "Bulk h-index write failed"
                    );
                    page_failures += computed;
                }
            }
            record_h_index_flush(flush_started.elapsed().as_secs_f64(), page_failures);

            report.failed += page_failures;
            progress.advance(page.len() as u64);
        }

        report.processed = progress.processed();
        report.elapsed_secs = progress.elapsed().as_secs_f64();
        progress.report();
        info!(
            processed = report.processed,
            updated = report.updated,
            failed = report.failed,
            "h-index fill finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{citation_store, FailingStore};
    use citegraph_common::models::{Author, Paper};
    use citegraph_common::{CorpusStore, MemoryStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fill_sets_every_missing_h_index() {
        let store = citation_store().await;
        let index = CitationIndex::new(store.clone());

        let report = index.fill_missing_h_indexes(2, &FillConfig::default()).await.unwrap();
        assert_eq!(report.pending, 3);
        assert_eq!(report.processed, 3);
        assert_eq!(report.updated, 3);
        assert_eq!(report.failed, 0);

        let remaining = store.count_authors(AuthorFilter::MissingHIndex).await.unwrap();
        assert_eq!(remaining, 0);
        assert_eq!(store.get_author("id1").await.unwrap().unwrap().h_index, Some(3));
        assert_eq!(store.get_author("id3").await.unwrap().unwrap().h_index, Some(0));
    }

    #[tokio::test]
    async fn test_fill_rerun_keeps_existing_values() {
        let papers = vec![
            Paper::new("p1").with_citations(9),
            Paper::new("p2").with_citations(9),
        ];
        let authors = vec![
            // Stale value that a full recompute would change
            Author::new("a").with_papers(["p1", "p2"]).with_h_index(7),
            Author::new("b").with_papers(["p1"]),
        ];
        let store: Arc<dyn CorpusStore> =
            Arc::new(MemoryStore::with_corpus(papers, authors).await.unwrap());
        let index = CitationIndex::new(store.clone());

        let first = index.fill_missing_h_indexes(10, &FillConfig::default()).await.unwrap();
        assert_eq!(first.updated, 1);

        let second = index.fill_missing_h_indexes(10, &FillConfig::default()).await.unwrap();
        assert_eq!(second.pending, 0);
        assert_eq!(second.processed, 0);

        assert_eq!(store.get_author("a").await.unwrap().unwrap().h_index, Some(7));
        assert_eq!(store.get_author("b").await.unwrap().unwrap().h_index, Some(1));
    }

    #[tokio::test]
    async fn test_fill_rejects_zero_batch() {
        let index = CitationIndex::new(citation_store().await);

        let err = index
            .fill_missing_h_indexes(0, &FillConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument { .. }));
    }

    fn quick_retry() -> FillConfig {
        FillConfig {
            retry_max_elapsed: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fill_skips_author_whose_papers_fail() {
        let store = Arc::new(FailingStore::new(citation_store().await));
        // pid2 only belongs to id1
        store.poison_paper(Some("pid2"));
        let index = CitationIndex::new(store.clone());

        let report = index.fill_missing_h_indexes(10, &quick_retry()).await.unwrap();
        assert_eq!(report.processed, 3);
        assert_eq!(report.updated, 2);
        assert_eq!(report.failed, 1);

        assert_eq!(store.get_author("id1").await.unwrap().unwrap().h_index, None);
        assert_eq!(store.get_author("id2").await.unwrap().unwrap().h_index, Some(3));
        assert_eq!(store.get_author("id3").await.unwrap().unwrap().h_index, Some(0));

        store.poison_paper(None);
        let rerun = index.fill_missing_h_indexes(10, &quick_retry()).await.unwrap();
        assert_eq!(rerun.pending, 1);
        assert_eq!(rerun.updated, 1);
        assert_eq!(store.get_author("id1").await.unwrap().unwrap().h_index, Some(3));
    }

    #[tokio::test]
    async fn test_failed_flush_is_left_for_next_run() {
        let store = Arc::new(FailingStore::new(citation_store().await));
        store.fail_bulk_writes(true);
        let index = CitationIndex::new(store.clone());

        let report = index.fill_missing_h_indexes(10, &quick_retry()).await.unwrap();
        assert_eq!(report.processed, 3);
        assert_eq!(report.updated, 0);
        assert_eq!(report.failed, 3);
        assert_eq!(store.count_authors(AuthorFilter::MissingHIndex).await.unwrap(), 3);

        store.fail_bulk_writes(false);
        let rerun = index.fill_missing_h_indexes(10, &quick_retry()).await.unwrap();
        assert_eq!(rerun.pending, 3);
        assert_eq!(rerun.updated, 3);
        assert_eq!(rerun.failed, 0);
        assert_eq!(store.count_authors(AuthorFilter::MissingHIndex).await.unwrap(), 0);
    }

    #[test]
    fn test_fill_config_from_analytics() {
        let analytics = AnalyticsConfig {
            progress_interval: 42,
            ..Default::default()
        };
        let config = FillConfig::from(&analytics);
        assert_eq!(config.progress_interval, 42);
    }
}
