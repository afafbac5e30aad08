//! Graph construction from the corpus store

use super::cache::EgoGraphCache;
use super::graph::CoauthorGraph;
use crate::progress::Progress;
use crate::retry::with_retry;
use citegraph_common::config::AnalyticsConfig;
use citegraph_common::metrics::record_graph_build;
use citegraph_common::{AppError, CorpusStore, Result};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Graph build tuning
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Papers per scan page and per ego-graph lookup
    pub scan_batch_size: usize,
    /// Papers between progress lines of a corpus build
    pub log_interval: u64,
    /// Give up on a failing store call after this long
    pub retry_max_elapsed: Duration,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            scan_batch_size: 1000,
            log_interval: 100_000,
            retry_max_elapsed: Duration::from_secs(60),
        }
    }
}

impl From<&AnalyticsConfig> for GraphConfig {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            scan_batch_size: config.scan_batch_size.max(1),
            log_interval: config.graph_log_interval,
            ..Default::default()
        }
    }
}

/// Builds ego and corpus co-authorship graphs
pub struct GraphBuilder {
    store: Arc<dyn CorpusStore>,
    cache: Option<EgoGraphCache>,
    config: GraphConfig,
}

impl GraphBuilder {
    pub fn new(store: Arc<dyn CorpusStore>, config: GraphConfig) -> Self {
        Self {
            store,
            cache: None,
            config,
        }
    }

    /// Memoize ego graphs in `cache`
    pub fn with_cache(mut self, cache: EgoGraphCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&EgoGraphCache> {
        self.cache.as_ref()
    }

    /// Forget a memoized ego graph after the author's papers changed
    pub fn invalidate(&self, author_id: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate(author_id);
        }
    }

    /// Star graph linking `author_id` to everyone who co-wrote one of its papers.
    ///
    /// The center is always a node, even without co-authors. Papers missing
    /// from the store are skipped.
    #[instrument(skip(self))]
    pub async fn build_ego_graph(&self, author_id: &str) -> Result<Arc<CoauthorGraph>> {
        if let Some(graph) = self.cache.as_ref().and_then(|c| c.get(author_id)) {
            return Ok(graph);
        }

        let started = Instant::now();
        let author = self
            .store
            .get_author(author_id)
            .await?
            .ok_or_else(|| AppError::AuthorNotFound { id: author_id.to_string() })?;

        let mut seen = HashSet::with_capacity(author.papers.len());
        let paper_ids: Vec<String> = author
            .papers
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let mut graph = CoauthorGraph::new();
        graph.add_node(author_id);
        for chunk in paper_ids.chunks(self.config.scan_batch_size.max(1)) {
            for paper in self.store.get_papers(chunk).await? {
                let mut on_paper = HashSet::with_capacity(paper.authors.len());
                for coauthor in &paper.authors {
                    if coauthor != author_id && on_paper.insert(coauthor.as_str()) {
                        graph.add_edge(author_id, coauthor);
                    }
                }
            }
        }

        record_graph_build(
            started.elapsed().as_secs_f64(),
            "ego",
            graph.node_count(),
            graph.edge_count(),
        );
        debug!(
            author_id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built ego graph"
        );

        let graph = Arc::new(graph);
        if let Some(cache) = &self.cache {
            cache.insert(author_id, Arc::clone(&graph));
        }
        Ok(graph)
    }

    /// Graph of the first `max_papers` papers in id order, one clique per paper.
    ///
    /// Runs to completion once started; wrap in `tokio::time::timeout` to bound
    /// wall time.
    #[instrument(skip(self))]
    pub async fn build_corpus_graph(&self, max_papers: u64) -> Result<CoauthorGraph> {
        let started = Instant::now();
        let mut graph = CoauthorGraph::new();
        let mut progress = Progress::new("corpus_graph", max_papers, self.config.log_interval);
        let mut cursor: Option<String> = None;

        info!(max_papers, "Building corpus co-authorship graph");

        while progress.processed() < max_papers {
            let remaining = max_papers - progress.processed();
            let limit = usize::try_from(remaining)
                .unwrap_or(usize::MAX)
                .min(self.config.scan_batch_size.max(1));

            let page = with_retry("scan_papers", self.config.retry_max_elapsed, || {
                self.store.scan_papers(cursor.as_deref(), limit)
            })
            .await?;

            let Some(last) = page.last() else {
                break;
            };
            cursor = Some(last.id.clone());

            for paper in &page {
                let mut on_paper = HashSet::with_capacity(paper.authors.len());
                let authors: Vec<&str> = paper
                    .authors
                    .iter()
                    .map(String::as_str)
                    .filter(|id| on_paper.insert(*id))
                    .collect();
                graph.add_clique(&authors);
            }
            progress.advance(page.len() as u64);
        }

        progress.report();
        record_graph_build(
            started.elapsed().as_secs_f64(),
            "corpus",
            graph.node_count(),
            graph.edge_count(),
        );
        info!(
            papers = progress.processed(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Corpus graph built"
        );

        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::coauthor_store;
    use citegraph_common::models::{Author, Paper};
    use citegraph_common::MemoryStore;
    use std::num::NonZeroUsize;

    fn pairs(graph: &CoauthorGraph) -> Vec<(String, String)> {
        graph
            .edges()
            .into_iter()
            .map(|e| (e.source, e.target))
            .collect()
    }

    fn pair(a: &str, b: &str) -> (String, String) {
        (a.to_string(), b.to_string())
    }

    #[tokio::test]
    async fn test_ego_graph_is_a_star() {
        let builder = GraphBuilder::new(coauthor_store().await, GraphConfig::default());

        let graph = builder.build_ego_graph("0").await.unwrap();

        let neighbors: Vec<&str> = graph.neighbors("0").collect();
        assert_eq!(neighbors, vec!["1", "2", "5", "6", "8", "9"]);
        assert_eq!(
            pairs(&graph),
            ["1", "2", "5", "6", "8", "9"]
                .iter()
                .map(|x| pair("0", x))
                .collect::<Vec<_>>()
        );
        // Co-authors of the same paper are not linked to each other
        assert!(!graph.contains_edge("1", "2"));
    }

    #[tokio::test]
    async fn test_ego_graph_unknown_author() {
        let builder = GraphBuilder::new(coauthor_store().await, GraphConfig::default());

        let err = builder.build_ego_graph("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_ego_graph_skips_missing_papers() {
        let papers = vec![Paper::new("p1").with_authors(["solo", "solo"])];
        let authors = vec![Author::new("solo").with_papers(["p1", "ghost"])];
        let store = MemoryStore::with_corpus(papers, authors).await.unwrap();
        let builder = GraphBuilder::new(Arc::new(store), GraphConfig::default());

        let graph = builder.build_ego_graph("solo").await.unwrap();
        assert_eq!(graph.nodes().collect::<Vec<_>>(), vec!["solo"]);
        assert_eq!(graph.edge_count(), 0);
    }

    #[tokio::test]
    async fn test_ego_graph_weights_count_shared_papers() {
        let papers = vec![
            Paper::new("p1").with_authors(["a", "b"]),
            Paper::new("p2").with_authors(["b", "a"]),
            Paper::new("p3").with_authors(["a", "c"]),
        ];
        let authors = vec![Author::new("a").with_papers(["p1", "p2", "p3", "p1"])];
        let store = MemoryStore::with_corpus(papers, authors).await.unwrap();
        let builder = GraphBuilder::new(Arc::new(store), GraphConfig::default());

        let graph = builder.build_ego_graph("a").await.unwrap();
        assert_eq!(graph.edge_weight("a", "b"), 2);
        assert_eq!(graph.edge_weight("a", "c"), 1);
    }

    #[tokio::test]
    async fn test_ego_graph_is_memoized() {
        let store = coauthor_store().await;
        let cache = EgoGraphCache::new(NonZeroUsize::new(8).unwrap(), None);
        let builder = GraphBuilder::new(store, GraphConfig::default()).with_cache(cache);

        let first = builder.build_ego_graph("0").await.unwrap();
        let second = builder.build_ego_graph("0").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        builder.invalidate("0");
        let third = builder.build_ego_graph("0").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[tokio::test]
    async fn test_corpus_graph_cliques() {
        let config = GraphConfig {
            scan_batch_size: 3,
            log_interval: 2,
            ..Default::default()
        };
        let builder = GraphBuilder::new(coauthor_store().await, config);

        let graph = builder.build_corpus_graph(100).await.unwrap();

        let expected = vec![
            pair("0", "1"),
            pair("0", "2"),
            pair("0", "5"),
            pair("0", "6"),
            pair("0", "8"),
            pair("0", "9"),
            pair("1", "2"),
            pair("3", "4"),
            pair("5", "6"),
            pair("8", "9"),
        ];
        assert_eq!(pairs(&graph), expected);
        assert_eq!(graph.node_count(), 9);
    }

    #[tokio::test]
    async fn test_corpus_graph_respects_max_papers() {
        let builder = GraphBuilder::new(coauthor_store().await, GraphConfig::default());

        // Papers are streamed in id order: only "a" and "b"
        let graph = builder.build_corpus_graph(2).await.unwrap();
        assert_eq!(graph.node_count(), 5);
        assert!(graph.contains_edge("5", "6"));
        assert!(!graph.contains_node("8"));

        assert!(builder.build_corpus_graph(0).await.unwrap().is_empty());
    }
}
