//! Worker commands
//!
//! Parses the command line into a [`Command`] and runs it against a corpus
//! store. Every command produces a JSON value that `main` prints to stdout.

use anyhow::{bail, Context};
use citegraph_analytics::{
    AuthorSimilarity, CitationIndex, CorpusStats, EgoGraphCache, EngagementLedger, FillConfig,
    GraphBuilder, GraphConfig,
};
use citegraph_common::config::AnalyticsConfig;
use citegraph_common::{AppError, CorpusStore};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

pub const USAGE: &str = "\
usage: analytics-worker <command> [args]

commands:
  migrate [dir]                       apply SQL migrations (default ./migrations)
  stats                               corpus counts and h-index coverage
  fill-h-index [batch_size]           compute every missing h-index
  set-h-index <author_id>             recompute and store one h-index
  top-h-index [n]                     top authors by h-index (default 10)
  ego-graph <author_id>               co-author star graph of one author
  corpus-graph [max_papers] [top]     corpus graph, stripped to the top-degree authors (default 100)
  nearest <author_id> [k]             most similar authors by embedding (default 10)
  sample [size]                       random sample of author ids (default 10)
  paper <paper_id>                    one paper with its venue resolved
  like <author_id> <paper_id>
  unlike <author_id> <paper_id>
  liked <author_id>                   currently liked papers, newest first
  history <author_id>";

/// One worker invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Migrate { dir: PathBuf },
    Stats,
    FillHIndex { batch_size: Option<usize> },
    SetHIndex { author_id: String },
    TopHIndex { n: usize },
    EgoGraph { author_id: String },
    CorpusGraph { max_papers: Option<u64>, top: usize },
    Nearest { author_id: String, k: usize },
    Sample { size: usize },
    Paper { paper_id: String },
    Like { author_id: String, paper_id: String },
    Unlike { author_id: String, paper_id: String },
    Liked { author_id: String },
    History { author_id: String },
}

fn required(args: &[String], index: usize, name: &str) -> anyhow::Result<String> {
    args.get(index)
        .cloned()
        .with_context(|| format!("missing <{}>", name))
}

fn optional<T>(args: &[String], index: usize, name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    args.get(index)
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("invalid {}: {}", name, raw))
        })
        .transpose()
}

impl Command {
    /// Parse arguments without the program name
    pub fn parse(args: &[String]) -> anyhow::Result<Self> {
        let Some(name) = args.first() else {
            bail!("no command given");
        };

        let command = match name.as_str() {
            "migrate" => Command::Migrate {
                dir: optional(args, 1, "dir")?.unwrap_or_else(|| PathBuf::from("migrations")),
            },
            "stats" => Command::Stats,
            "fill-h-index" => Command::FillHIndex {
                batch_size: optional(args, 1, "batch_size")?,
            },
            "set-h-index" => Command::SetHIndex {
                author_id: required(args, 1, "author_id")?,
            },
            "top-h-index" => Command::TopHIndex {
                n: optional(args, 1, "n")?.unwrap_or(10),
            },
            "ego-graph" => Command::EgoGraph {
                author_id: required(args, 1, "author_id")?,
            },
            "corpus-graph" => Command::CorpusGraph {
                max_papers: optional(args, 1, "max_papers")?,
                top: optional(args, 2, "top")?.unwrap_or(100),
            },
            "nearest" => Command::Nearest {
                author_id: required(args, 1, "author_id")?,
                k: optional(args, 2, "k")?.unwrap_or(10),
            },
            "sample" => Command::Sample {
                size: optional(args, 1, "size")?.unwrap_or(10),
            },
            "paper" => Command::Paper {
                paper_id: required(args, 1, "paper_id")?,
            },
            "like" => Command::Like {
                author_id: required(args, 1, "author_id")?,
                paper_id: required(args, 2, "paper_id")?,
            },
            "unlike" => Command::Unlike {
                author_id: required(args, 1, "author_id")?,
                paper_id: required(args, 2, "paper_id")?,
            },
            "liked" => Command::Liked {
                author_id: required(args, 1, "author_id")?,
            },
            "history" => Command::History {
                author_id: required(args, 1, "author_id")?,
            },
            other => bail!("unknown command: {}", other),
        };
        Ok(command)
    }
}

/// Analytics services wired to one store
pub struct Jobs {
    store: Arc<dyn CorpusStore>,
    config: AnalyticsConfig,
    citations: CitationIndex,
    graphs: GraphBuilder,
    ledger: EngagementLedger,
    similarity: AuthorSimilarity,
}

impl Jobs {
    pub fn new(store: Arc<dyn CorpusStore>, config: AnalyticsConfig) -> Self {
        let mut graphs = GraphBuilder::new(store.clone(), GraphConfig::from(&config));
        if let Some(cache) = EgoGraphCache::from_config(&config) {
            graphs = graphs.with_cache(cache);
        }

        Self {
            citations: CitationIndex::new(store.clone()),
            ledger: EngagementLedger::new(store.clone()),
            similarity: AuthorSimilarity::new(store.clone(), config.scan_batch_size),
            graphs,
            store,
            config,
        }
    }

    /// Run a store-backed command. `Migrate` is handled by the caller.
    pub async fn run(&self, command: Command) -> anyhow::Result<Value> {
        let output = match command {
            Command::Migrate { .. } => bail!("migrate needs a database connection"),
            Command::Stats => {
                let stats = CorpusStats::collect(self.store.as_ref()).await?;
                json!({
                    "counts": stats,
                    "h_index_coverage": stats.h_index_coverage(),
                })
            }
            Command::FillHIndex { batch_size } => {
                let batch_size = batch_size.unwrap_or(self.config.h_index_batch_size);
                let report = self
                    .citations
                    .fill_missing_h_indexes(batch_size, &FillConfig::from(&self.config))
                    .await?;
                serde_json::to_value(report)?
            }
            Command::SetHIndex { author_id } => {
                let h_index = self.citations.set_h_index(&author_id).await?;
                json!({ "author_id": author_id, "h_index": h_index })
            }
            Command::TopHIndex { n } => {
                json!(self.citations.get_top_h_index_authors(n).await?)
            }
            Command::EgoGraph { author_id } => {
                let graph = self.graphs.build_ego_graph(&author_id).await?;
                serde_json::to_value(graph.snapshot())?
            }
            Command::CorpusGraph { max_papers, top } => {
                let max_papers = max_papers.unwrap_or(self.config.graph_max_papers);
                let graph = self.graphs.build_corpus_graph(max_papers).await?;
                let stripped = graph.top_by_degree(top);
                info!(
                    nodes = graph.node_count(),
                    kept = stripped.node_count(),
                    "Stripped corpus graph to top-degree authors"
                );
                serde_json::to_value(stripped.snapshot())?
            }
            Command::Nearest { author_id, k } => {
                serde_json::to_value(self.similarity.nearest_authors(&author_id, k).await?)?
            }
            Command::Sample { size } => {
                let authors = self.store.sample_authors(size).await?;
                json!(authors.into_iter().map(|a| a.id).collect::<Vec<_>>())
            }
            Command::Paper { paper_id } => {
                let Some(paper) = self.store.get_paper(&paper_id).await? else {
                    return Err(AppError::PaperNotFound { id: paper_id }.into());
                };
                let venue = match paper.venue.as_deref() {
                    Some(venue_id) => self.store.get_venue(venue_id).await?,
                    None => None,
                };
                json!({ "paper": paper, "venue": venue })
            }
            Command::Like { author_id, paper_id } => {
                let author = self.ledger.like(&author_id, &paper_id).await?;
                json!({ "author_id": author.id, "history_len": author.history.len() })
            }
            Command::Unlike { author_id, paper_id } => {
                let author = self.ledger.unlike(&author_id, &paper_id).await?;
                json!({ "author_id": author.id, "history_len": author.history.len() })
            }
            Command::Liked { author_id } => json!(self.ledger.get_liked_papers(&author_id).await?),
            Command::History { author_id } => {
                serde_json::to_value(self.ledger.get_history(&author_id).await?)?
            }
        };
        Ok(output)
    }
}
