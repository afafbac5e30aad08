//! Corpus store abstraction
//!
//! The analytics services never hold a global connection: every service takes
//! an `Arc<dyn CorpusStore>` at construction. Two implementations ship with the
//! crate: [`MemoryStore`] for tests and small corpora, and the PostgreSQL-backed
//! [`crate::db::Repository`].

mod memory;

pub use memory::MemoryStore;

use crate::errors::Result;
use crate::models::{Author, HistoryEvent, Paper, Venue};
use async_trait::async_trait;

/// Predicate for author scans and counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorFilter {
    #[default]
    All,
    /// Authors whose h-index has not been computed yet
    MissingHIndex,
    /// Authors with a computed h-index
    HasHIndex,
    /// Authors with at least one paper embedding
    HasEmbedding,
}

impl AuthorFilter {
    pub fn matches(&self, author: &Author) -> bool {
        match self {
            AuthorFilter::All => true,
            AuthorFilter::MissingHIndex => author.h_index.is_none(),
            AuthorFilter::HasHIndex => author.h_index.is_some(),
            AuthorFilter::HasEmbedding => !author.vectorized_papers.is_empty(),
        }
    }
}

/// Which author document a bulk update entry applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorMatch {
    Id(String),
    /// Only matches while the author still has no h-index
    IdWithoutHIndex(String),
}

impl AuthorMatch {
    pub fn author_id(&self) -> &str {
        match self {
            AuthorMatch::Id(id) | AuthorMatch::IdWithoutHIndex(id) => id,
        }
    }

    pub fn matches(&self, author: &Author) -> bool {
        match self {
            AuthorMatch::Id(id) => author.id == *id,
            AuthorMatch::IdWithoutHIndex(id) => author.id == *id && author.h_index.is_none(),
        }
    }
}

/// Field change applied by a bulk update entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorPatch {
    SetHIndex(u32),
}

/// One `(filter, update)` pair of an unordered bulk write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorUpdate {
    pub filter: AuthorMatch,
    pub patch: AuthorPatch,
}

impl AuthorUpdate {
    pub fn set_h_index(author_id: impl Into<String>, h_index: u32) -> Self {
        Self {
            filter: AuthorMatch::Id(author_id.into()),
            patch: AuthorPatch::SetHIndex(h_index),
        }
    }

    pub fn set_h_index_if_missing(author_id: impl Into<String>, h_index: u32) -> Self {
        Self {
            filter: AuthorMatch::IdWithoutHIndex(author_id.into()),
            patch: AuthorPatch::SetHIndex(h_index),
        }
    }

    pub(crate) fn apply(&self, author: &mut Author) {
        match self.patch {
            AuthorPatch::SetHIndex(h) => author.h_index = Some(h),
        }
    }
}

/// Outcome of a bulk write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkWriteResult {
    /// Entries submitted
    pub requested: u64,
    /// Documents actually changed
    pub modified: u64,
}

/// Document store holding papers, authors and venues
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Point lookup of a paper
    async fn get_paper(&self, id: &str) -> Result<Option<Paper>>;

    /// Batch lookup; ids without a paper are skipped
    async fn get_papers(&self, ids: &[String]) -> Result<Vec<Paper>>;

    /// Point lookup of an author
    async fn get_author(&self, id: &str) -> Result<Option<Author>>;

    /// Point lookup of a venue
    async fn get_venue(&self, id: &str) -> Result<Option<Venue>>;

    /// Keyset page of papers ordered by id, strictly after `after`
    async fn scan_papers(&self, after: Option<&str>, limit: usize) -> Result<Vec<Paper>>;

    /// Keyset page of matching authors ordered by id, strictly after `after`
    async fn scan_authors(
        &self,
        filter: AuthorFilter,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Author>>;

    async fn count_papers(&self) -> Result<u64>;

    async fn count_authors(&self, filter: AuthorFilter) -> Result<u64>;

    async fn count_venues(&self) -> Result<u64>;

    /// Unordered bulk update; entries whose filter matches nothing are ignored
    async fn bulk_update_authors(&self, updates: Vec<AuthorUpdate>) -> Result<BulkWriteResult>;

    /// Atomically append to one author's history.
    ///
    /// Returns the updated author, or `None` if the author does not exist.
    async fn append_history(&self, author_id: &str, event: HistoryEvent) -> Result<Option<Author>>;

    /// Authors with a computed h-index, highest first, ties by ascending id
    async fn top_authors_by_h_index(&self, limit: usize) -> Result<Vec<Author>>;

    /// Uniform random sample of at most `size` authors
    async fn sample_authors(&self, size: usize) -> Result<Vec<Author>>;

    /// Insert a new paper; `Duplicate` if the id is taken
    async fn insert_paper(&self, paper: Paper) -> Result<()>;

    /// Insert a new author; `Duplicate` if the id is taken
    async fn insert_author(&self, author: Author) -> Result<()>;
}
