//! PostgreSQL corpus store
//!
//! Implements [`CorpusStore`] over the `papers`, `authors` and `venues`
//! tables. List-shaped author fields live in JSONB columns so that a history
//! append is a single-row `UPDATE`.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::models::{Author, HistoryEvent, Paper, Venue};
use crate::store::{AuthorFilter, AuthorMatch, AuthorPatch, AuthorUpdate, BulkWriteResult, CorpusStore};
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, Statement,
};
use tracing::debug;

/// Repository for corpus data access
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}

fn author_condition(filter: AuthorFilter) -> Condition {
    match filter {
        AuthorFilter::All => Condition::all(),
        AuthorFilter::MissingHIndex => Condition::all().add(AuthorColumn::HIndex.is_null()),
        AuthorFilter::HasHIndex => Condition::all().add(AuthorColumn::HIndex.is_not_null()),
        AuthorFilter::HasEmbedding => {
            Condition::all().add(Expr::cust("vectorized_papers <> '{}'::jsonb"))
        }
    }
}

fn insert_error(err: DbErr, kind: &str, id: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Duplicate {
            message: format!("{} with id {} already exists", kind, id),
        },
        _ => AppError::Database(err),
    }
}

fn to_authors(models: Vec<AuthorModel>) -> Vec<Author> {
    models.into_iter().map(Author::from).collect()
}

fn h_index_column(h_index: u32) -> i32 {
    i32::try_from(h_index).unwrap_or(i32::MAX)
}

#[async_trait]
impl CorpusStore for Repository {
    async fn get_paper(&self, id: &str) -> Result<Option<Paper>> {
        let model = PaperEntity::find_by_id(id.to_string())
            .one(self.read_conn())
            .await?;
        Ok(model.map(Paper::from))
    }

    async fn get_papers(&self, ids: &[String]) -> Result<Vec<Paper>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = PaperEntity::find()
            .filter(PaperColumn::Id.is_in(ids.iter().cloned()))
            .all(self.read_conn())
            .await?;
        Ok(models.into_iter().map(Paper::from).collect())
    }

    async fn get_author(&self, id: &str) -> Result<Option<Author>> {
        let model = AuthorEntity::find_by_id(id.to_string())
            .one(self.read_conn())
            .await?;
        Ok(model.map(Author::from))
    }

    async fn get_venue(&self, id: &str) -> Result<Option<Venue>> {
        let model = VenueEntity::find_by_id(id.to_string())
            .one(self.read_conn())
            .await?;
        Ok(model.map(Venue::from))
    }

    async fn scan_papers(&self, after: Option<&str>, limit: usize) -> Result<Vec<Paper>> {
        let mut query = PaperEntity::find();
        if let Some(after) = after {
            query = query.filter(PaperColumn::Id.gt(after));
        }
        let models = query
            .order_by_asc(PaperColumn::Id)
            .limit(limit as u64)
            .all(self.read_conn())
            .await?;
        Ok(models.into_iter().map(Paper::from).collect())
    }

    async fn scan_authors(
        &self,
        filter: AuthorFilter,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Author>> {
        let mut query = AuthorEntity::find().filter(author_condition(filter));
        if let Some(after) = after {
            query = query.filter(AuthorColumn::Id.gt(after));
        }
        let models = query
            .order_by_asc(AuthorColumn::Id)
            .limit(limit as u64)
            .all(self.read_conn())
            .await?;
        Ok(to_authors(models))
    }

    async fn count_papers(&self) -> Result<u64> {
        Ok(PaperEntity::find().count(self.read_conn()).await?)
    }

    async fn count_authors(&self, filter: AuthorFilter) -> Result<u64> {
        Ok(AuthorEntity::find()
            .filter(author_condition(filter))
            .count(self.read_conn())
            .await?)
    }

    async fn count_venues(&self) -> Result<u64> {
        Ok(VenueEntity::find().count(self.read_conn()).await?)
    }

    async fn bulk_update_authors(&self, updates: Vec<AuthorUpdate>) -> Result<BulkWriteResult> {
        let mut modified = 0;
        for chunk in updates.chunks(MAX_UPDATES_PER_STATEMENT) {
            let result = self
                .write_conn()
                .execute(bulk_update_statement(chunk))
                .await?;
            modified += result.rows_affected();
        }

        debug!(requested = updates.len(), modified, "Bulk author update applied");

        Ok(BulkWriteResult {
            requested: updates.len() as u64,
            modified,
        })
    }

    async fn append_history(&self, author_id: &str, event: HistoryEvent) -> Result<Option<Author>> {
        let event_json = serde_json::to_string(&event)?;
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            UPDATE authors
            SET history = COALESCE(history, '[]'::jsonb) || jsonb_build_array($2::jsonb)
            WHERE id = $1
            RETURNING *
            "#,
            vec![author_id.into(), event_json.into()],
        );

        let model = AuthorEntity::find()
            .from_raw_sql(stmt)
            .one(self.write_conn())
            .await?;
        Ok(model.map(Author::from))
    }

    async fn top_authors_by_h_index(&self, limit: usize) -> Result<Vec<Author>> {
        let models = AuthorEntity::find()
            .filter(AuthorColumn::HIndex.is_not_null())
            .order_by_desc(AuthorColumn::HIndex)
            .order_by_asc(AuthorColumn::Id)
            .limit(limit as u64)
            .all(self.read_conn())
            .await?;
        Ok(to_authors(models))
    }

    async fn sample_authors(&self, size: usize) -> Result<Vec<Author>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT * FROM authors ORDER BY random() LIMIT $1",
            vec![(size as i64).into()],
        );
        let models = AuthorEntity::find()
            .from_raw_sql(stmt)
            .all(self.read_conn())
            .await?;
        Ok(to_authors(models))
    }

    async fn insert_paper(&self, paper: Paper) -> Result<()> {
        let id = paper.id.clone();
        let model = PaperActiveModel {
            id: Set(paper.id),
            title: Set(paper.title),
            abstract_text: Set(paper.abstract_text),
            year: Set(paper.year),
            n_citation: Set(paper.n_citation),
            venue: Set(paper.venue),
            authors: Set(serde_json::to_value(&paper.authors)?),
        };

        PaperEntity::insert(model)
            .exec_without_returning(self.write_conn())
            .await
            .map_err(|e| insert_error(e, "Paper", &id))?;
        Ok(())
    }

    async fn insert_author(&self, author: Author) -> Result<()> {
        let id = author.id.clone();
        let model = AuthorActiveModel {
            id: Set(author.id),
            name: Set(author.name),
            org: Set(author.org),
            gid: Set(author.gid),
            oid: Set(author.oid),
            orgid: Set(author.orgid),
            h_index: Set(author.h_index.map(h_index_column)),
            papers: Set(serde_json::to_value(&author.papers)?),
            vectorized_papers: Set(serde_json::to_value(&author.vectorized_papers)?),
            history: Set(serde_json::to_value(&author.history)?),
        };

        AuthorEntity::insert(model)
            .exec_without_returning(self.write_conn())
            .await
            .map_err(|e| insert_error(e, "Author", &id))?;
        Ok(())
    }
}

/// Bind parameters per VALUES row in [`bulk_update_statement`]
const BIND_PARAMS_PER_UPDATE: usize = 3;

/// PostgreSQL caps a statement at 65535 bind parameters
const MAX_UPDATES_PER_STATEMENT: usize = u16::MAX as usize / BIND_PARAMS_PER_UPDATE;

/// One `UPDATE ... FROM (VALUES ...)` covering every update in `updates`
fn bulk_update_statement(updates: &[AuthorUpdate]) -> Statement {
    let mut rows = Vec::with_capacity(updates.len());
    let mut values: Vec<sea_orm::Value> = Vec::with_capacity(updates.len() * BIND_PARAMS_PER_UPDATE);
    for (i, update) in updates.iter().enumerate() {
        let base = i * BIND_PARAMS_PER_UPDATE;
        rows.push(format!(
            "(${}::text, ${}::int4, ${}::bool)",
            base + 1,
            base + 2,
            base + 3
        ));
        let AuthorPatch::SetHIndex(h_index) = update.patch;
        let only_missing = matches!(update.filter, AuthorMatch::IdWithoutHIndex(_));
        values.push(update.filter.author_id().to_string().into());
        values.push(h_index_column(h_index).into());
        values.push(only_missing.into());
    }

    let sql = format!(
        r#"
        UPDATE authors AS a
        SET h_index = v.h_index
        FROM (VALUES {}) AS v(id, h_index, only_missing)
        WHERE a.id = v.id
          AND (NOT v.only_missing OR a.h_index IS NULL)
        "#,
        rows.join(", ")
    );
    Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
}
