//! Database layer for Citegraph
//!
//! Provides:
//! - SeaORM entity models for papers, authors and venues
//! - The PostgreSQL-backed corpus store
//! - Connection pool management and schema migrations

pub mod models;
mod repository;

pub use repository::Repository;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sqlx::migrate::Migrator;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Primary plus optional read replica. Scans and lookups go to the replica,
/// bulk writes and history appends to the primary.
#[derive(Clone)]
pub struct DbPool {
    pub primary: DatabaseConnection,
    pub replica: Option<DatabaseConnection>,
}

fn connect_options(url: &str, config: &DatabaseConfig) -> ConnectOptions {
    let mut opts = ConnectOptions::new(url);
    opts.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .sqlx_logging(false);
    opts
}

impl DbPool {
    /// Connect the primary and, if configured, the replica
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to primary database...");

        let primary = Database::connect(connect_options(&config.url, config))
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect to primary: {}", e)
            })?;

        let replica = match config.read_url {
            Some(ref read_url) => {
                info!("Connecting to read replica...");
                let conn = Database::connect(connect_options(read_url, config))
                    .await
                    .map_err(|e| AppError::DatabaseConnection {
                        message: format!("Failed to connect to replica: {}", e)
                    })?;
                Some(conn)
            }
            None => None,
        };

        info!(replica = replica.is_some(), "Database connections established");

        Ok(Self { primary, replica })
    }

    pub fn read(&self) -> &DatabaseConnection {
        self.replica.as_ref().unwrap_or(&self.primary)
    }

    pub fn write(&self) -> &DatabaseConnection {
        &self.primary
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.primary
            .ping()
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Primary ping failed: {}", e),
            })?;

        if let Some(ref replica) = self.replica {
            replica
                .ping()
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Replica ping failed: {}", e),
                })?;
        }

        Ok(())
    }

    /// Apply pending SQL migrations from `dir` on the primary
    pub async fn migrate(&self, dir: &Path) -> Result<()> {
        let migrator = Migrator::new(dir).await.map_err(|e| AppError::Internal {
            message: format!("Failed to load migrations from {}: {}", dir.display(), e),
        })?;

        info!(
            migrations = migrator.iter().count(),
            dir = %dir.display(),
            "Running database migrations"
        );

        migrator
            .run(self.primary.get_postgres_connection_pool())
            .await
            .map_err(|e| AppError::Internal {
                message: format!("Migration failed: {}", e),
            })?;

        info!("Migrations applied");
        Ok(())
    }
}
