use std::sync::Arc;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::config::StorageConfig;
use crate::repository::{ReviewRecordRepository, Storage, VocabularyRepository};

mod mapping;
mod migrate;
mod review_record_repo;
mod vocabulary_repo;

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL and default pool settings.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the pool cannot open a connection or a
    /// connection pragma fails.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        Self::connect_with(&StorageConfig::new(database_url)).await
    }

    /// Connect to `SQLite` using explicit pool settings.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established.
    pub async fn connect_with(config: &StorageConfig) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA foreign_keys = ON;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(&config.database_url)
            .await?;
        tracing::debug!(
            database_url = %config.database_url,
            max_connections = config.max_connections,
            "sqlite pool ready"
        );
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply any schema migrations not yet recorded in `schema_migrations`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Open and migrate a `SQLite` database, serving both repositories from one pool.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        Self::sqlite_with(&StorageConfig::new(database_url)).await
    }

    /// Build a `SQLite`-backed `Storage` from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite_with(config: &StorageConfig) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect_with(config).await?;
        repo.migrate().await?;
        let vocabulary: Arc<dyn VocabularyRepository> = Arc::new(repo.clone());
        let reviews: Arc<dyn ReviewRecordRepository> = Arc::new(repo);
        Ok(Self {
            vocabulary,
            reviews,
        })
    }
}
