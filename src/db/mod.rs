//! Database module for persistent storage.
//!
//! Provides async SQLite database access using SQLx for:
//! - People and groups (stream owners)
//! - Activities and comments
//! - Hashtags and their per-stream associations
//! - Usage metrics and daily usage summaries
//! - Start page tabs and gadgets
//!
//! Each repository wraps the queries for one table family. Repositories borrow
//! the pool and are cheap to construct per call.

mod activities;
mod groups;
mod hashtags;
mod people;
mod tabs;
pub mod usage;

pub use activities::{ActivityRepository, NewActivity};
pub use groups::GroupRepository;
pub use hashtags::HashTagRepository;
pub use people::{Person, PersonRepository};
pub use tabs::{GadgetUndeletionError, Tab, TabRepository};
pub use usage::{DailyUsageSummary, UsageRepository};

use sqlx::SqlitePool;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
    #[error("migration error: {0}")]
    Migration(sqlx::migrate::MigrateError),
    #[error("account already exists: {0}")]
    AccountExists(String),
    #[error("group already exists: {0}")]
    GroupExists(String),
    #[error("activity not found: {0}")]
    ActivityNotFound(i64),
    #[error("gadget not found: {0}")]
    GadgetNotFound(i64),
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Open (or create) the database at `path` and apply migrations.
    ///
    /// `":memory:"` opens a private in-memory database, distinct per call.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        let (options, max_connections) = if path == ":memory:" {
            (Self::memory_options(), 1)
        } else {
            (Self::file_options(path), 5)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .idle_timeout(Some(Self::IDLE_TIMEOUT))
            .test_before_acquire(true)
            .connect_with(options.foreign_keys(true))
            .await?;

        info!(path = %path, max_connections, "Database connected");

        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// A shared-cache memory URI unique to this process and call.
    fn memory_options() -> SqliteConnectOptions {
        let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
        let uri = format!(
            "file:eureka-memdb-{}-{}?mode=memory&cache=shared",
            std::process::id(),
            id
        );
        SqliteConnectOptions::new()
            .filename(uri)
            .shared_cache(true)
            .create_if_missing(true)
    }

    /// File database in WAL mode so summary writes do not block readers.
    fn file_options(path: &str) -> SqliteConnectOptions {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(path = %parent.display(), error = %e, "Failed to create database directory");
        }

        SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
    }

    /// Run embedded migrations.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(DbError::Migration)?;

        info!("Database migrations checked/applied");
        Ok(())
    }

    /// Get person repository.
    pub fn people(&self) -> PersonRepository<'_> {
        PersonRepository::new(&self.pool)
    }

    /// Get group repository.
    pub fn groups(&self) -> GroupRepository<'_> {
        GroupRepository::new(&self.pool)
    }

    /// Get activity repository.
    pub fn activities(&self) -> ActivityRepository<'_> {
        ActivityRepository::new(&self.pool)
    }

    /// Get hashtag repository.
    pub fn hashtags(&self) -> HashTagRepository<'_> {
        HashTagRepository::new(&self.pool)
    }

    /// Get usage metric repository.
    pub fn usage(&self) -> UsageRepository<'_> {
        UsageRepository::new(&self.pool)
    }

    /// Get tab and gadget repository.
    pub fn tabs(&self) -> TabRepository<'_> {
        TabRepository::new(&self.pool)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Sqlx(err)
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err)
    }
}

/// True when the error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
