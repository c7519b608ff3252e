//! Connection pool creation and configuration.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use thiserror::Error;

use crate::migrations::{run_migrations, MigrationError};

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

/// A type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Errors that can occur when creating the database pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Failed to build the connection pool.
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Errors from [`open_database`].
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("failed to check out a connection: {0}")]
    Checkout(#[from] r2d2::Error),

    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// Creates a new SQLite connection pool with WAL mode and the configured
/// busy timeout.
///
/// `:memory:` gives every pooled connection its own private database, so
/// in-memory pools should use `pool_max_size: 1`.
///
/// # Errors
///
/// Returns `PoolError::PoolInit` if the connection pool cannot be created.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(flags)
        .with_init(move |conn| {
            // In-memory databases report "memory", which is fine.
            let journal_mode: String =
                conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
            if journal_mode != "wal" && journal_mode != "memory" {
                return Err(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                    Some(format!(
                        "failed to set WAL journal mode, got: {}",
                        journal_mode
                    )),
                ));
            }
            conn.execute_batch(&format!(
                "PRAGMA busy_timeout = {};",
                settings.busy_timeout_ms
            ))
        });

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?;

    Ok(pool)
}

/// Creates a pool and applies all pending migrations.
///
/// # Errors
///
/// Returns `DbError` if the pool cannot be built, a connection cannot be
/// checked out, or a migration fails.
pub fn open_database(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, DbError> {
    let pool = create_pool(db_path, settings)?;
    {
        let conn = pool.get()?;
        let applied = run_migrations(&conn)?;
        if applied > 0 {
            tracing::info!(count = applied, path = db_path, "applied database migrations");
        }
    }
    Ok(pool)
}
