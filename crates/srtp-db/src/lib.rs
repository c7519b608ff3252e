//! Database layer for SimpleRTP.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations. The only durable state the core owns is the
//! single-use flag table; the remaining tables back the standalone host's
//! players, grants and ledger.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, open_database, DbError, DbPool, DbRuntimeSettings, PoolError};
