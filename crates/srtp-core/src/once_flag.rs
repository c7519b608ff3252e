//! Persistent "already used the single-use teleport" flags.
//!
//! A flag is set once, on the first committed single-use-tier teleport, and
//! never cleared here. Clearing is an administrative action.

use rusqlite::{params, Connection};
use srtp_db::DbPool;
use srtp_types::SubjectId;

use crate::error::PortError;

/// Storage for single-use flags.
pub trait OnceFlagStore: Send + Sync {
    fn has_used(&self, subject: SubjectId) -> Result<bool, PortError>;

    /// Sets the flag. Setting an already-set flag is a no-op.
    fn mark_used(&self, subject: SubjectId) -> Result<(), PortError>;
}

/// Checks whether `subject` has spent its single-use teleport.
///
/// # Errors
///
/// Returns [`PortError::Database`] if the query fails.
pub fn has_used_once(conn: &Connection, subject: SubjectId) -> Result<bool, PortError> {
    let used: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM rtp_once_flags WHERE subject_id = ?1)",
        params![subject.to_string()],
        |row| row.get(0),
    )?;
    Ok(used)
}

/// Records that `subject` has spent its single-use teleport.
///
/// # Errors
///
/// Returns [`PortError::Database`] if the insert fails.
pub fn mark_used_once(conn: &Connection, subject: SubjectId) -> Result<(), PortError> {
    conn.execute(
        "INSERT OR IGNORE INTO rtp_once_flags (subject_id) VALUES (?1)",
        params![subject.to_string()],
    )?;
    Ok(())
}

/// [`OnceFlagStore`] backed by the `rtp_once_flags` table.
#[derive(Clone)]
pub struct SqliteOnceFlagStore {
    pool: DbPool,
}

impl SqliteOnceFlagStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OnceFlagStore for SqliteOnceFlagStore {
    fn has_used(&self, subject: SubjectId) -> Result<bool, PortError> {
        let conn = self.pool.get()?;
        has_used_once(&conn, subject)
    }

    fn mark_used(&self, subject: SubjectId) -> Result<(), PortError> {
        let conn = self.pool.get()?;
        mark_used_once(&conn, subject)
    }
}
