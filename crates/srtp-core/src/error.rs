//! Error types for the random-teleport core.

use srtp_types::SubjectId;

/// Faults reported by host adapters.
///
/// These never escape the orchestrator; each is mapped onto the nearest
/// [`srtp_types::Outcome`].
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The subject is no longer online.
    #[error("subject {0} is not online")]
    Offline(SubjectId),

    /// The requested world is not loaded.
    #[error("world not loaded: {0}")]
    UnknownWorld(String),

    /// The backing service could not answer.
    #[error("host unavailable: {0}")]
    Unavailable(String),

    /// A database operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No pooled connection could be checked out.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

/// Errors from submitting work to the [`crate::CommitQueue`].
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    /// The queue worker has shut down.
    #[error("commit queue is closed")]
    Closed,

    /// The job was accepted but never produced a result (it panicked).
    #[error("commit job was dropped before completing")]
    Dropped,
}
