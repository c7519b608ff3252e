//! Single-consumer queue on which every world-mutating commit runs.
//!
//! Commits are executed one at a time, in submission order. One worker task
//! drains the queue and runs each job on the blocking pool, since commits
//! call synchronous ports. Callers await the result through a oneshot
//! channel.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::CommitError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle for submitting commits. Cheap to clone.
#[derive(Clone)]
pub struct CommitQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl CommitQueue {
    /// Spawns the worker on the current runtime.
    ///
    /// The worker exits once every handle has been dropped.
    pub fn start() -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        let worker = tokio::spawn(async move {
            tracing::debug!("commit queue started");
            while let Some(job) = rx.recv().await {
                if let Err(e) = tokio::task::spawn_blocking(job).await {
                    tracing::error!(error = %e, "commit job panicked");
                }
            }
            tracing::debug!("commit queue stopped");
        });

        (Self { tx }, worker)
    }

    /// Runs `f` on the worker and waits for its result.
    ///
    /// # Errors
    ///
    /// [`CommitError::Closed`] if the worker is gone, [`CommitError::Dropped`]
    /// if `f` panicked.
    pub async fn run<F, T>(&self, f: F) -> Result<T, CommitError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply, result) = oneshot::channel();
        self.tx
            .send(Box::new(move || {
                let _ = reply.send(f());
            }))
            .map_err(|_| CommitError::Closed)?;
        result.await.map_err(|_| CommitError::Dropped)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
