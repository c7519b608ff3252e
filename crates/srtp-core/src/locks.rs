//! Per-subject serialization of the check-then-commit window.

use srtp_types::SubjectId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<()>>;

/// Lazily created async mutex per subject.
///
/// Entries are removed when the last guard for a subject is released, so the
/// map only holds subjects with a request in flight.
#[derive(Default)]
pub(crate) struct SubjectLocks {
    slots: Mutex<HashMap<SubjectId, Slot>>,
}

impl SubjectLocks {
    fn slots(&self) -> MutexGuard<'_, HashMap<SubjectId, Slot>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Waits until no other request for `subject` holds the lock.
    pub(crate) async fn lock(&self, subject: SubjectId) -> SubjectGuard<'_> {
        let slot = Arc::clone(self.slots().entry(subject).or_default());
        let guard = slot.lock_owned().await;
        SubjectGuard {
            owner: self,
            subject,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.slots().len()
    }
}

pub(crate) struct SubjectGuard<'a> {
    owner: &'a SubjectLocks,
    subject: SubjectId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SubjectGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self.owner.slots();
        // Only the map itself still refers to the slot: nobody is waiting.
        if slots
            .get(&self.subject)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.subject);
        }
    }
}
