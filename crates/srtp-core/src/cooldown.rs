//! Per-subject self-teleport cooldowns.

use srtp_types::SubjectId;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// In-memory map of subject → instant after which the next self-teleport is
/// allowed.
///
/// Entries are created on the first committed self-teleport and overwritten
/// afterwards; nothing is evicted or persisted, so a restart clears every
/// cooldown.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    next_eligible: Mutex<HashMap<SubjectId, Instant>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HashMap<SubjectId, Instant>> {
        match self.next_eligible.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A stale entry only delays or allows one teleport.
                tracing::error!("cooldown lock poisoned, recovering with stale state");
                poisoned.into_inner()
            }
        }
    }

    pub fn get(&self, subject: SubjectId) -> Option<Instant> {
        self.state().get(&subject).copied()
    }

    pub fn set(&self, subject: SubjectId, next_eligible_at: Instant) {
        self.state().insert(subject, next_eligible_at);
    }

    /// Time left before `subject` may self-teleport again, if any.
    pub fn remaining(&self, subject: SubjectId, now: Instant) -> Option<Duration> {
        self.get(subject)
            .filter(|at| *at > now)
            .map(|at| at - now)
    }

    pub fn len(&self) -> usize {
        self.state().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_subject_has_no_cooldown() {
        let tracker = CooldownTracker::new();
        assert_eq!(tracker.get(SubjectId::new_v4()), None);
        assert!(tracker.is_empty());
    }

    #[test]
    fn remaining_counts_down_and_expires() {
        let tracker = CooldownTracker::new();
        let subject = SubjectId::new_v4();
        let now = Instant::now();
        tracker.set(subject, now + Duration::from_secs(30));

        assert_eq!(
            tracker.remaining(subject, now + Duration::from_secs(10)),
            Some(Duration::from_secs(20))
        );
        assert_eq!(tracker.remaining(subject, now + Duration::from_secs(30)), None);
        assert_eq!(tracker.remaining(subject, now + Duration::from_secs(31)), None);
    }

    #[test]
    fn set_overwrites_previous_deadline() {
        let tracker = CooldownTracker::new();
        let subject = SubjectId::new_v4();
        let now = Instant::now();

        tracker.set(subject, now + Duration::from_secs(5));
        tracker.set(subject, now + Duration::from_secs(60));

        assert_eq!(tracker.get(subject), Some(now + Duration::from_secs(60)));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn subjects_are_independent() {
        let tracker = CooldownTracker::new();
        let a = SubjectId::new_v4();
        let b = SubjectId::new_v4();
        let now = Instant::now();

        tracker.set(a, now + Duration::from_secs(30));
        assert!(tracker.remaining(a, now).is_some());
        assert!(tracker.remaining(b, now).is_none());
    }
}
