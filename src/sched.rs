//! Keyed one-shot timers driven by the event loop.
//!
//! Scheduling a key that is already pending replaces the earlier deadline, so
//! every timer kind has at most one outstanding instance.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Rebuild after the conversation root stopped changing.
    StructuralDebounce,
    /// Coalesced scroll handling, due on the next frame.
    ScrollFrame,
    /// End of the quiet period after a programmatic jump.
    NavSuppression,
    /// Restore a label swapped for copy feedback.
    CopyFeedback,
    /// Try to start again once the page has a body.
    InitRetry,
    /// Progress/active refresh shortly after a rebuild.
    ProgressRefresh,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    pending: HashMap<TimerKey, Instant>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, key: TimerKey, now: Instant, delay: Duration) {
        self.pending.insert(key, now + delay);
    }

    /// Schedule for the next frame unless already pending.
    pub fn schedule_frame(&mut self, key: TimerKey, now: Instant) -> bool {
        if self.pending.contains_key(&key) {
            return false;
        }
        self.pending.insert(key, now);
        true
    }

    pub fn cancel(&mut self, key: TimerKey) -> bool {
        self.pending.remove(&key).is_some()
    }

    pub fn is_pending(&self, key: TimerKey) -> bool {
        self.pending.contains_key(&key)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Remove and return every timer whose deadline has passed, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerKey> {
        let mut due: Vec<(Instant, TimerKey)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, deadline)| (*deadline, *key))
            .collect();
        due.sort_by_key(|(deadline, _)| *deadline);
        for (_, key) in &due {
            self.pending.remove(key);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }
}
