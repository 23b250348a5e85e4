// Deadline tables for cosmetic timers (vote highlights, toasts).

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

/// A set of keyed deadlines. Owners arm entries with `set` and harvest them
/// with `take_expired` on each loop tick. Clearing or re-arming an entry is
/// always safe, and taking an entry that is already gone is a no-op.
#[derive(Debug)]
pub struct Deadlines<K> {
    deadlines: HashMap<K, Instant>,
}

impl<K> Default for Deadlines<K> {
    fn default() -> Self {
        Deadlines {
            deadlines: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> Deadlines<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) `key` to fire `after` from `now`.
    pub fn set(&mut self, key: K, now: Instant, after: Duration) {
        self.deadlines.insert(key, now + after);
    }

    /// Disarm `key`. Returns whether it was still pending.
    pub fn clear(&mut self, key: &K) -> bool {
        self.deadlines.remove(key).is_some()
    }

    pub fn clear_all(&mut self) {
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Remove and return every key whose deadline is at or before `now`.
    #[must_use]
    pub fn take_expired(&mut self, now: Instant) -> Vec<K> {
        let expired: Vec<K> = self
            .deadlines
            .iter()
            .filter_map(|(key, &at)| (at <= now).then(|| key.clone()))
            .collect();
        for key in &expired {
            self.deadlines.remove(key);
        }
        expired
    }
}
