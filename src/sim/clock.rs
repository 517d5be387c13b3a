//! Logical-time timer queue
//!
//! Time is in milliseconds and only moves when the owner pops due timers or
//! advances the clock. Timers due at the same instant fire in scheduling order.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

/// Deterministic timer queue keyed by `(due, sequence)`
#[derive(Debug, Clone)]
pub struct Scheduler<K> {
    now: u64,
    next_seq: u64,
    queue: BTreeMap<(u64, u64), K>,
    due_by_id: HashMap<TimerId, u64>,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Scheduler<K> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
            due_by_id: HashMap::new(),
        }
    }

    /// Current logical time
    #[inline]
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Schedule `kind` to fire at absolute time `at` (clamped to now)
    pub fn schedule_at(&mut self, at: u64, kind: K) -> TimerId {
        let at = at.max(self.now);
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = TimerId(seq);
        self.queue.insert((at, seq), kind);
        self.due_by_id.insert(id, at);
        id
    }

    /// Schedule `kind` to fire `delay` ms from now
    pub fn schedule_in(&mut self, delay: u64, kind: K) -> TimerId {
        self.schedule_at(self.now.saturating_add(delay), kind)
    }

    /// Cancel a pending timer; returns false if it already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_by_id.remove(&id) {
            Some(at) => self.queue.remove(&(at, id.0)).is_some(),
            None => false,
        }
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.queue.clear();
        self.due_by_id.clear();
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to its due time
    pub fn pop_due(&mut self, until: u64) -> Option<(TimerId, K)> {
        let (&(at, seq), _) = self.queue.first_key_value()?;
        if at > until {
            return None;
        }
        let kind = self.queue.remove(&(at, seq))?;
        let id = TimerId(seq);
        self.due_by_id.remove(&id);
        self.now = self.now.max(at);
        Some((id, kind))
    }

    /// Move the clock forward without firing anything
    pub fn advance_to(&mut self, t: u64) {
        self.now = self.now.max(t);
    }

    /// Due time of a pending timer
    pub fn due_of(&self, id: TimerId) -> Option<u64> {
        self.due_by_id.get(&id).copied()
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&self) -> Option<u64> {
        self.queue.first_key_value().map(|(&(at, _), _)| at)
    }
}
