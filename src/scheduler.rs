//! Virtual-time scheduler.
//!
//! Timers live in an explicit queue owned by their caller instead of the
//! ambient event loop, so time only moves when `advance_to` / `pop_due` are
//! called. Tests drive it deterministically; the demo binary maps wall-clock
//! time onto it.
//!
//! Ordering: timers fire by due time; timers with the same due time fire in
//! the order they were scheduled.

use std::time::Duration;

/// Handle returned by `schedule_*`, used for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Clone, Debug)]
struct Entry<K> {
    id: TimerId,
    due: Duration,
    seq: u64,
    period: Option<Duration>,
    payload: K,
}

/// A queue of delayed and periodic callbacks over a virtual clock.
#[derive(Debug)]
pub struct Scheduler<K> {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    entries: Vec<Entry<K>>,
}

impl<K: Clone> Scheduler<K> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            next_seq: 0,
            entries: Vec::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn schedule_once(&mut self, delay: Duration, payload: K) -> TimerId {
        self.insert(delay, None, payload)
    }

    /// Fires first after `period`, then every `period` until cancelled.
    pub fn schedule_repeating(&mut self, period: Duration, payload: K) -> TimerId {
        self.insert(period, Some(period), payload)
    }

    /// Cancel a timer. Returns false if it already fired or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        before != self.entries.len()
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its due time. Repeating timers are re-armed one period later.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, K)> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= until)
            .min_by_key(|(_, entry)| (entry.due, entry.seq))
            .map(|(index, _)| index)?;

        let due = self.entries[index].due;
        if due > self.now {
            self.now = due;
        }

        match self.entries[index].period {
            Some(period) => {
                let seq = self.bump_seq();
                let entry = &mut self.entries[index];
                // A zero period would spin forever inside one advance.
                entry.due = due + period.max(Duration::from_millis(1));
                entry.seq = seq;
                Some((entry.id, entry.payload.clone()))
            }
            None => {
                let entry = self.entries.swap_remove(index);
                Some((entry.id, entry.payload))
            }
        }
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn advance_to(&mut self, t: Duration) {
        if t > self.now {
            self.now = t;
        }
    }

    fn insert(&mut self, delay: Duration, period: Option<Duration>, payload: K) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.bump_seq();
        self.entries.push(Entry {
            id,
            due: self.now + delay,
            seq,
            period,
            payload,
        });
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl<K: Clone> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}
