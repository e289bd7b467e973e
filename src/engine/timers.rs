//! Virtual-clock scheduler.
//!
//! Every delay the engine waits on goes through one queue: a wakeup is
//! scheduled with a delay and comes back as a token that can cancel it.
//! Time only moves when the owner pops due entries, which makes timing
//! fully deterministic under test and lets a wall-clock driver sleep until
//! [`TimerQueue::next_due`].

use std::collections::BTreeMap;
use std::time::Duration;

use crate::page::ElementId;

/// Handle to one scheduled wakeup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

/// What the engine should do when a timer fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wakeup {
    /// Pre-step delay elapsed; run the current step's action
    ExecuteStep,
    /// Dwell or fill-settle elapsed; move to the next step
    Advance,
    /// Emit the next character of an in-progress fill
    TypeChar,
    /// Invoke the click behavior of a highlighted element
    Click(ElementId),
    /// Leave the current document
    Navigate(String),
    DismissNotice,
    /// Resume the tour found in the session on page load
    Resume,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    // Ordered by due time, then by scheduling order
    pending: BTreeMap<(Duration, u64), Wakeup>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the queue was created
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, wakeup: Wakeup) -> TimerToken {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert((self.now + delay, id), wakeup);
        TimerToken(id)
    }

    /// Cancel a pending wakeup. Returns false if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let key = self.pending.keys().find(|(_, id)| *id == token.0).copied();
        match key {
            Some(key) => self.pending.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.keys().any(|(_, id)| *id == token.0)
    }

    /// Absolute time of the earliest pending wakeup
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Pop the earliest wakeup due at or before `until`, moving the clock
    /// to its due time
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerToken, Wakeup)> {
        let (&(due, id), _) = self.pending.iter().next()?;
        if due > until {
            return None;
        }
        let wakeup = self.pending.remove(&(due, id))?;
        self.now = self.now.max(due);
        Some((TimerToken(id), wakeup))
    }

    /// Move the clock forward without firing anything
    pub fn advance_clock(&mut self, to: Duration) {
        self.now = self.now.max(to);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every pending wakeup
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
