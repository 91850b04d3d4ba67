use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::session::SessionId;

/// Unique identifier for a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A one-shot timer owned by a session
#[derive(Debug, Clone)]
struct Timer {
    owner: SessionId,
    fire_at: Instant,
}

/// A timer that came due during [`TimerManager::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub id: TimerId,
    /// Session that scheduled the timer; checked before anything is resumed
    pub owner: SessionId,
}

/// Host timers backing `sleep()`
///
/// Time never advances on its own: callers pass `now` so the host decides
/// whether that is a wall clock or a simulated one.
pub struct TimerManager {
    timers: HashMap<TimerId, Timer>,
    next_id: u64,
}

impl TimerManager {
    /// Create a new timer manager
    pub fn new() -> Self {
        Self {
            timers: HashMap::new(),
            next_id: 0,
        }
    }

    /// Schedule a one-shot timer that fires `delay` after `now`
    pub fn schedule_timer(&mut self, now: Instant, delay: Duration, owner: SessionId) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        let fire_at = now + delay;
        debug!(target: "timers", "Scheduled {:?} for session {} in {:?}", id, owner, delay);
        self.timers.insert(id, Timer { owner, fire_at });
        id
    }

    /// Cancel a timer
    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    /// Cancel every timer scheduled by `owner`, returning how many were pending
    pub fn cancel_owned_by(&mut self, owner: SessionId) -> usize {
        let before = self.timers.len();
        self.timers.retain(|_, timer| timer.owner != owner);
        let cancelled = before - self.timers.len();
        if cancelled > 0 {
            debug!(target: "timers", "Cancelled {} timer(s) of session {}", cancelled, owner);
        }
        cancelled
    }

    /// Remove and return every timer due at `now`, earliest first
    pub fn tick(&mut self, now: Instant) -> Vec<FiredTimer> {
        let mut due: Vec<(Instant, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, timer)| now >= timer.fire_at)
            .map(|(id, timer)| (timer.fire_at, *id))
            .collect();
        due.sort();

        due.into_iter()
            .filter_map(|(_, id)| {
                self.timers
                    .remove(&id)
                    .map(|timer| FiredTimer { id, owner: timer.owner })
            })
            .collect()
    }

    /// Earliest pending deadline, for hosts that sleep until the next timer
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().map(|timer| timer.fire_at).min()
    }

    /// Get the number of active timers
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }
}

impl Default for TimerManager {
    fn default() -> Self {
        Self::new()
    }
}
