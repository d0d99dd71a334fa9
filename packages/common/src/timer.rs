//! # Timer Slots
//!
//! A [`TimerSlot`] holds at most one pending deadline. Arming the slot hands
//! out a [`TimerToken`]; re-arming or cancelling invalidates every token
//! issued before, so a timer task that wakes up late can check
//! [`TimerSlot::fire`] and do nothing when it has been superseded.
//!
//! Deadline-driven state machines (alert queues, binding reverts, chat fade)
//! use [`TimerSlot::fire_due`] instead, polling with the current instant.

use tokio::time::{Duration, Instant};

/// Identifies one arming of a [`TimerSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// A single cancellable deadline.
#[derive(Debug, Default)]
pub struct TimerSlot {
    generation: u64,
    deadline: Option<Instant>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot to fire `after` from `now`, superseding any earlier arming.
    /// A deadline past the clock's range never fires.
    pub fn arm(&mut self, now: Instant, after: Duration) -> TimerToken {
        self.generation += 1;
        self.deadline = now.checked_add(after);
        TimerToken(self.generation)
    }

    /// Cancel the pending deadline. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.generation += 1;
        self.deadline.take().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether `token` belongs to the arming that is still pending.
    pub fn is_current(&self, token: TimerToken) -> bool {
        self.deadline.is_some() && token.0 == self.generation
    }

    /// Consume the pending deadline if `token` is still current.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        if self.is_current(token) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    /// Consume the pending deadline if it has passed at `now`.
    pub fn fire_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if at <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Earliest of two optional deadlines.
pub fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
