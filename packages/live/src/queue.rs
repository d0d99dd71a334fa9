//! # Display Queue
//!
//! FIFO with a single *current* slot. The head of the queue is promoted to
//! current as soon as the slot is free; current clears itself `duration`
//! after it was shown, which promotes the next item.
//!
//! ```text
//! push ──▶ [pending …] ──promote──▶ current ──duration──▶ (cleared)
//! ```
//!
//! The queue never sleeps on its own. Callers pass the current instant to
//! [`DisplayQueue::push`] and [`DisplayQueue::tick`], and use
//! [`DisplayQueue::next_deadline`] to decide when to tick next.

use std::collections::VecDeque;

use overlay_common::TimerSlot;
use tokio::time::{Duration, Instant};

#[derive(Debug)]
pub struct DisplayQueue<T> {
    pending: VecDeque<T>,
    current: Option<T>,
    duration: Duration,
    /// Bound on pending items; the oldest are dropped first.
    capacity: Option<usize>,
    dismiss: TimerSlot,
}

impl<T> DisplayQueue<T> {
    pub fn new(duration: Duration, capacity: Option<usize>) -> Self {
        Self {
            pending: VecDeque::new(),
            current: None,
            duration,
            capacity,
            dismiss: TimerSlot::new(),
        }
    }

    /// Enqueue an item, showing it right away if nothing is current.
    pub fn push(&mut self, item: T, now: Instant) {
        self.pending.push_back(item);
        self.enforce_capacity();
        if self.current.is_none() {
            self.promote(now);
        }
    }

    /// Clear the current item if its time is up. Returns whether anything
    /// visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.dismiss.fire_due(now) {
            return false;
        }
        self.current = None;
        self.promote(now);
        true
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.dismiss.deadline()
    }

    /// Change timing and bound. The item on display keeps its deadline.
    pub fn reconfigure(&mut self, duration: Duration, capacity: Option<usize>) {
        self.duration = duration;
        self.capacity = capacity;
        self.enforce_capacity();
    }

    fn promote(&mut self, now: Instant) {
        self.current = self.pending.pop_front();
        if self.current.is_some() {
            self.dismiss.arm(now, self.duration);
        } else {
            self.dismiss.cancel();
        }
    }

    fn enforce_capacity(&mut self) {
        if let Some(capacity) = self.capacity {
            while self.pending.len() > capacity {
                self.pending.pop_front();
            }
        }
    }
}
