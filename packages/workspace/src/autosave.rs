//! # Autosave bookkeeping
//!
//! Synchronous pieces of the save pipeline: how long to back off between
//! attempts, and which save results may update the per-scene baseline.
//!
//! The baseline is the snapshot last confirmed by storage. A scene equal to
//! its baseline needs no write. Every save takes a [`SaveTicket`] with a
//! sequence number; a response is only applied if no newer response for the
//! same scene has been applied already.

use std::collections::HashMap;
use std::time::Duration;

use overlay_model::{Scene, SceneId, SceneSnapshot};
use serde::{Deserialize, Serialize};

/// Exponential backoff for failed storage writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: u32,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay_ms: 250,
            backoff_factor: 2,
            max_delay_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that gives up after the first failure.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0 = first retry).
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = u64::from(self.backoff_factor.max(1));
        let millis = factor
            .checked_pow(retry)
            .and_then(|f| f.checked_mul(self.initial_delay_ms))
            .unwrap_or(u64::MAX)
            .min(self.max_delay_ms);
        Duration::from_millis(millis)
    }

    /// Whether another attempt is allowed after `attempts` have failed.
    pub fn allows_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts.max(1)
    }
}

/// Handed out when a save starts, returned when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTicket {
    pub scene_id: SceneId,
    pub seq: u64,
}

#[derive(Debug, Default)]
pub struct SaveTracker {
    baselines: HashMap<SceneId, SceneSnapshot>,
    next_seq: u64,
    applied: HashMap<SceneId, u64>,
}

impl SaveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset baselines to what storage just returned.
    pub fn reset(&mut self, scenes: &[Scene]) {
        self.baselines = scenes
            .iter()
            .filter_map(|scene| Some((scene.id?, scene.snapshot())))
            .collect();
        self.applied.clear();
    }

    pub fn baseline(&self, id: SceneId) -> Option<&SceneSnapshot> {
        self.baselines.get(&id)
    }

    pub fn set_baseline(&mut self, id: SceneId, snapshot: SceneSnapshot) {
        self.baselines.insert(id, snapshot);
    }

    pub fn matches_baseline(&self, id: SceneId, snapshot: &SceneSnapshot) -> bool {
        self.baselines.get(&id) == Some(snapshot)
    }

    pub fn forget(&mut self, id: SceneId) {
        self.baselines.remove(&id);
        self.applied.remove(&id);
    }

    pub fn begin(&mut self, scene_id: SceneId) -> SaveTicket {
        self.next_seq += 1;
        SaveTicket {
            scene_id,
            seq: self.next_seq,
        }
    }

    /// Record a successful save. Returns false for a stale response, which
    /// leaves the baseline alone.
    pub fn complete(&mut self, ticket: SaveTicket, saved: SceneSnapshot) -> bool {
        let applied = self.applied.entry(ticket.scene_id).or_default();
        if ticket.seq < *applied {
            return false;
        }
        *applied = ticket.seq;
        self.baselines.insert(ticket.scene_id, saved);
        true
    }
}
