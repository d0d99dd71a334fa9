use std::collections::BTreeSet;

use overlay_model::{AlertBoxConfig, AlertKind};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::DisplayQueue;

/// A stream alert as delivered on the `alert` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Banner text shown above the alert's username.
pub fn headline(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Follow => "NEW FOLLOWER!",
        AlertKind::Subscribe => "NEW SUBSCRIBER!",
        AlertKind::Donation => "DONATION!",
        AlertKind::Raid => "INCOMING RAID!",
    }
}

/// Live state of one alert box: alerts of allowed kinds, one at a time.
#[derive(Debug)]
pub struct AlertQueue {
    allowed: BTreeSet<AlertKind>,
    queue: DisplayQueue<Alert>,
}

impl AlertQueue {
    pub fn new(config: &AlertBoxConfig) -> Self {
        Self {
            allowed: config.alert_types.clone(),
            queue: DisplayQueue::new(config.display_duration(), None),
        }
    }

    pub fn reconfigure(&mut self, config: &AlertBoxConfig) {
        self.allowed = config.alert_types.clone();
        self.queue.reconfigure(config.display_duration(), None);
    }

    /// Queue `alert` if its kind is allowed. Returns whether it was accepted.
    pub fn on_alert(&mut self, alert: Alert, now: Instant) -> bool {
        if !self.allowed.contains(&alert.kind) {
            return false;
        }
        self.queue.push(alert, now);
        true
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.queue.tick(now)
    }

    pub fn current(&self) -> Option<&Alert> {
        self.queue.current()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.pending_len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }
}
