//! # Transport
//!
//! Named events with JSON payloads. Delivery is at-least-once with no
//! ordering across distinct event names.
//!
//! [`LocalTransport`] delivers in-process. Besides per-name listeners it
//! keeps a broadcast tap that sees every envelope, which the server uses
//! for logging and tests use to observe traffic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tracing::trace;

/// Well-known event names.
pub mod events {
    pub const SCENE_UPDATED: &str = "scene-updated";
    pub const SCENE_ACTIVATED: &str = "scene-activated";
    /// Payload: `{"id": <scene id>}`
    pub const SCENE_DELETED: &str = "scene-deleted";
    pub use overlay_live::{ALERT_EVENT as ALERT, CHAT_EVENT as CHAT_MESSAGE};
}

/// One published event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

pub trait Transport: Send + Sync {
    fn publish(&self, event: &str, payload: Value);

    /// Forward every `event` to `sink` until [`Transport::unlisten`].
    fn listen(&self, event: &str, sink: mpsc::UnboundedSender<Envelope>) -> ListenerId;

    /// Returns false if the listener was not registered.
    fn unlisten(&self, event: &str, id: ListenerId) -> bool;
}

pub const DEFAULT_TAP_CAPACITY: usize = 1024;

type Listeners = HashMap<String, Vec<(ListenerId, mpsc::UnboundedSender<Envelope>)>>;

/// In-process transport.
pub struct LocalTransport {
    listeners: Mutex<Listeners>,
    next_id: AtomicU64,
    tap: broadcast::Sender<Envelope>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::with_tap_capacity(DEFAULT_TAP_CAPACITY)
    }

    pub fn with_tap_capacity(capacity: usize) -> Self {
        let (tap, _) = broadcast::channel(capacity);
        Self {
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            tap,
        }
    }

    /// Receive a copy of every published envelope.
    pub fn tap(&self) -> broadcast::Receiver<Envelope> {
        self.tap.subscribe()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.lock().get(event).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LocalTransport {
    fn publish(&self, event: &str, payload: Value) {
        let envelope = Envelope::new(event, payload);
        {
            let mut listeners = self.lock();
            if let Some(sinks) = listeners.get_mut(event) {
                // Receivers that went away are pruned
                sinks.retain(|(_, sink)| sink.send(envelope.clone()).is_ok());
                trace!(event, listeners = sinks.len(), "published");
            }
        }
        // Ignore send errors (no tap subscribers)
        let _ = self.tap.send(envelope);
    }

    fn listen(&self, event: &str, sink: mpsc::UnboundedSender<Envelope>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock()
            .entry(event.to_string())
            .or_default()
            .push((id, sink));
        id
    }

    fn unlisten(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let Some(sinks) = listeners.get_mut(event) else {
            return false;
        };
        let before = sinks.len();
        sinks.retain(|(listener, _)| *listener != id);
        let removed = sinks.len() != before;
        if sinks.is_empty() {
            listeners.remove(event);
        }
        removed
    }
}
