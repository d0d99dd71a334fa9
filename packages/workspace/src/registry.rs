//! # Event registry
//!
//! Fans transport events out to in-process handlers.
//!
//! The registry installs one transport listener per distinct event name,
//! on the first subscription to that name, and removes it with the last.
//! All listeners feed one channel drained by a dispatcher task, which
//! calls the handlers for each envelope outside of any lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::transport::{Envelope, ListenerId, Transport};

pub type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

struct Entry {
    listener: ListenerId,
    handlers: Vec<(u64, Handler)>,
}

struct RegistryInner {
    transport: Arc<dyn Transport>,
    sink: mpsc::UnboundedSender<Envelope>,
    entries: Mutex<HashMap<String, Entry>>,
    next_id: AtomicU64,
}

impl RegistryInner {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, event: &str, id: u64) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(event) else {
            return;
        };
        entry.handlers.retain(|(handler_id, _)| *handler_id != id);
        if entry.handlers.is_empty() {
            let listener = entry.listener;
            entries.remove(event);
            self.transport.unlisten(event, listener);
            debug!(event, "removed transport listener");
        }
    }

    fn dispatch(&self, envelope: &Envelope) {
        let handlers: Vec<Handler> = match self.lock().get(&envelope.event) {
            Some(entry) => entry.handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => return,
        };
        trace!(event = %envelope.event, handlers = handlers.len(), "dispatching");
        for handler in handlers {
            handler(&envelope.payload);
        }
    }
}

/// Reference-counted subscriptions over a [`Transport`].
///
/// Cloning is cheap; clones share subscriptions. Must be created inside a
/// tokio runtime.
#[derive(Clone)]
pub struct EventRegistry {
    inner: Arc<RegistryInner>,
}

impl EventRegistry {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (sink, mut rx) = mpsc::unbounded_channel::<Envelope>();
        let inner = Arc::new(RegistryInner {
            transport,
            sink,
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        });

        let weak = Arc::downgrade(&inner);
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.dispatch(&envelope);
            }
        });

        Self { inner }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// Call `handler` for every `event` until the returned subscription is
    /// dropped.
    pub fn subscribe<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let handler: Handler = Arc::new(handler);
        let mut entries = self.inner.lock();
        let entry = entries.entry(event.to_string()).or_insert_with(|| {
            debug!(event, "installed transport listener");
            Entry {
                listener: self.inner.transport.listen(event, self.inner.sink.clone()),
                handlers: Vec::new(),
            }
        });
        entry.handlers.push((id, handler));

        Subscription {
            registry: Arc::downgrade(&self.inner),
            event: event.to_string(),
            id,
        }
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.inner.lock().get(event).map_or(0, |e| e.handlers.len())
    }

    /// Names with at least one subscriber
    pub fn events(&self) -> Vec<String> {
        let mut names: Vec<_> = self.inner.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

/// Handle for one handler. Dropping it unsubscribes.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Weak<RegistryInner>,
    event: String,
    id: u64,
}

impl Subscription {
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.event, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .finish()
    }
}
