//! # Live session
//!
//! Drives an [`overlay_live::LiveRouter`] for the broadcast view:
//!
//! - follows the broadcast scene (or a pinned scene) through
//!   `scene-updated`, `scene-activated` and `scene-deleted`
//! - subscribes to exactly the event names the scene's elements need,
//!   re-syncing the set on every reload
//! - runs one ticker task that sleeps until the router's next deadline (or
//!   the chat fade tick) and wakes early when an event arrives
//!
//! Every visible change is published as a [`LiveFrame`] on a watch channel.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use overlay_common::earliest;
use overlay_live::{LiveRouter, RenderedElement};
use overlay_model::{Scene, SceneId};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::config::WorkspaceConfig;
use crate::error::WorkspaceResult;
use crate::registry::{EventRegistry, Subscription};
use crate::service::SceneService;
use crate::transport::events;

/// Which scene the live view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiveTarget {
    /// Follow the broadcast-active scene.
    #[default]
    Active,
    /// Always show this scene.
    Pinned(SceneId),
}

/// Render model of the live overlay at one moment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveFrame {
    pub scene_id: Option<SceneId>,
    pub width: u32,
    pub height: u32,
    pub elements: Vec<RenderedElement>,
}

impl LiveFrame {
    fn of(router: &LiveRouter) -> Self {
        match router.scene() {
            Some(scene) => Self {
                scene_id: scene.id,
                width: scene.width,
                height: scene.height,
                elements: router.render(),
            },
            None => Self::default(),
        }
    }
}

struct LiveInner {
    target: LiveTarget,
    service: SceneService,
    registry: EventRegistry,
    router: Mutex<LiveRouter>,
    routes: Mutex<HashMap<String, Subscription>>,
    _scene_subscriptions: Mutex<Vec<Subscription>>,
    frames: watch::Sender<LiveFrame>,
    wake: Arc<Notify>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl LiveInner {
    fn show(self: &Arc<Self>, scene: Option<Scene>) {
        let frame = {
            let mut router = lock(&self.router);
            match scene {
                Some(scene) => {
                    debug!(id = ?scene.id, elements = scene.elements.len(), "live scene loaded");
                    router.load_scene(scene);
                }
                None => router.clear(),
            }
            LiveFrame::of(&router)
        };
        self.sync_routes();
        self.frames.send_replace(frame);
        self.wake.notify_one();
    }

    /// Subscribe to every name the router needs, and nothing else.
    fn sync_routes(self: &Arc<Self>) {
        let mut routes = lock(&self.routes);
        let wanted: BTreeSet<String> = lock(&self.router).event_names();

        routes.retain(|name, _| wanted.contains(name));
        for name in wanted {
            if routes.contains_key(&name) {
                continue;
            }
            let weak = Arc::downgrade(self);
            let event = name.clone();
            let subscription = self.registry.subscribe(&name, move |payload| {
                if let Some(inner) = weak.upgrade() {
                    inner.route(&event, payload);
                }
            });
            routes.insert(name, subscription);
        }
    }

    fn route(&self, name: &str, payload: &Value) {
        let frame = {
            let mut router = lock(&self.router);
            router
                .route(name, payload, Instant::now())
                .then(|| LiveFrame::of(&router))
        };
        if let Some(frame) = frame {
            self.frames.send_replace(frame);
        }
        // Deadlines may have moved even if nothing visible changed
        self.wake.notify_one();
    }

    fn tick(&self, now: Instant) {
        let frame = {
            let mut router = lock(&self.router);
            router.tick(now).then(|| LiveFrame::of(&router))
        };
        if let Some(frame) = frame {
            self.frames.send_replace(frame);
        }
    }

    fn shows(&self, id: Option<SceneId>) -> bool {
        id.is_some() && lock(&self.router).scene_id() == id
    }

    fn on_scene_updated(self: &Arc<Self>, payload: &Value) {
        let Some(scene) = parse_scene(events::SCENE_UPDATED, payload) else {
            return;
        };
        let wanted = match self.target {
            LiveTarget::Pinned(id) => scene.id == Some(id),
            LiveTarget::Active => self.shows(scene.id) || (scene.is_active && !self.has_scene()),
        };
        if wanted {
            self.show(Some(scene));
        }
    }

    fn on_scene_activated(self: &Arc<Self>, payload: &Value) {
        if self.target != LiveTarget::Active {
            return;
        }
        if let Some(scene) = parse_scene(events::SCENE_ACTIVATED, payload) {
            info!(id = ?scene.id, "live view switched to activated scene");
            self.show(Some(scene));
        }
    }

    fn on_scene_deleted(self: &Arc<Self>, payload: &Value) {
        let id = payload.get("id").and_then(Value::as_i64);
        if self.shows(id) {
            info!(id = ?id, "live scene deleted");
            self.show(None);
        }
    }

    fn has_scene(&self) -> bool {
        lock(&self.router).scene().is_some()
    }
}

impl Drop for LiveInner {
    fn drop(&mut self) {
        let ticker = self
            .ticker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(ticker) = ticker {
            ticker.abort();
        }
    }
}

fn parse_scene(event: &str, payload: &Value) -> Option<Scene> {
    match serde_json::from_value(payload.clone()) {
        Ok(scene) => Some(scene),
        Err(err) => {
            warn!(event, error = %err, "dropping malformed scene payload");
            None
        }
    }
}

fn subscribe_scene_event(
    registry: &EventRegistry,
    inner: &Arc<LiveInner>,
    event: &str,
    handle: fn(&Arc<LiveInner>, &Value),
) -> Subscription {
    let weak = Arc::downgrade(inner);
    registry.subscribe(event, move |payload| {
        if let Some(inner) = weak.upgrade() {
            handle(&inner, payload);
        }
    })
}

async fn run_ticker(inner: Weak<LiveInner>, wake: Arc<Notify>, chat_tick: Duration) {
    let mut next_fade: Option<Instant> = None;
    loop {
        let (deadline, fades) = {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            let router = lock(&inner.router);
            (router.next_deadline(), router.needs_periodic_tick())
        };

        // The fade tick runs on a fixed period, independent of event traffic
        next_fade = match (fades, next_fade) {
            (false, _) => None,
            (true, Some(at)) => Some(at),
            (true, None) => Instant::now().checked_add(chat_tick),
        };

        let Some(at) = earliest(deadline, next_fade) else {
            wake.notified().await;
            continue;
        };
        tokio::select! {
            _ = sleep_until(at) => {}
            _ = wake.notified() => continue,
        }

        let now = Instant::now();
        if next_fade.is_some_and(|fade| fade <= now) {
            next_fade = now.checked_add(chat_tick);
        }
        match inner.upgrade() {
            Some(inner) => inner.tick(now),
            None => break,
        }
    }
}

/// The broadcast-facing side: one live router fed by the transport.
#[derive(Clone)]
pub struct LiveSession {
    inner: Arc<LiveInner>,
}

impl LiveSession {
    /// Load the target scene and start following events. Must be called
    /// inside a tokio runtime.
    pub async fn start(
        config: &WorkspaceConfig,
        service: SceneService,
        registry: &EventRegistry,
        target: LiveTarget,
    ) -> WorkspaceResult<Self> {
        let (frames, _) = watch::channel(LiveFrame::default());
        let wake = Arc::new(Notify::new());
        let inner = Arc::new(LiveInner {
            target,
            service,
            registry: registry.clone(),
            router: Mutex::new(LiveRouter::new()),
            routes: Mutex::new(HashMap::new()),
            _scene_subscriptions: Mutex::new(Vec::new()),
            frames,
            wake: wake.clone(),
            ticker: Mutex::new(None),
        });

        *lock(&inner._scene_subscriptions) = vec![
            subscribe_scene_event(registry, &inner, events::SCENE_UPDATED, LiveInner::on_scene_updated),
            subscribe_scene_event(registry, &inner, events::SCENE_ACTIVATED, LiveInner::on_scene_activated),
            subscribe_scene_event(registry, &inner, events::SCENE_DELETED, LiveInner::on_scene_deleted),
        ];
        *lock(&inner.ticker) = Some(tokio::spawn(run_ticker(
            Arc::downgrade(&inner),
            wake,
            config.chat_tick(),
        )));

        let session = Self { inner };
        session.reload().await?;
        Ok(session)
    }

    /// Re-read the target scene from storage.
    pub async fn reload(&self) -> WorkspaceResult<()> {
        let scene = match self.inner.target {
            LiveTarget::Active => self.inner.service.live_scene().await?,
            LiveTarget::Pinned(id) => self
                .inner
                .service
                .list()
                .await?
                .into_iter()
                .find(|scene| scene.id == Some(id)),
        };
        info!(live_target = ?self.inner.target, scene = ?scene.as_ref().and_then(|s| s.id), "live view loaded");
        self.inner.show(scene);
        Ok(())
    }

    pub fn target(&self) -> LiveTarget {
        self.inner.target
    }

    pub fn scene_id(&self) -> Option<SceneId> {
        lock(&self.inner.router).scene_id()
    }

    /// Event names currently subscribed on behalf of the scene's elements.
    pub fn event_names(&self) -> BTreeSet<String> {
        lock(&self.inner.routes).keys().cloned().collect()
    }

    pub fn frame(&self) -> LiveFrame {
        self.inner.frames.borrow().clone()
    }

    /// Watch every published frame.
    pub fn frames(&self) -> watch::Receiver<LiveFrame> {
        self.inner.frames.subscribe()
    }
}
