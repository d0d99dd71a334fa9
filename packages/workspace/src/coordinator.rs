//! # Editor session with persistence
//!
//! [`Workspace`] wraps an [`EditorStore`] and keeps storage in step with it:
//!
//! ```text
//! apply(mutation) ─▶ EditorStore ─▶ revision changed?
//!                                        │
//!                    debounce (800 ms) ◀─┘  (re-armed by every edit)
//!                          │
//!                          ▼
//!          storage.update (retry w/ backoff) ─▶ baseline ─▶ scene-updated
//! ```
//!
//! Scenes saved elsewhere arrive as `scene-updated` and are merged unless
//! they are open here; the open scene is never overwritten remotely.
//!
//! The pending debounced save always targets the open scene: every path
//! that changes the open scene flushes or cancels it first.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use overlay_common::{TimerSlot, TimerToken};
use overlay_editor::{EditorStore, MergeOutcome, Mutation, MutationOutcome};
use overlay_model::{NewScene, Scene, SceneId, ScenePatch};
use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::autosave::SaveTracker;
use crate::config::WorkspaceConfig;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::registry::{EventRegistry, Subscription};
use crate::service::SceneService;
use crate::transport::events;

struct PendingSave {
    scene_id: SceneId,
    task: JoinHandle<()>,
}

struct SessionState {
    editor: EditorStore,
    tracker: SaveTracker,
    debounce: TimerSlot,
    pending: Option<PendingSave>,
    saving: usize,
    last_save_error: Option<String>,
}

impl SessionState {
    /// Drop the pending debounced save. Returns the scene it targeted.
    fn cancel_pending(&mut self) -> Option<SceneId> {
        let pending = self.pending.take()?;
        pending.task.abort();
        self.debounce.cancel();
        Some(pending.scene_id)
    }
}

struct Inner {
    config: WorkspaceConfig,
    service: SceneService,
    state: Mutex<SessionState>,
    // One save in flight at a time; a later save snapshots after the earlier lands
    save_lock: tokio::sync::Mutex<()>,
    _subscriptions: Mutex<Vec<Subscription>>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_remote_update(&self, payload: &Value) {
        let scene: Scene = match serde_json::from_value(payload.clone()) {
            Ok(scene) => scene,
            Err(err) => {
                warn!(error = %err, "dropping malformed scene-updated payload");
                return;
            }
        };
        let (id, snapshot) = (scene.id, scene.snapshot());

        let mut state = self.lock();
        match state.editor.merge_remote_scene(scene) {
            MergeOutcome::Inserted | MergeOutcome::Replaced => {
                if let Some(id) = id {
                    state.tracker.set_baseline(id, snapshot);
                }
                debug!(id = ?id, "merged remote scene");
            }
            MergeOutcome::SkippedCurrent => debug!(id = ?id, "ignored remote update to open scene"),
            MergeOutcome::Ignored => {}
        }
    }

    fn on_remote_delete(&self, payload: &Value) {
        #[derive(Deserialize)]
        struct Deleted {
            id: SceneId,
        }
        let Ok(Deleted { id }) = serde_json::from_value(payload.clone()) else {
            warn!(%payload, "dropping malformed scene-deleted payload");
            return;
        };

        let mut state = self.lock();
        if state.pending.as_ref().is_some_and(|p| p.scene_id == id) {
            state.cancel_pending();
        }
        if state.editor.remove_scene(id) {
            state.tracker.forget(id);
            debug!(id, current = ?state.editor.current_scene_id(), "removed remotely deleted scene");
        }
    }

    fn on_remote_activate(&self, payload: &Value) {
        match payload.get("id").and_then(Value::as_i64) {
            Some(id) => self.lock().editor.mark_active(id),
            None => warn!(%payload, "dropping scene-activated payload without id"),
        }
    }
}

fn subscribe_remote(
    registry: &EventRegistry,
    inner: &Arc<Inner>,
    event: &str,
    handle: fn(&Inner, &Value),
) -> Subscription {
    let weak = Arc::downgrade(inner);
    registry.subscribe(event, move |payload| {
        if let Some(inner) = weak.upgrade() {
            handle(&inner, payload);
        }
    })
}

/// An editor session bound to storage and the transport.
///
/// Cloning is cheap; clones share the session. Must be used inside a tokio
/// runtime.
#[derive(Clone)]
pub struct Workspace {
    inner: Arc<Inner>,
}

impl Workspace {
    pub fn new(config: WorkspaceConfig, service: SceneService, registry: &EventRegistry) -> Self {
        let inner = Arc::new(Inner {
            state: Mutex::new(SessionState {
                editor: EditorStore::with_history_depth(config.history_depth),
                tracker: SaveTracker::new(),
                debounce: TimerSlot::new(),
                pending: None,
                saving: 0,
                last_save_error: None,
            }),
            config,
            service,
            save_lock: tokio::sync::Mutex::new(()),
            _subscriptions: Mutex::new(Vec::new()),
        });

        let subscriptions = vec![
            subscribe_remote(registry, &inner, events::SCENE_UPDATED, Inner::on_remote_update),
            subscribe_remote(registry, &inner, events::SCENE_DELETED, Inner::on_remote_delete),
            subscribe_remote(registry, &inner, events::SCENE_ACTIVATED, Inner::on_remote_activate),
        ];
        *inner
            ._subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = subscriptions;

        Self { inner }
    }

    /// Create a session and load the scene list.
    pub async fn open(
        config: WorkspaceConfig,
        service: SceneService,
        registry: &EventRegistry,
    ) -> WorkspaceResult<Self> {
        let workspace = Self::new(config, service, registry);
        workspace.load_scenes().await?;
        Ok(workspace)
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.inner.config
    }

    /// Read the editor state.
    pub fn read<R>(&self, f: impl FnOnce(&EditorStore) -> R) -> R {
        f(&self.inner.lock().editor)
    }

    pub fn current_scene(&self) -> Option<Scene> {
        self.read(|editor| editor.current_scene().cloned())
    }

    pub fn is_saving(&self) -> bool {
        self.inner.lock().saving > 0
    }

    pub fn has_pending_save(&self) -> bool {
        self.inner.lock().pending.is_some()
    }

    /// Error of the last failed save, cleared by the next success.
    pub fn last_save_error(&self) -> Option<String> {
        self.inner.lock().last_save_error.clone()
    }

    // --- Editing ---

    /// Apply an editor action and schedule an autosave if it changed the
    /// open scene.
    pub fn apply(&self, mutation: Mutation) -> WorkspaceResult<MutationOutcome> {
        let mut state = self.inner.lock();
        let revision = state.editor.revision();
        let outcome = state.editor.apply(mutation)?;
        if state.editor.revision() != revision {
            self.schedule_save(&mut state);
        }
        Ok(outcome)
    }

    fn schedule_save(&self, state: &mut SessionState) {
        let Some((id, snapshot)) = state
            .editor
            .current_scene()
            .and_then(|scene| Some((scene.id?, scene.snapshot())))
        else {
            return;
        };

        if state.tracker.matches_baseline(id, &snapshot) {
            if state.cancel_pending().is_some() {
                debug!(id, "scene back to its saved state, autosave cancelled");
            }
            return;
        }

        let delay = self.inner.config.autosave_debounce();
        let token = state.debounce.arm(Instant::now(), delay);
        let weak = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                Workspace { inner }.fire_autosave(token).await;
            }
        });

        if let Some(previous) = state.pending.replace(PendingSave { scene_id: id, task }) {
            previous.task.abort();
        }
    }

    async fn fire_autosave(&self, token: TimerToken) {
        let scene_id = {
            let mut state = self.inner.lock();
            if !state.debounce.fire(token) {
                return;
            }
            match state.pending.take() {
                Some(pending) => pending.scene_id,
                None => return,
            }
        };
        // Failures are recorded in last_save_error
        let _ = self.save_scene(scene_id, false).await;
    }

    // --- Saving ---

    /// Cancel the pending autosave and write the open scene now, even if it
    /// is unchanged.
    pub async fn force_save(&self) -> WorkspaceResult<()> {
        let id = {
            let mut state = self.inner.lock();
            let id = state
                .editor
                .current_scene_id()
                .ok_or(WorkspaceError::NoCurrentScene)?;
            state.cancel_pending();
            id
        };
        self.save_scene(id, true).await.map(|_| ())
    }

    /// Write the pending autosave now. Returns whether anything was written.
    pub async fn flush(&self) -> WorkspaceResult<bool> {
        let pending = self.inner.lock().cancel_pending();
        match pending {
            Some(id) => self.save_scene(id, false).await,
            None => Ok(false),
        }
    }

    /// Save the latest state of scene `id`.
    async fn save_scene(&self, id: SceneId, force: bool) -> WorkspaceResult<bool> {
        let _serialized = self.inner.save_lock.lock().await;
        let (ticket, snapshot) = {
            let mut state = self.inner.lock();
            let Some(snapshot) = state.editor.snapshot_of(id) else {
                return Ok(false);
            };
            if !force && state.tracker.matches_baseline(id, &snapshot) {
                return Ok(false);
            }
            state.saving += 1;
            (state.tracker.begin(id), snapshot)
        };

        let result = self.write_with_retry(id, ScenePatch::from(snapshot.clone())).await;

        let mut state = self.inner.lock();
        state.saving -= 1;
        match result {
            Ok(record) => {
                state.last_save_error = None;
                let fresh = state.tracker.complete(ticket, snapshot.clone());
                if fresh {
                    state.editor.apply_saved_record(&record, &snapshot);
                }
                self.reschedule_if_diverged(&mut state, id);
                drop(state);

                if fresh {
                    debug!(id, seq = ticket.seq, "scene saved");
                    self.inner.service.announce_updated(&record);
                } else {
                    debug!(id, seq = ticket.seq, "ignoring stale save response");
                }
                Ok(true)
            }
            Err(err) => {
                error!(id, error = %err, "failed to save scene");
                state.last_save_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Edits made while a save was in flight were compared against the old
    /// baseline; make sure the open scene still gets written.
    fn reschedule_if_diverged(&self, state: &mut SessionState, id: SceneId) {
        if state.pending.is_some() || state.editor.current_scene_id() != Some(id) {
            return;
        }
        let diverged = state
            .editor
            .snapshot_of(id)
            .is_some_and(|current| !state.tracker.matches_baseline(id, &current));
        if diverged {
            debug!(id, "scene changed during save, rescheduling");
            self.schedule_save(state);
        }
    }

    async fn write_with_retry(&self, id: SceneId, patch: ScenePatch) -> WorkspaceResult<Scene> {
        let policy = &self.inner.config.retry;
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.inner.service.write(id, patch.clone()).await {
                Ok(scene) => return Ok(scene),
                Err(WorkspaceError::Storage(err))
                    if err.is_transient() && policy.allows_retry(attempts) =>
                {
                    let delay = policy.delay(attempts - 1);
                    warn!(
                        id,
                        attempt = attempts,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %err,
                        "save failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    // --- Scene lifecycle ---

    /// Reload every scene from storage, writing any pending edit first.
    pub async fn load_scenes(&self) -> WorkspaceResult<usize> {
        self.flush().await?;
        let scenes = self.inner.service.list().await?;

        let mut state = self.inner.lock();
        state.tracker.reset(&scenes);
        let count = scenes.len();
        state.editor.load_scenes(scenes);
        info!(count, current = ?state.editor.current_scene_id(), "scenes loaded");
        Ok(count)
    }

    pub async fn switch_scene(&self, id: SceneId) -> WorkspaceResult<()> {
        self.flush().await?;
        self.inner.lock().editor.switch_scene(id)?;
        Ok(())
    }

    /// Create an empty scene and open it.
    pub async fn create_scene(&self, name: &str) -> WorkspaceResult<Scene> {
        self.flush().await?;
        let created = self.inner.service.create(NewScene::named(name)).await?;

        let mut state = self.inner.lock();
        let id = state.editor.adopt_created_scene(created.clone())?;
        state.tracker.set_baseline(id, created.snapshot());
        Ok(created)
    }

    /// Delete the open scene and fall back to the first remaining one.
    /// Returns the scene open afterwards.
    pub async fn delete_current_scene(&self) -> WorkspaceResult<Option<SceneId>> {
        let id = {
            let mut state = self.inner.lock();
            let scene = state
                .editor
                .current_scene()
                .ok_or(WorkspaceError::NoCurrentScene)?;
            let id = scene.id.ok_or(WorkspaceError::NoCurrentScene)?;
            if scene.is_active && state.editor.scenes().len() == 1 {
                return Err(WorkspaceError::ActiveSceneDelete(id));
            }
            state.cancel_pending();
            id
        };

        if !self.inner.service.delete(id).await? {
            debug!(id, "scene was already gone from storage");
        }

        let mut state = self.inner.lock();
        state.editor.remove_scene(id);
        state.tracker.forget(id);
        Ok(state.editor.current_scene_id())
    }

    /// Make the open scene the broadcast scene.
    pub async fn activate_current_scene(&self) -> WorkspaceResult<Scene> {
        let id = self
            .inner
            .lock()
            .editor
            .current_scene_id()
            .ok_or(WorkspaceError::NoCurrentScene)?;
        let scene = self.inner.service.activate(id).await?;
        self.inner.lock().editor.mark_active(id);
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySceneStore;
    use crate::transport::LocalTransport;
    use overlay_model::ElementType;

    async fn workspace() -> (Arc<MemorySceneStore>, Workspace) {
        let storage = Arc::new(MemorySceneStore::with_scenes([Scene::new("Main")]));
        let transport = Arc::new(LocalTransport::new());
        let registry = EventRegistry::new(transport.clone());
        let service = SceneService::new(storage.clone(), transport);
        let workspace = Workspace::open(WorkspaceConfig::default(), service, &registry)
            .await
            .unwrap();
        (storage, workspace)
    }

    #[tokio::test(start_paused = true)]
    async fn test_noop_edit_schedules_nothing() {
        let (_, workspace) = workspace().await;
        let outcome = workspace
            .apply(Mutation::ToggleLock {
                id: "missing".to_string(),
            })
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Noop);
        assert!(!workspace.has_pending_save());
    }

    #[tokio::test(start_paused = true)]
    async fn test_undo_back_to_baseline_cancels_save() {
        let (storage, workspace) = workspace().await;
        workspace
            .apply(Mutation::AddElement {
                element_type: ElementType::Text,
            })
            .unwrap();
        assert!(workspace.has_pending_save());

        workspace.apply(Mutation::Undo).unwrap();
        assert!(!workspace.has_pending_save());

        sleep(std::time::Duration::from_secs(2)).await;
        assert_eq!(storage.update_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_save_without_scene() {
        let storage = Arc::new(MemorySceneStore::new());
        let transport = Arc::new(LocalTransport::new());
        let registry = EventRegistry::new(transport.clone());
        let workspace = Workspace::open(
            WorkspaceConfig::default(),
            SceneService::new(storage, transport),
            &registry,
        )
        .await
        .unwrap();

        let err = workspace.force_save().await.unwrap_err();
        assert!(matches!(err, WorkspaceError::NoCurrentScene));
    }
}
