//! Storage calls that announce their result over the transport.
//!
//! Every write path (the editor session and the REST API) goes through
//! [`SceneService`] so other sessions hear about it.

use std::sync::Arc;

use overlay_model::{NewScene, Scene, SceneId, ScenePatch};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{WorkspaceError, WorkspaceResult};
use crate::storage::SceneStore;
use crate::transport::{events, Transport};

#[derive(Clone)]
pub struct SceneService {
    storage: Arc<dyn SceneStore>,
    transport: Arc<dyn Transport>,
}

impl SceneService {
    pub fn new(storage: Arc<dyn SceneStore>, transport: Arc<dyn Transport>) -> Self {
        Self { storage, transport }
    }

    pub fn storage(&self) -> &Arc<dyn SceneStore> {
        &self.storage
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub async fn list(&self) -> WorkspaceResult<Vec<Scene>> {
        Ok(self.storage.list().await?)
    }

    /// The broadcast-active scene, else the first one.
    pub async fn live_scene(&self) -> WorkspaceResult<Option<Scene>> {
        let scenes = self.list().await?;
        let active = scenes.iter().position(|s| s.is_active);
        Ok(scenes.into_iter().nth(active.unwrap_or(0)))
    }

    pub async fn create(&self, scene: NewScene) -> WorkspaceResult<Scene> {
        let created = self.storage.create(scene).await?;
        info!(id = ?created.id, name = %created.name, "scene created");
        self.announce(events::SCENE_UPDATED, &created);
        Ok(created)
    }

    /// Write a patch without announcing it.
    pub async fn write(&self, id: SceneId, patch: ScenePatch) -> WorkspaceResult<Scene> {
        Ok(self.storage.update(id, patch).await?)
    }

    pub async fn update(&self, id: SceneId, patch: ScenePatch) -> WorkspaceResult<Scene> {
        let updated = self.write(id, patch).await?;
        self.announce_updated(&updated);
        Ok(updated)
    }

    pub fn announce_updated(&self, scene: &Scene) {
        self.announce(events::SCENE_UPDATED, scene);
    }

    /// Delete a scene. The active scene cannot be deleted while it is the
    /// only scene.
    pub async fn delete(&self, id: SceneId) -> WorkspaceResult<bool> {
        let scenes = self.storage.list().await?;
        if let [only] = scenes.as_slice() {
            if only.id == Some(id) && only.is_active {
                return Err(WorkspaceError::ActiveSceneDelete(id));
            }
        }

        let deleted = self.storage.delete(id).await?;
        if deleted {
            info!(id, "scene deleted");
            self.transport.publish(events::SCENE_DELETED, json!({ "id": id }));
        }
        Ok(deleted)
    }

    pub async fn activate(&self, id: SceneId) -> WorkspaceResult<Scene> {
        let scene = self.storage.activate(id).await?;
        info!(id, "scene activated");
        self.announce(events::SCENE_ACTIVATED, &scene);
        Ok(scene)
    }

    /// Inject an upstream event.
    pub fn publish_event(&self, name: &str, payload: Value) {
        self.transport.publish(name, payload);
    }

    fn announce(&self, event: &str, scene: &Scene) {
        match serde_json::to_value(scene) {
            Ok(payload) => self.transport.publish(event, payload),
            Err(err) => warn!(event, error = %err, "failed to serialize scene"),
        }
    }
}
