//! # Scene storage
//!
//! [`SceneStore`] is the async record store behind the editor. Two
//! implementations ship here:
//!
//! - [`MemorySceneStore`]: process-local, used by tests and embedding
//! - [`FileSceneStore`]: one `scene-<id>.json` file per scene in a directory,
//!   plus `sequence.json` holding the last id handed out
//!
//! Stores assign ids and timestamps. Activation is exclusive: the store
//! clears `is_active` on every other scene.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use overlay_model::{clamp_dimension, NewScene, Scene, SceneId, ScenePatch};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StorageError, StorageResult};

#[async_trait]
pub trait SceneStore: Send + Sync {
    /// All scenes, ordered by id.
    async fn list(&self) -> StorageResult<Vec<Scene>>;

    async fn create(&self, scene: NewScene) -> StorageResult<Scene>;

    async fn update(&self, id: SceneId, patch: ScenePatch) -> StorageResult<Scene>;

    /// Returns false if there was no such scene.
    async fn delete(&self, id: SceneId) -> StorageResult<bool>;

    /// Make `id` the only active scene and return it.
    async fn activate(&self, id: SceneId) -> StorageResult<Scene>;
}

fn new_record(id: SceneId, scene: NewScene) -> Scene {
    let now = Utc::now();
    Scene {
        id: Some(id),
        name: scene.name,
        width: clamp_dimension(scene.width),
        height: clamp_dimension(scene.height),
        elements: scene.elements,
        is_active: false,
        created_at: Some(now),
        updated_at: Some(now),
    }
}

fn patch_record(scene: &mut Scene, patch: ScenePatch) {
    patch.apply_to(scene);
    scene.updated_at = Some(Utc::now());
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    scenes: BTreeMap<SceneId, Scene>,
    next_id: SceneId,
}

/// Scene store held in memory.
///
/// Update failures can be injected with [`MemorySceneStore::fail_next_updates`].
#[derive(Debug, Default)]
pub struct MemorySceneStore {
    state: Mutex<MemoryState>,
    failures: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MemorySceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with existing records. Records without an id get one.
    pub fn with_scenes(scenes: impl IntoIterator<Item = Scene>) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            for mut scene in scenes {
                let id = match scene.id {
                    Some(id) => id,
                    None => state.next_id + 1,
                };
                scene.id = Some(id);
                state.next_id = state.next_id.max(id);
                state.scenes.insert(id, scene);
            }
        }
        store
    }

    /// Make the next `count` updates fail with [`StorageError::Unavailable`].
    pub fn fail_next_updates(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Number of update calls received, failed ones included.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Current stored copy of a scene.
    pub fn get(&self, id: SceneId) -> Option<Scene> {
        self.lock().scenes.get(&id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl SceneStore for MemorySceneStore {
    async fn list(&self) -> StorageResult<Vec<Scene>> {
        Ok(self.lock().scenes.values().cloned().collect())
    }

    async fn create(&self, scene: NewScene) -> StorageResult<Scene> {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        let record = new_record(id, scene);
        state.scenes.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: SceneId, patch: ScenePatch) -> StorageResult<Scene> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.take_failure() {
            return Err(StorageError::Unavailable("injected failure".to_string()));
        }

        let mut state = self.lock();
        let scene = state
            .scenes
            .get_mut(&id)
            .ok_or(StorageError::NotFound(id))?;
        patch_record(scene, patch);
        Ok(scene.clone())
    }

    async fn delete(&self, id: SceneId) -> StorageResult<bool> {
        Ok(self.lock().scenes.remove(&id).is_some())
    }

    async fn activate(&self, id: SceneId) -> StorageResult<Scene> {
        let mut state = self.lock();
        if !state.scenes.contains_key(&id) {
            return Err(StorageError::NotFound(id));
        }
        for (scene_id, scene) in state.scenes.iter_mut() {
            scene.is_active = *scene_id == id;
        }
        state
            .scenes
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound(id))
    }
}

// ============================================================================
// File store
// ============================================================================

const FILE_PREFIX: &str = "scene-";
const FILE_SUFFIX: &str = ".json";
const SEQUENCE_FILE: &str = "sequence.json";

/// Last id handed out, kept so ids of deleted scenes are never reused.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sequence {
    last_id: SceneId,
}

/// Scene store backed by a directory of JSON files.
#[derive(Debug)]
pub struct FileSceneStore {
    root: PathBuf,
    // Serializes read-modify-write sequences across awaits
    write_lock: tokio::sync::Mutex<()>,
}

impl FileSceneStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "opened scene directory");
        Ok(Self {
            root,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: SceneId) -> PathBuf {
        self.root.join(format!("{FILE_PREFIX}{id}{FILE_SUFFIX}"))
    }

    fn id_from_path(path: &Path) -> Option<SceneId> {
        path.file_name()?
            .to_str()?
            .strip_prefix(FILE_PREFIX)?
            .strip_suffix(FILE_SUFFIX)?
            .parse()
            .ok()
    }

    async fn read_scene(&self, id: SceneId) -> StorageResult<Scene> {
        let bytes = match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id));
            }
            Err(err) => return Err(err.into()),
        };
        let mut scene: Scene = serde_json::from_slice(&bytes)?;
        scene.id = Some(id);
        Ok(scene)
    }

    async fn read_all(&self) -> StorageResult<Vec<Scene>> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(id) = Self::id_from_path(&entry.path()) {
                ids.push(id);
            }
        }
        ids.sort_unstable();

        let mut scenes = Vec::with_capacity(ids.len());
        for id in ids {
            scenes.push(self.read_scene(id).await?);
        }
        Ok(scenes)
    }

    async fn read_sequence(&self) -> StorageResult<Sequence> {
        match tokio::fs::read(self.root.join(SEQUENCE_FILE)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Sequence::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Write through a temporary file so readers never see a partial record.
    async fn write_json(&self, path: PathBuf, value: &impl Serialize) -> StorageResult<()> {
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_scene(&self, scene: &Scene) -> StorageResult<()> {
        let id = scene.id.ok_or_else(|| {
            StorageError::Unavailable("cannot write a scene without an id".to_string())
        })?;
        self.write_json(self.path_for(id), scene).await
    }
}

#[async_trait]
impl SceneStore for FileSceneStore {
    async fn list(&self) -> StorageResult<Vec<Scene>> {
        self.read_all().await
    }

    async fn create(&self, scene: NewScene) -> StorageResult<Scene> {
        let _guard = self.write_lock.lock().await;
        let highest = self
            .read_all()
            .await?
            .iter()
            .filter_map(|s| s.id)
            .max()
            .unwrap_or(0);
        let sequence = Sequence {
            last_id: self.read_sequence().await?.last_id.max(highest) + 1,
        };
        self.write_json(self.root.join(SEQUENCE_FILE), &sequence).await?;

        let record = new_record(sequence.last_id, scene);
        self.write_scene(&record).await?;
        Ok(record)
    }

    async fn update(&self, id: SceneId, patch: ScenePatch) -> StorageResult<Scene> {
        let _guard = self.write_lock.lock().await;
        let mut scene = self.read_scene(id).await?;
        patch_record(&mut scene, patch);
        self.write_scene(&scene).await?;
        Ok(scene)
    }

    async fn delete(&self, id: SceneId) -> StorageResult<bool> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn activate(&self, id: SceneId) -> StorageResult<Scene> {
        let _guard = self.write_lock.lock().await;
        let scenes = self.read_all().await?;
        if !scenes.iter().any(|s| s.id == Some(id)) {
            return Err(StorageError::NotFound(id));
        }
        let mut activated = None;
        for mut scene in scenes {
            let active = scene.id == Some(id);
            if scene.is_active != active {
                scene.is_active = active;
                self.write_scene(&scene).await?;
            }
            if active {
                activated = Some(scene);
            }
        }
        activated.ok_or(StorageError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_assigns_ids() {
        let store = MemorySceneStore::new();
        let a = store.create(NewScene::named("A")).await.unwrap();
        let b = store.create(NewScene::named("B")).await.unwrap();

        assert_eq!(a.id, Some(1));
        assert_eq!(b.id, Some(2));
        assert!(a.created_at.is_some());
        assert!(!a.is_active);
    }

    #[tokio::test]
    async fn test_memory_store_injected_failures() {
        let store = MemorySceneStore::with_scenes([Scene::new("A")]);
        store.fail_next_updates(1);

        let patch = ScenePatch {
            name: Some("B".to_string()),
            ..Default::default()
        };
        let err = store.update(1, patch.clone()).await.unwrap_err();
        assert!(err.is_transient());

        let scene = store.update(1, patch).await.unwrap();
        assert_eq!(scene.name, "B");
        assert_eq!(store.update_calls(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_scene() {
        let store = MemorySceneStore::new();
        let err = store.update(9, ScenePatch::default()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(9)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_activation_is_exclusive() {
        let store = MemorySceneStore::with_scenes([
            Scene {
                is_active: true,
                ..Scene::new("A")
            },
            Scene::new("B"),
        ]);

        let activated = store.activate(2).await.unwrap();
        assert!(activated.is_active);

        let active: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|s| s.is_active)
            .filter_map(|s| s.id)
            .collect();
        assert_eq!(active, vec![2]);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(FileSceneStore::id_from_path(Path::new("/x/scene-12.json")), Some(12));
        assert_eq!(FileSceneStore::id_from_path(Path::new("/x/scene-12.json.tmp")), None);
        assert_eq!(FileSceneStore::id_from_path(Path::new("/x/notes.json")), None);
    }
}
