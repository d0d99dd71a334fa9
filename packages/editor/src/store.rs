//! # Editor Store
//!
//! Owns the loaded scenes, the scene open for editing, and the editing state
//! around it (selection, history, clipboard).
//!
//! All edits go through [`EditorStore::apply`] or the matching method. Each
//! scene-changing edit bumps [`EditorStore::revision`], which the
//! persistence layer watches to schedule autosaves.

use overlay_model::{
    clamp_dimension, defaults, new_element_id, ElementId, ElementPatch, ElementType, Geometry,
    Scene, SceneElement, SceneId, SceneSnapshot,
};
use tracing::debug;

use crate::clipboard::{place_copies, Clipboard};
use crate::mutations::{Mutation, MutationOutcome, ReorderDirection};
use crate::transform::{drag_updates, transform_updates};
use crate::{EditorError, History, Selection, SurfaceSnapshot};

/// What happened to a scene received from another session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Replaced,
    /// The scene is open here; local edits win.
    SkippedCurrent,
    /// The record has no id and cannot be matched.
    Ignored,
}

/// Editing state for one editor session
#[derive(Debug, Default)]
pub struct EditorStore {
    scenes: Vec<Scene>,
    current_scene_id: Option<SceneId>,
    selection: Selection,
    history: History,
    clipboard: Clipboard,
    revision: u64,
}

impl EditorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_depth(depth: usize) -> Self {
        Self {
            history: History::with_max_levels(depth),
            ..Self::default()
        }
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == Some(id))
    }

    pub fn current_scene_id(&self) -> Option<SceneId> {
        self.current_scene_id
    }

    /// The scene open for editing
    pub fn current_scene(&self) -> Option<&Scene> {
        self.current_index().map(|i| &self.scenes[i])
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Bumped on every change to the open scene's persisted fields
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot_of(&self, id: SceneId) -> Option<SceneSnapshot> {
        self.scene(id).map(Scene::snapshot)
    }

    fn current_index(&self) -> Option<usize> {
        let id = self.current_scene_id?;
        self.scenes.iter().position(|s| s.id == Some(id))
    }

    fn scene_index(&self, id: SceneId) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == Some(id))
    }

    fn reset_editing_state(&mut self) {
        self.selection.clear();
        self.history.clear();
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // --- Scene lifecycle ---

    /// Replace the scene list, opening the broadcast-active scene (or the first).
    pub fn load_scenes(&mut self, scenes: Vec<Scene>) {
        let open = scenes
            .iter()
            .find(|s| s.is_active)
            .or_else(|| scenes.first())
            .and_then(|s| s.id);

        debug!(count = scenes.len(), current = ?open, "loaded scenes");

        self.scenes = scenes;
        self.current_scene_id = open;
        self.reset_editing_state();
    }

    pub fn switch_scene(&mut self, id: SceneId) -> Result<(), EditorError> {
        if self.scene_index(id).is_none() {
            return Err(EditorError::SceneNotFound(id));
        }
        self.current_scene_id = Some(id);
        self.reset_editing_state();
        Ok(())
    }

    /// Add a freshly persisted scene and open it.
    pub fn adopt_created_scene(&mut self, scene: Scene) -> Result<SceneId, EditorError> {
        let id = scene.id.ok_or(EditorError::UnsavedScene)?;
        match self.scene_index(id) {
            Some(i) => self.scenes[i] = scene,
            None => self.scenes.push(scene),
        }
        self.current_scene_id = Some(id);
        self.reset_editing_state();
        Ok(id)
    }

    /// Drop a scene. If it was open, fall back to the first remaining scene.
    pub fn remove_scene(&mut self, id: SceneId) -> bool {
        let Some(index) = self.scene_index(id) else {
            return false;
        };
        self.scenes.remove(index);

        if self.current_scene_id == Some(id) {
            self.current_scene_id = self.scenes.first().and_then(|s| s.id);
            self.reset_editing_state();
            debug!(removed = id, fallback = ?self.current_scene_id, "open scene removed");
        }
        true
    }

    /// Make `id` the only broadcast-active scene.
    pub fn mark_active(&mut self, id: SceneId) {
        for scene in &mut self.scenes {
            scene.is_active = scene.id == Some(id);
        }
    }

    /// Merge a scene saved by another session.
    pub fn merge_remote_scene(&mut self, scene: Scene) -> MergeOutcome {
        let Some(id) = scene.id else {
            return MergeOutcome::Ignored;
        };
        if self.current_scene_id == Some(id) {
            return MergeOutcome::SkippedCurrent;
        }
        match self.scene_index(id) {
            Some(i) => {
                self.scenes[i] = scene;
                MergeOutcome::Replaced
            }
            None => {
                self.scenes.push(scene);
                MergeOutcome::Inserted
            }
        }
    }

    /// Adopt server metadata from a save response, but only if the scene
    /// still holds exactly what was saved.
    pub fn apply_saved_record(&mut self, record: &Scene, saved: &SceneSnapshot) -> bool {
        let Some(index) = record.id.and_then(|id| self.scene_index(id)) else {
            return false;
        };
        let scene = &mut self.scenes[index];
        if scene.snapshot() != *saved {
            return false;
        }
        scene.created_at = record.created_at.or(scene.created_at);
        scene.updated_at = record.updated_at;
        true
    }

    // --- Mutations ---

    /// Apply an editor action
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationOutcome, EditorError> {
        let outcome = match mutation {
            Mutation::AddElement { element_type } => outcome(self.add_element(element_type).is_some()),
            Mutation::UpdateElement { id, patch } => self.update_element(&id, &patch)?,
            Mutation::DeleteSelected => self.delete_selected(),
            Mutation::Reorder { id, direction } => self.reorder(&id, direction),
            Mutation::ToggleVisibility { id } => self.toggle_visibility(&id),
            Mutation::ToggleLock { id } => self.toggle_lock(&id),
            Mutation::SetResolution { width, height } => self.set_resolution(width, height),
            Mutation::RenameScene { name } => self.rename_scene(&name),
            Mutation::BeginGesture => self.begin_gesture(),
            Mutation::DragEnd { id, x, y, surface } => self.drag_end(&id, x, y, &surface)?,
            Mutation::TransformEnd {
                id,
                geometry,
                surface,
            } => self.transform_end(&id, geometry, &surface)?,
            Mutation::Select { id, additive } => self.select(&id, additive),
            Mutation::ClearSelection => self.clear_selection(),
            Mutation::SelectAll => self.select_all(),
            Mutation::Copy => self.copy(),
            Mutation::Paste => self.paste(),
            Mutation::Duplicate => self.duplicate(),
            Mutation::Undo => self.undo(),
            Mutation::Redo => self.redo(),
        };
        Ok(outcome)
    }

    /// Record the open scene's current state for undo.
    pub fn push_history(&mut self) -> bool {
        match self.current_scene() {
            Some(scene) => {
                let snapshot = scene.snapshot();
                self.history.push(snapshot);
                true
            }
            None => false,
        }
    }

    /// Add a new element of `element_type` on top of the stack and select it.
    pub fn add_element(&mut self, element_type: ElementType) -> Option<ElementId> {
        let index = self.current_index()?;
        self.push_history();

        let scene = &mut self.scenes[index];
        let existing = scene
            .elements
            .iter()
            .filter(|el| el.element_type() == element_type)
            .count();
        let id = new_element_id();
        let element = defaults::new_element(element_type, id.clone(), existing, scene.max_z() + 1);
        scene.elements.push(element);

        self.selection.replace([id.clone()]);
        self.touch();
        Some(id)
    }

    pub fn update_element(
        &mut self,
        id: &str,
        patch: &ElementPatch,
    ) -> Result<MutationOutcome, EditorError> {
        let Some(index) = self.current_index() else {
            return Ok(MutationOutcome::Noop);
        };
        let Some(current) = self.scenes[index].element(id) else {
            return Ok(MutationOutcome::Noop);
        };

        let mut updated = current.clone();
        patch.apply_to(&mut updated)?;
        if updated == *current {
            return Ok(MutationOutcome::Noop);
        }

        self.push_history();
        self.replace_element(index, updated);
        Ok(MutationOutcome::Applied)
    }

    /// Apply several patches at once without recording history.
    ///
    /// Patches for missing elements are skipped. If any patch is invalid,
    /// nothing is applied.
    pub fn update_elements(
        &mut self,
        updates: &[(ElementId, ElementPatch)],
    ) -> Result<MutationOutcome, EditorError> {
        let Some(index) = self.current_index() else {
            return Ok(MutationOutcome::Noop);
        };

        let mut changed = Vec::new();
        for (id, patch) in updates {
            let Some(current) = self.scenes[index].element(id) else {
                continue;
            };
            let mut updated = current.clone();
            patch.apply_to(&mut updated)?;
            if updated != *current {
                changed.push(updated);
            }
        }

        if changed.is_empty() {
            return Ok(MutationOutcome::Noop);
        }
        for element in changed {
            self.replace_element(index, element);
        }
        Ok(MutationOutcome::Applied)
    }

    fn replace_element(&mut self, scene_index: usize, element: SceneElement) {
        if let Some(slot) = self.scenes[scene_index].element_mut(&element.id) {
            *slot = element;
            self.touch();
        }
    }

    pub fn delete_selected(&mut self) -> MutationOutcome {
        let Some(index) = self.current_index() else {
            return MutationOutcome::Noop;
        };
        let doomed = self.scenes[index]
            .elements
            .iter()
            .any(|el| self.selection.contains(&el.id));
        if !doomed {
            self.selection.clear();
            return MutationOutcome::Noop;
        }

        self.push_history();
        let selection = &self.selection;
        self.scenes[index]
            .elements
            .retain(|el| !selection.contains(&el.id));
        self.selection.clear();
        self.touch();
        MutationOutcome::Applied
    }

    /// Swap z-index with the nearest element above (`Up`) or below (`Down`).
    pub fn reorder(&mut self, id: &str, direction: ReorderDirection) -> MutationOutcome {
        let Some(index) = self.current_index() else {
            return MutationOutcome::Noop;
        };

        let elements = &self.scenes[index].elements;
        let mut order: Vec<usize> = (0..elements.len()).collect();
        order.sort_by_key(|&i| elements[i].z_index);

        let Some(position) = order.iter().position(|&i| elements[i].id == id) else {
            return MutationOutcome::Noop;
        };
        let neighbour = match direction {
            ReorderDirection::Up => position.checked_add(1),
            ReorderDirection::Down => position.checked_sub(1),
        };
        let Some(&other) = neighbour.and_then(|n| order.get(n)) else {
            return MutationOutcome::Noop;
        };
        let this = order[position];
        if elements[this].z_index == elements[other].z_index {
            return MutationOutcome::Noop;
        }

        self.push_history();
        let elements = &mut self.scenes[index].elements;
        let z = elements[this].z_index;
        elements[this].z_index = elements[other].z_index;
        elements[other].z_index = z;
        self.touch();
        MutationOutcome::Applied
    }

    pub fn toggle_visibility(&mut self, id: &str) -> MutationOutcome {
        self.toggle_flag(id, |el| el.visible = !el.visible)
    }

    pub fn toggle_lock(&mut self, id: &str) -> MutationOutcome {
        self.toggle_flag(id, |el| el.locked = !el.locked)
    }

    fn toggle_flag<F>(&mut self, id: &str, toggle: F) -> MutationOutcome
    where
        F: FnOnce(&mut SceneElement),
    {
        let Some(index) = self.current_index() else {
            return MutationOutcome::Noop;
        };
        if !self.scenes[index].contains(id) {
            return MutationOutcome::Noop;
        }

        self.push_history();
        if let Some(element) = self.scenes[index].element_mut(id) {
            toggle(element);
        }
        self.touch();
        MutationOutcome::Applied
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) -> MutationOutcome {
        let Some(index) = self.current_index() else {
            return MutationOutcome::Noop;
        };
        let (width, height) = (clamp_dimension(width), clamp_dimension(height));
        let scene = &self.scenes[index];
        if scene.width == width && scene.height == height {
            return MutationOutcome::Noop;
        }

        self.push_history();
        let scene = &mut self.scenes[index];
        scene.width = width;
        scene.height = height;
        self.touch();
        MutationOutcome::Applied
    }

    pub fn rename_scene(&mut self, name: &str) -> MutationOutcome {
        let name = name.trim();
        let Some(index) = self.current_index() else {
            return MutationOutcome::Noop;
        };
        if name.is_empty() || self.scenes[index].name == name {
            return MutationOutcome::Noop;
        }

        self.push_history();
        self.scenes[index].name = name.to_string();
        self.touch();
        MutationOutcome::Applied
    }

    // --- Gestures ---

    pub fn begin_gesture(&mut self) -> MutationOutcome {
        outcome(self.push_history())
    }

    pub fn drag_end(
        &mut self,
        id: &str,
        x: f64,
        y: f64,
        surface: &SurfaceSnapshot,
    ) -> Result<MutationOutcome, EditorError> {
        let Some(scene) = self.current_scene() else {
            return Ok(MutationOutcome::Noop);
        };
        let updates = drag_updates(scene, &self.selection, id, x, y, surface);
        self.update_elements(&updates)
    }

    pub fn transform_end(
        &mut self,
        id: &str,
        geometry: Geometry,
        surface: &SurfaceSnapshot,
    ) -> Result<MutationOutcome, EditorError> {
        let Some(scene) = self.current_scene() else {
            return Ok(MutationOutcome::Noop);
        };
        let updates = transform_updates(scene, &self.selection, id, geometry, surface);
        self.update_elements(&updates)
    }

    // --- Selection ---

    pub fn select(&mut self, id: &str, additive: bool) -> MutationOutcome {
        if !self.current_scene().is_some_and(|scene| scene.contains(id)) {
            return MutationOutcome::Noop;
        }
        self.selection.select(id, additive);
        MutationOutcome::Applied
    }

    pub fn clear_selection(&mut self) -> MutationOutcome {
        if self.selection.is_empty() {
            return MutationOutcome::Noop;
        }
        self.selection.clear();
        MutationOutcome::Applied
    }

    pub fn select_all(&mut self) -> MutationOutcome {
        let Some(scene) = self.current_scene() else {
            return MutationOutcome::Noop;
        };
        let ids: Vec<ElementId> = scene.element_ids().cloned().collect();
        self.selection.replace(ids);
        MutationOutcome::Applied
    }

    fn selected_elements(&self) -> Vec<SceneElement> {
        self.current_scene()
            .map(|scene| {
                scene
                    .elements
                    .iter()
                    .filter(|el| self.selection.contains(&el.id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    // --- Clipboard ---

    pub fn copy(&mut self) -> MutationOutcome {
        let copied = self.selected_elements();
        outcome(self.clipboard.copy(copied))
    }

    pub fn paste(&mut self) -> MutationOutcome {
        let sources = self.clipboard.contents().to_vec();
        self.insert_copies(&sources)
    }

    pub fn duplicate(&mut self) -> MutationOutcome {
        let sources = self.selected_elements();
        self.insert_copies(&sources)
    }

    fn insert_copies(&mut self, sources: &[SceneElement]) -> MutationOutcome {
        let Some(index) = self.current_index() else {
            return MutationOutcome::Noop;
        };
        if sources.is_empty() {
            return MutationOutcome::Noop;
        }

        self.push_history();
        let scene = &mut self.scenes[index];
        let copies = place_copies(sources, scene.max_z());
        let ids: Vec<ElementId> = copies.iter().map(|el| el.id.clone()).collect();
        scene.elements.extend(copies);

        self.selection.replace(ids);
        self.touch();
        MutationOutcome::Applied
    }

    // --- History ---

    pub fn undo(&mut self) -> MutationOutcome {
        let Some(index) = self.current_index() else {
            return MutationOutcome::Noop;
        };
        match self.history.undo(self.scenes[index].snapshot()) {
            Some(previous) => {
                self.restore(index, previous);
                MutationOutcome::Applied
            }
            None => MutationOutcome::Noop,
        }
    }

    pub fn redo(&mut self) -> MutationOutcome {
        let Some(index) = self.current_index() else {
            return MutationOutcome::Noop;
        };
        match self.history.redo(self.scenes[index].snapshot()) {
            Some(next) => {
                self.restore(index, next);
                MutationOutcome::Applied
            }
            None => MutationOutcome::Noop,
        }
    }

    fn restore(&mut self, index: usize, snapshot: SceneSnapshot) {
        let scene = &mut self.scenes[index];
        scene.restore(snapshot);
        self.selection.retain(|id| scene.contains(id));
        self.touch();
    }
}

fn outcome(applied: bool) -> MutationOutcome {
    if applied {
        MutationOutcome::Applied
    } else {
        MutationOutcome::Noop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_model::ElementConfig;
    use serde_json::json;

    fn store_with_scene() -> EditorStore {
        let mut store = EditorStore::new();
        let mut scene = Scene::new("Main");
        scene.id = Some(1);
        store.load_scenes(vec![scene]);
        store
    }

    #[test]
    fn test_no_open_scene_is_noop() {
        let mut store = EditorStore::new();
        assert_eq!(store.add_element(ElementType::Text), None);
        assert_eq!(store.paste(), MutationOutcome::Noop);
        assert_eq!(store.undo(), MutationOutcome::Noop);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_add_element_names_and_stacks() {
        let mut store = store_with_scene();
        let first = store.add_element(ElementType::Text).unwrap();
        let second = store.add_element(ElementType::Text).unwrap();

        let scene = store.current_scene().unwrap();
        assert_eq!(scene.element(&first).unwrap().name, "Text 1");
        assert_eq!(scene.element(&second).unwrap().name, "Text 2");
        assert_eq!(scene.element(&first).unwrap().z_index, 1);
        assert_eq!(scene.element(&second).unwrap().z_index, 2);
        assert_eq!(store.selection().to_vec(), vec![second]);
        assert_eq!(store.history().undo_levels(), 2);
    }

    #[test]
    fn test_update_without_change_skips_history() {
        let mut store = store_with_scene();
        let id = store.add_element(ElementType::Chat).unwrap();
        let levels = store.history().undo_levels();
        let revision = store.revision();

        let patch = ElementPatch {
            visible: Some(true),
            ..Default::default()
        };
        assert_eq!(
            store.update_element(&id, &patch).unwrap(),
            MutationOutcome::Noop
        );
        assert_eq!(store.history().undo_levels(), levels);
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn test_invalid_config_patch_is_error() {
        let mut store = store_with_scene();
        let id = store.add_element(ElementType::Chat).unwrap();
        let levels = store.history().undo_levels();

        let patch = ElementPatch {
            config: Some(json!({"maxMessages": -4})),
            ..Default::default()
        };
        assert!(matches!(
            store.update_element(&id, &patch),
            Err(EditorError::Model(_))
        ));
        assert_eq!(store.history().undo_levels(), levels);
    }

    #[test]
    fn test_config_patch_merges() {
        let mut store = store_with_scene();
        let id = store.add_element(ElementType::CustomEvent).unwrap();

        store
            .update_element(
                &id,
                &ElementPatch {
                    config: Some(json!({"eventName": "hype-train"})),
                    ..Default::default()
                },
            )
            .unwrap();

        match &store.current_scene().unwrap().element(&id).unwrap().config {
            ElementConfig::CustomEvent(config) => {
                assert_eq!(config.event_name, "hype-train");
                assert_eq!(config.max_queue_size, 10);
            }
            other => panic!("expected custom event config, got {:?}", other),
        }
    }

    #[test]
    fn test_reorder_swaps_with_neighbour() {
        let mut store = store_with_scene();
        let a = store.add_element(ElementType::Text).unwrap();
        let b = store.add_element(ElementType::Image).unwrap();

        assert_eq!(store.reorder(&a, ReorderDirection::Up), MutationOutcome::Applied);
        let scene = store.current_scene().unwrap();
        assert_eq!(scene.element(&a).unwrap().z_index, 2);
        assert_eq!(scene.element(&b).unwrap().z_index, 1);

        assert_eq!(store.reorder(&a, ReorderDirection::Up), MutationOutcome::Noop);
        assert_eq!(store.reorder("missing", ReorderDirection::Down), MutationOutcome::Noop);
    }

    #[test]
    fn test_reorder_at_end_does_not_push_history() {
        let mut store = store_with_scene();
        let a = store.add_element(ElementType::Text).unwrap();
        let levels = store.history().undo_levels();

        assert_eq!(store.reorder(&a, ReorderDirection::Down), MutationOutcome::Noop);
        assert_eq!(store.history().undo_levels(), levels);
    }

    #[test]
    fn test_set_resolution_clamps() {
        let mut store = store_with_scene();
        store.set_resolution(50, 720);
        let scene = store.current_scene().unwrap();
        assert_eq!((scene.width, scene.height), (100, 720));
    }

    #[test]
    fn test_delete_selected_clears_selection() {
        let mut store = store_with_scene();
        let a = store.add_element(ElementType::Text).unwrap();
        let b = store.add_element(ElementType::Text).unwrap();
        store.select(&a, false);
        store.select(&b, true);

        assert_eq!(store.delete_selected(), MutationOutcome::Applied);
        assert!(store.current_scene().unwrap().elements.is_empty());
        assert!(store.selection().is_empty());
        assert_eq!(store.delete_selected(), MutationOutcome::Noop);
    }

    #[test]
    fn test_select_unknown_element_is_noop() {
        let mut store = store_with_scene();
        assert_eq!(store.select("ghost", false), MutationOutcome::Noop);
        assert!(store.selection().is_empty());
    }

    #[test]
    fn test_switch_scene_resets_history() {
        let mut store = EditorStore::new();
        let mut one = Scene::new("One");
        one.id = Some(1);
        let mut two = Scene::new("Two");
        two.id = Some(2);
        two.is_active = true;
        store.load_scenes(vec![one, two]);
        assert_eq!(store.current_scene_id(), Some(2));

        store.add_element(ElementType::Chat);
        store.switch_scene(1).unwrap();
        assert!(!store.history().can_undo());
        assert!(store.selection().is_empty());

        assert!(matches!(
            store.switch_scene(9),
            Err(EditorError::SceneNotFound(9))
        ));
    }

    #[test]
    fn test_remote_merge_skips_open_scene() {
        let mut store = store_with_scene();
        let mut remote = Scene::new("Remote edit");
        remote.id = Some(1);
        assert_eq!(store.merge_remote_scene(remote), MergeOutcome::SkippedCurrent);
        assert_eq!(store.current_scene().unwrap().name, "Main");

        let mut other = Scene::new("Other");
        other.id = Some(2);
        assert_eq!(store.merge_remote_scene(other.clone()), MergeOutcome::Inserted);
        other.name = "Other v2".to_string();
        assert_eq!(store.merge_remote_scene(other), MergeOutcome::Replaced);
        assert_eq!(store.scene(2).unwrap().name, "Other v2");
    }

    #[test]
    fn test_remove_open_scene_falls_back() {
        let mut store = EditorStore::new();
        let scenes = (1..=3)
            .map(|id| Scene {
                id: Some(id),
                ..Scene::new(format!("S{}", id))
            })
            .collect();
        store.load_scenes(scenes);
        store.switch_scene(2).unwrap();

        assert!(store.remove_scene(2));
        assert_eq!(store.current_scene_id(), Some(1));
        assert!(!store.remove_scene(2));

        assert!(store.remove_scene(3));
        assert_eq!(store.current_scene_id(), Some(1));
    }

    #[test]
    fn test_mark_active_is_exclusive() {
        let mut store = EditorStore::new();
        let scenes = (1..=3)
            .map(|id| Scene {
                id: Some(id),
                is_active: id == 1,
                ..Scene::new(format!("S{}", id))
            })
            .collect();
        store.load_scenes(scenes);

        store.mark_active(3);
        let active: Vec<_> = store
            .scenes()
            .iter()
            .filter(|s| s.is_active)
            .filter_map(|s| s.id)
            .collect();
        assert_eq!(active, vec![3]);
    }

    #[test]
    fn test_saved_record_only_adopted_when_unchanged() {
        let mut store = store_with_scene();
        let saved = store.snapshot_of(1).unwrap();

        let mut record = store.current_scene().unwrap().clone();
        record.updated_at = Some(chrono_now());

        store.add_element(ElementType::Text);
        assert!(!store.apply_saved_record(&record, &saved));
        assert!(store.current_scene().unwrap().updated_at.is_none());

        let saved = store.snapshot_of(1).unwrap();
        assert!(store.apply_saved_record(&record, &saved));
        assert!(store.current_scene().unwrap().updated_at.is_some());
    }

    fn chrono_now() -> overlay_model::Timestamp {
        "2024-05-01T10:00:00Z".parse().unwrap()
    }
}
