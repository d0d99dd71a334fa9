use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ElementId, SceneElement};

pub type SceneId = i64;

pub type Timestamp = DateTime<Utc>;

/// Scenes are never narrower or shorter than this, in pixels.
pub const MIN_SCENE_DIMENSION: u32 = 100;

pub const DEFAULT_SCENE_WIDTH: u32 = 1920;

pub const DEFAULT_SCENE_HEIGHT: u32 = 1080;

pub fn clamp_dimension(value: u32) -> u32 {
    value.max(MIN_SCENE_DIMENSION)
}

/// A named, sized composition of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawScene")]
pub struct Scene {
    /// `None` until the scene has been persisted.
    pub id: Option<SceneId>,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub elements: Vec<SceneElement>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Stored or transmitted form of a [`Scene`], before the canvas is clamped.
#[derive(Deserialize)]
struct RawScene {
    #[serde(default)]
    id: Option<SceneId>,
    name: String,
    #[serde(default = "default_width")]
    width: u32,
    #[serde(default = "default_height")]
    height: u32,
    #[serde(default)]
    elements: Vec<SceneElement>,
    #[serde(default)]
    is_active: bool,
    #[serde(default)]
    created_at: Option<Timestamp>,
    #[serde(default)]
    updated_at: Option<Timestamp>,
}

impl From<RawScene> for Scene {
    fn from(raw: RawScene) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            width: clamp_dimension(raw.width),
            height: clamp_dimension(raw.height),
            elements: raw.elements,
            is_active: raw.is_active,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

fn default_width() -> u32 {
    DEFAULT_SCENE_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_SCENE_HEIGHT
}

impl Scene {
    /// Empty, unsaved scene with the default canvas size.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            width: DEFAULT_SCENE_WIDTH,
            height: DEFAULT_SCENE_HEIGHT,
            elements: Vec::new(),
            is_active: false,
            created_at: None,
            updated_at: None,
        }
    }

    /// Deep copy of the persisted, undoable fields.
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            elements: self.elements.clone(),
            name: self.name.clone(),
            width: self.width,
            height: self.height,
        }
    }

    pub fn restore(&mut self, snapshot: SceneSnapshot) {
        self.elements = snapshot.elements;
        self.name = snapshot.name;
        self.width = snapshot.width;
        self.height = snapshot.height;
    }

    /// Highest z-index in the scene, never below 0.
    pub fn max_z(&self) -> i64 {
        self.elements
            .iter()
            .map(|el| el.z_index)
            .fold(0, i64::max)
    }

    pub fn element(&self, id: &str) -> Option<&SceneElement> {
        self.elements.iter().find(|el| el.id == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut SceneElement> {
        self.elements.iter_mut().find(|el| el.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.element(id).is_some()
    }

    pub fn element_ids(&self) -> impl Iterator<Item = &ElementId> {
        self.elements.iter().map(|el| &el.id)
    }
}

/// Immutable copy of a scene's `{elements, name, width, height}`.
///
/// Used as a history entry, as the autosave payload, and as the equality
/// key for skipping redundant writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub elements: Vec<SceneElement>,
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl From<SceneSnapshot> for ScenePatch {
    fn from(snapshot: SceneSnapshot) -> Self {
        Self {
            name: Some(snapshot.name),
            width: Some(snapshot.width),
            height: Some(snapshot.height),
            elements: Some(snapshot.elements),
            is_active: None,
        }
    }
}

/// Payload for creating a scene in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScene {
    pub name: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub elements: Vec<SceneElement>,
}

impl NewScene {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width: DEFAULT_SCENE_WIDTH,
            height: DEFAULT_SCENE_HEIGHT,
            elements: Vec::new(),
        }
    }
}

/// Partial update of a stored scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<SceneElement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ScenePatch {
    /// Apply the patch to a stored scene, clamping the canvas size.
    pub fn apply_to(self, scene: &mut Scene) {
        if let Some(name) = self.name {
            scene.name = name;
        }
        if let Some(width) = self.width {
            scene.width = clamp_dimension(width);
        }
        if let Some(height) = self.height {
            scene.height = clamp_dimension(height);
        }
        if let Some(elements) = self.elements {
            scene.elements = elements;
        }
        if let Some(is_active) = self.is_active {
            scene.is_active = is_active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{defaults, ElementType};

    #[test]
    fn test_max_z_never_negative() {
        let mut scene = Scene::new("Main");
        assert_eq!(scene.max_z(), 0);

        let mut element = defaults::new_element(ElementType::Text, "t".into(), 0, 0);
        element.z_index = -3;
        scene.elements.push(element);
        assert_eq!(scene.max_z(), 0);
    }

    #[test]
    fn test_stored_canvas_is_clamped() {
        let scene: Scene = serde_json::from_value(serde_json::json!({
            "id": 4,
            "name": "Tiny",
            "width": 10,
            "height": 0
        }))
        .unwrap();

        assert_eq!(scene.width, MIN_SCENE_DIMENSION);
        assert_eq!(scene.height, MIN_SCENE_DIMENSION);
        assert_eq!(scene.id, Some(4));
        assert!(scene.elements.is_empty());
    }

    #[test]
    fn test_snapshot_restore() {
        let mut scene = Scene::new("Main");
        let snapshot = scene.snapshot();

        scene.name = "Renamed".to_string();
        scene.width = 1280;
        scene
            .elements
            .push(defaults::new_element(ElementType::Image, "i".into(), 0, 1));

        scene.restore(snapshot.clone());
        assert_eq!(scene.snapshot(), snapshot);
    }

    #[test]
    fn test_patch_clamps_dimensions() {
        let mut scene = Scene::new("Main");
        ScenePatch {
            width: Some(10),
            height: Some(720),
            ..Default::default()
        }
        .apply_to(&mut scene);

        assert_eq!(scene.width, MIN_SCENE_DIMENSION);
        assert_eq!(scene.height, 720);
    }

    #[test]
    fn test_scene_json_is_snake_case() {
        let scene = Scene {
            id: Some(4),
            is_active: true,
            ..Scene::new("Main")
        };
        let json = serde_json::to_value(&scene).unwrap();
        assert_eq!(json["is_active"], true);
        assert_eq!(json["width"], 1920);
        assert!(json.get("created_at").is_none());
    }
}
