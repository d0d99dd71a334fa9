use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ElementConfig, ElementStyle, ModelError};

pub type ElementId = String;

/// Elements are never narrower or shorter than this, in pixels.
pub const MIN_ELEMENT_SIZE: f64 = 40.0;

/// Fresh, globally unique element id.
pub fn new_element_id() -> ElementId {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementType {
    AlertBox,
    Chat,
    Text,
    Image,
    CustomEvent,
}

impl ElementType {
    pub const ALL: [ElementType; 5] = [
        ElementType::AlertBox,
        ElementType::Chat,
        ElementType::Text,
        ElementType::Image,
        ElementType::CustomEvent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::AlertBox => "alert-box",
            ElementType::Chat => "chat",
            ElementType::Text => "text",
            ElementType::Image => "image",
            ElementType::CustomEvent => "custom-event",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| ModelError::UnknownElementType(s.to_string()))
    }
}

/// Position, size and rotation of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

impl Geometry {
    /// Same geometry with width/height raised to [`MIN_ELEMENT_SIZE`].
    pub fn clamped(self) -> Self {
        Self {
            width: clamp_size(self.width),
            height: clamp_size(self.height),
            ..self
        }
    }
}

pub(crate) fn clamp_size(value: f64) -> f64 {
    if value.is_nan() {
        MIN_ELEMENT_SIZE
    } else {
        value.max(MIN_ELEMENT_SIZE)
    }
}

/// One positioned, typed widget within a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawElement", into = "RawElement")]
pub struct SceneElement {
    pub id: ElementId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Degrees, stored as given.
    pub rotation: f64,
    pub z_index: i64,
    pub visible: bool,
    pub locked: bool,
    pub style: ElementStyle,
    pub config: ElementConfig,
}

impl SceneElement {
    pub fn element_type(&self) -> ElementType {
        self.config.element_type()
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
        }
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        let geometry = geometry.clamped();
        self.x = geometry.x;
        self.y = geometry.y;
        self.width = geometry.width;
        self.height = geometry.height;
        self.rotation = geometry.rotation;
    }
}

/// Wire form of [`SceneElement`]: the type tag and config travel separately
/// and are checked against each other on the way in.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawElement {
    id: ElementId,
    #[serde(rename = "type")]
    element_type: ElementType,
    name: String,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    #[serde(default)]
    rotation: f64,
    #[serde(default)]
    z_index: i64,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    style: ElementStyle,
    #[serde(default)]
    config: Value,
}

fn default_true() -> bool {
    true
}

impl TryFrom<RawElement> for SceneElement {
    type Error = ModelError;

    fn try_from(raw: RawElement) -> Result<Self, Self::Error> {
        let config = ElementConfig::from_value(raw.element_type, raw.config)?;
        Ok(Self {
            id: raw.id,
            name: raw.name,
            x: raw.x,
            y: raw.y,
            width: clamp_size(raw.width),
            height: clamp_size(raw.height),
            rotation: raw.rotation,
            z_index: raw.z_index,
            visible: raw.visible,
            locked: raw.locked,
            style: raw.style,
            config,
        })
    }
}

impl From<SceneElement> for RawElement {
    fn from(element: SceneElement) -> Self {
        Self {
            element_type: element.element_type(),
            config: element.config.to_value(),
            id: element.id,
            name: element.name,
            x: element.x,
            y: element.y,
            width: element.width,
            height: element.height,
            rotation: element.rotation,
            z_index: element.z_index,
            visible: element.visible,
            locked: element.locked,
            style: element.style,
        }
    }
}

/// Partial update of a [`SceneElement`].
///
/// Top-level fields replace, `style` merges field by field, and `config` is
/// shallow-merged into the element's config and re-validated against its
/// type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ElementStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl ElementPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn geometry(geometry: Geometry) -> Self {
        Self {
            x: Some(geometry.x),
            y: Some(geometry.y),
            width: Some(geometry.width),
            height: Some(geometry.height),
            rotation: Some(geometry.rotation),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch. A config patch that does not fit the element's type
    /// fails and leaves the element unchanged.
    pub fn apply_to(&self, element: &mut SceneElement) -> Result<(), ModelError> {
        let config = match &self.config {
            Some(patch) => {
                let mut config = element.config.clone();
                config.merge_patch(patch)?;
                Some(config)
            }
            None => None,
        };

        if let Some(name) = &self.name {
            element.name = name.clone();
        }
        if let Some(x) = self.x {
            element.x = x;
        }
        if let Some(y) = self.y {
            element.y = y;
        }
        if let Some(width) = self.width {
            element.width = clamp_size(width);
        }
        if let Some(height) = self.height {
            element.height = clamp_size(height);
        }
        if let Some(rotation) = self.rotation {
            element.rotation = rotation;
        }
        if let Some(z_index) = self.z_index {
            element.z_index = z_index;
        }
        if let Some(visible) = self.visible {
            element.visible = visible;
        }
        if let Some(locked) = self.locked {
            element.locked = locked;
        }
        if let Some(style) = &self.style {
            element.style.merge(style);
        }
        if let Some(config) = config {
            element.config = config;
        }

        Ok(())
    }
}
