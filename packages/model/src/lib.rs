//! # Overlay Model
//!
//! Document model for overlay scenes.
//!
//! ## Structure
//!
//! ```text
//! Scene
//!  ├─ name, width × height (≥ 100 px), is_active
//!  └─ elements: Vec<SceneElement>
//!        ├─ geometry (≥ 40 px), z_index, visible, locked
//!        ├─ style: ElementStyle
//!        └─ config: ElementConfig  (one variant per ElementType)
//! ```
//!
//! Scenes serialize with snake_case keys, elements with camelCase keys and
//! a `"type"` tag next to a free-form `"config"` object. Deserialization
//! checks the config against the tag.

pub mod config;
pub mod defaults;
pub mod element;
pub mod error;
pub mod scene;
pub mod style;

pub use config::{
    AlertBoxConfig, AlertKind, ChatConfig, CustomEventConfig, DataBindingConfig, ElementConfig,
    ImageConfig, TextConfig,
};
pub use element::{
    new_element_id, ElementId, ElementPatch, ElementType, Geometry, SceneElement,
    MIN_ELEMENT_SIZE,
};
pub use error::ModelError;
pub use scene::{
    clamp_dimension, NewScene, Scene, SceneId, ScenePatch, SceneSnapshot, Timestamp,
    DEFAULT_SCENE_HEIGHT, DEFAULT_SCENE_WIDTH, MIN_SCENE_DIMENSION,
};
pub use style::{ElementStyle, TextAlign};
