//! Error types for the editor

use overlay_model::{ModelError, SceneId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Scene not found: {0}")]
    SceneNotFound(SceneId),

    #[error("Scene has not been saved yet")]
    UnsavedScene,
}
