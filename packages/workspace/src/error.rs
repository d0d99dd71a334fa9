use overlay_editor::EditorError;
use overlay_model::SceneId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Scene not found: {0}")]
    NotFound(SceneId),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Io(_) | StorageError::Unavailable(_))
    }
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error("No scene is open for editing")]
    NoCurrentScene,

    #[error("Scene {0} is the only scene and is active")]
    ActiveSceneDelete(SceneId),
}

pub type StorageResult<T> = Result<T, StorageError>;
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
