//! Error types for the document model

use thiserror::Error;

use crate::ElementType;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Unknown element type: {0}")]
    UnknownElementType(String),

    #[error("Invalid {element_type} config: {source}")]
    InvalidConfig {
        element_type: ElementType,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config patch must be a JSON object")]
    ConfigPatchNotObject,
}
