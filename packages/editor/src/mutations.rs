//! # Editor Mutations
//!
//! Every editor action as a serializable value.
//!
//! ## Mutation Semantics
//!
//! ### History
//! - Discrete actions push one history entry before they mutate, and only
//!   when they will actually change something
//! - Continuous gestures push once at [`Mutation::BeginGesture`]; the
//!   matching [`Mutation::DragEnd`] / [`Mutation::TransformEnd`] does not
//!
//! ### Missing targets
//! - With no scene open, or when the target element is gone, a mutation is
//!   a no-op ([`MutationOutcome::Noop`]), never an error
//!
//! ### Geometry
//! - Width/height are clamped to the minimum element size
//! - Rotation is stored as given

use overlay_model::{ElementId, ElementPatch, ElementType, Geometry};
use serde::{Deserialize, Serialize};

use crate::SurfaceSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderDirection {
    /// Toward the front (higher z-index)
    Up,
    /// Toward the back
    Down,
}

/// Editor actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    /// Append a new element built from the type's template and select it
    AddElement { element_type: ElementType },

    /// Merge a partial update into one element
    UpdateElement { id: ElementId, patch: ElementPatch },

    /// Remove every selected element
    DeleteSelected,

    /// Swap stacking order with the z-neighbour
    Reorder {
        id: ElementId,
        direction: ReorderDirection,
    },

    ToggleVisibility { id: ElementId },

    ToggleLock { id: ElementId },

    /// Resize the canvas (clamped to the minimum scene dimension)
    SetResolution { width: u32, height: u32 },

    RenameScene { name: String },

    /// Start of a drag/resize gesture; records one history entry
    BeginGesture,

    /// End of a drag gesture on `id`
    DragEnd {
        id: ElementId,
        x: f64,
        y: f64,
        #[serde(default)]
        surface: SurfaceSnapshot,
    },

    /// End of a resize/rotate gesture on `id`
    TransformEnd {
        id: ElementId,
        geometry: Geometry,
        #[serde(default)]
        surface: SurfaceSnapshot,
    },

    Select {
        id: ElementId,
        #[serde(default)]
        additive: bool,
    },

    ClearSelection,

    SelectAll,

    Copy,

    Paste,

    /// Copy and paste the selection without touching the clipboard
    Duplicate,

    Undo,

    Redo,
}

impl Mutation {
    /// Whether this mutation can change the scene's persisted fields.
    pub fn edits_scene(&self) -> bool {
        !matches!(
            self,
            Mutation::BeginGesture
                | Mutation::Select { .. }
                | Mutation::ClearSelection
                | Mutation::SelectAll
                | Mutation::Copy
        )
    }
}

/// Result of applying a [`Mutation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationOutcome {
    /// The editor state changed
    Applied,
    /// Nothing to do (no scene open, missing target, empty selection, ...)
    Noop,
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied)
    }
}
