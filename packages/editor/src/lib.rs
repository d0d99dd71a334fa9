//! # Overlay Editor
//!
//! Scene editing engine for overlay composition.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ UI / HTTP: Mutation values                  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditorStore::apply                  │
//! │  - History snapshot before each edit        │
//! │  - Selection and batch transforms           │
//! │  - Clipboard copy/paste/duplicate           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ model: Scene / SceneElement                 │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Snapshots, not inverses**: undo restores a whole-scene snapshot
//! 2. **No-ops are not errors**: a missing target or scene leaves state untouched
//! 3. **History only for real changes**: an edit that changes nothing records nothing
//!
//! ## Usage
//!
//! ```rust
//! use overlay_editor::{EditorStore, Mutation, MutationOutcome};
//! use overlay_model::{ElementType, Scene};
//!
//! let mut store = EditorStore::new();
//! store.load_scenes(vec![Scene { id: Some(1), ..Scene::new("Main") }]);
//!
//! let outcome = store
//!     .apply(Mutation::AddElement { element_type: ElementType::Chat })
//!     .unwrap();
//! assert_eq!(outcome, MutationOutcome::Applied);
//!
//! store.apply(Mutation::Undo).unwrap();
//! assert!(store.current_scene().unwrap().elements.is_empty());
//! ```

pub mod clipboard;
pub mod errors;
pub mod history;
pub mod mutations;
pub mod selection;
pub mod store;
pub mod transform;

pub use clipboard::{Clipboard, PASTE_OFFSET};
pub use errors::EditorError;
pub use history::{History, DEFAULT_HISTORY_DEPTH};
pub use mutations::{Mutation, MutationOutcome, ReorderDirection};
pub use selection::Selection;
pub use store::{EditorStore, MergeOutcome};
pub use transform::{NodeTransform, SurfaceSnapshot};
