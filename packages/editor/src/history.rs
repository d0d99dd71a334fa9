//! # Undo/Redo History
//!
//! Snapshot-based history for the scene open in the editor.
//!
//! ## Design
//!
//! - Every mutating action pushes a snapshot of the scene *before* it runs
//! - Undo swaps the current state for the newest past snapshot
//! - Redo swaps it back for the newest future snapshot
//! - A new push clears the future
//! - Both stacks are bounded; the oldest entries are dropped
//!
//! ## Example
//!
//! ```rust
//! use overlay_editor::History;
//! use overlay_model::Scene;
//!
//! let mut scene = Scene::new("Main");
//! let mut history = History::new();
//!
//! history.push(scene.snapshot());
//! scene.name = "Renamed".to_string();
//!
//! let previous = history.undo(scene.snapshot()).unwrap();
//! scene.restore(previous);
//! assert_eq!(scene.name, "Main");
//! ```

use std::collections::VecDeque;

use overlay_model::SceneSnapshot;

pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// Undo/redo stacks of scene snapshots
#[derive(Debug, Clone)]
pub struct History {
    /// States before each applied action (most recent last)
    past: VecDeque<SceneSnapshot>,

    /// States replaced by undo (most recent last)
    future: VecDeque<SceneSnapshot>,

    /// Maximum entries per stack (0 = unlimited)
    max_levels: usize,
}

impl History {
    /// Create a history with the default depth (50)
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_HISTORY_DEPTH)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            max_levels,
        }
    }

    /// Record the state before a mutation. Invalidates the future.
    pub fn push(&mut self, snapshot: SceneSnapshot) {
        push_bounded(&mut self.past, snapshot, self.max_levels);
        self.future.clear();
    }

    /// Step back. `current` is kept for redo; returns the state to restore.
    pub fn undo(&mut self, current: SceneSnapshot) -> Option<SceneSnapshot> {
        let previous = self.past.pop_back()?;
        push_bounded(&mut self.future, current, self.max_levels);
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: SceneSnapshot) -> Option<SceneSnapshot> {
        let next = self.future.pop_back()?;
        push_bounded(&mut self.past, current, self.max_levels);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.past.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.future.len()
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

fn push_bounded(stack: &mut VecDeque<SceneSnapshot>, snapshot: SceneSnapshot, max_levels: usize) {
    stack.push_back(snapshot);
    if max_levels > 0 {
        while stack.len() > max_levels {
            stack.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_model::Scene;

    fn named(name: &str) -> SceneSnapshot {
        Scene::new(name).snapshot()
    }

    #[test]
    fn test_history_creation() {
        let history = History::new();
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.max_levels(), 50);
    }

    #[test]
    fn test_undo_then_redo() {
        let mut history = History::new();
        history.push(named("a"));

        let restored = history.undo(named("b")).unwrap();
        assert_eq!(restored.name, "a");
        assert_eq!(history.redo_levels(), 1);

        let reapplied = history.redo(named("a")).unwrap();
        assert_eq!(reapplied.name, "b");
        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_empty_undo_is_noop() {
        let mut history = History::new();
        assert!(history.undo(named("a")).is_none());
        assert!(history.redo(named("a")).is_none());
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_new_push_clears_redo() {
        let mut history = History::new();
        history.push(named("a"));
        history.undo(named("b"));
        assert_eq!(history.redo_levels(), 1);

        history.push(named("c"));
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut history = History::with_max_levels(2);
        for i in 0..3 {
            history.push(named(&format!("s{}", i)));
        }

        assert_eq!(history.undo_levels(), 2);
        let newest = history.undo(named("now")).unwrap();
        assert_eq!(newest.name, "s2");
        let oldest = history.undo(named("s2")).unwrap();
        assert_eq!(oldest.name, "s1");
        assert!(!history.can_undo());
    }

    #[test]
    fn test_redo_respects_bound() {
        let mut history = History::with_max_levels(2);
        for i in 0..2 {
            history.push(named(&format!("s{}", i)));
        }
        history.undo(named("x"));
        history.redo(named("s1"));
        history.redo(named("ignored"));
        assert!(history.undo_levels() <= 2);
    }
}
