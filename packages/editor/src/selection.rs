//! Multi-selection of elements within the current scene.

use indexmap::IndexSet;
use overlay_model::ElementId;

/// Insertion-ordered set of selected element ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    ids: IndexSet<ElementId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-additive selection replaces the set with `{id}`; additive
    /// selection toggles `id` in or out.
    pub fn select(&mut self, id: &str, additive: bool) {
        if additive {
            if !self.ids.shift_remove(id) {
                self.ids.insert(id.to_string());
            }
        } else {
            self.ids.clear();
            self.ids.insert(id.to_string());
        }
    }

    pub fn replace<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ElementId>,
    {
        self.ids = ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementId> {
        self.ids.iter()
    }

    /// Drop ids that no longer exist.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.ids.retain(|id| keep(id));
    }

    /// Whether a gesture on `target` should move the whole selection.
    pub fn is_batch_target(&self, target: &str) -> bool {
        self.ids.len() > 1 && self.ids.contains(target)
    }

    pub fn to_vec(&self) -> Vec<ElementId> {
        self.ids.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_select_replaces() {
        let mut selection = Selection::new();
        selection.select("a", false);
        selection.select("b", false);
        assert_eq!(selection.to_vec(), vec!["b".to_string()]);
    }

    #[test]
    fn test_additive_select_toggles() {
        let mut selection = Selection::new();
        selection.select("a", false);
        selection.select("b", true);
        selection.select("c", true);
        assert_eq!(selection.len(), 3);

        selection.select("b", true);
        assert_eq!(selection.to_vec(), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_batch_target() {
        let mut selection = Selection::new();
        selection.select("a", false);
        assert!(!selection.is_batch_target("a"));

        selection.select("b", true);
        assert!(selection.is_batch_target("a"));
        assert!(!selection.is_batch_target("z"));
    }

    #[test]
    fn test_retain_prunes() {
        let mut selection = Selection::new();
        selection.replace(vec!["a".to_string(), "b".to_string()]);
        selection.retain(|id| id != "a");
        assert!(!selection.contains("a"));
        assert!(selection.contains("b"));
    }
}
