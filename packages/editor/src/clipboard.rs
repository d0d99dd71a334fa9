//! Copy, paste and duplicate of scene elements.

use overlay_model::{new_element_id, SceneElement};

/// Pasted elements are shifted right and down by this many pixels.
pub const PASTE_OFFSET: f64 = 20.0;

const COPY_SUFFIX: &str = " (copy)";

/// Holds deep copies of the last copied elements.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    contents: Option<Vec<SceneElement>>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the clipboard contents. An empty copy is ignored.
    pub fn copy(&mut self, elements: Vec<SceneElement>) -> bool {
        if elements.is_empty() {
            return false;
        }
        self.contents = Some(elements);
        true
    }

    pub fn contents(&self) -> &[SceneElement] {
        self.contents.as_deref().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.contents().is_empty()
    }

    pub fn clear(&mut self) {
        self.contents = None;
    }
}

/// Build placed copies of `sources`: fresh ids, offset position, stacked
/// above `max_z` in source order, and a `" (copy)"` name suffix.
pub fn place_copies(sources: &[SceneElement], max_z: i64) -> Vec<SceneElement> {
    sources
        .iter()
        .zip(0..)
        .map(|(source, i)| SceneElement {
            id: new_element_id(),
            x: source.x + PASTE_OFFSET,
            y: source.y + PASTE_OFFSET,
            z_index: max_z + 1 + i,
            name: format!("{}{}", source.name, COPY_SUFFIX),
            ..source.clone()
        })
        .collect()
}
