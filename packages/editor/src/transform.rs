//! # Batch Transform
//!
//! Resolves the end of a drag or resize gesture into element patches.
//!
//! The rendering surface moves every selected node together while the
//! gesture runs, but only reports the node under the pointer. At gesture end
//! it hands over a [`SurfaceSnapshot`] of every node's live transform, and
//! each selected element receives its own absolute geometry from it.

use std::collections::HashMap;

use overlay_model::{ElementId, ElementPatch, Geometry, Scene, MIN_ELEMENT_SIZE};
use serde::{Deserialize, Serialize};

use crate::Selection;

/// Live transform of one node on the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTransform {
    pub x: f64,
    pub y: f64,
    #[serde(default = "unit_scale")]
    pub scale_x: f64,
    #[serde(default = "unit_scale")]
    pub scale_y: f64,
    #[serde(default)]
    pub rotation: f64,
}

fn unit_scale() -> f64 {
    1.0
}

impl NodeTransform {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
        }
    }
}

/// Node transforms keyed by element id, read from the surface at gesture end.
pub type SurfaceSnapshot = HashMap<ElementId, NodeTransform>;

/// Patches for a finished drag of `target` to `(x, y)`.
pub fn drag_updates(
    scene: &Scene,
    selection: &Selection,
    target: &str,
    x: f64,
    y: f64,
    surface: &SurfaceSnapshot,
) -> Vec<(ElementId, ElementPatch)> {
    if !selection.is_batch_target(target) {
        return vec![(target.to_string(), ElementPatch::position(x, y))];
    }

    selection
        .iter()
        .filter(|id| scene.contains(id))
        .filter_map(|id| {
            // The target's reported position stands in for a missing node
            let (x, y) = match surface.get(id) {
                Some(node) => (node.x, node.y),
                None if id == target => (x, y),
                None => return None,
            };
            Some((id.clone(), ElementPatch::position(x.round(), y.round())))
        })
        .collect()
}

/// Patches for a finished resize/rotate of `target` to `geometry`.
pub fn transform_updates(
    scene: &Scene,
    selection: &Selection,
    target: &str,
    geometry: Geometry,
    surface: &SurfaceSnapshot,
) -> Vec<(ElementId, ElementPatch)> {
    if !selection.is_batch_target(target) {
        return vec![(target.to_string(), ElementPatch::geometry(geometry))];
    }

    selection
        .iter()
        .filter_map(|id| {
            let element = scene.element(id)?;
            let Some(node) = surface.get(id) else {
                return (id == target)
                    .then(|| (id.clone(), ElementPatch::geometry(rounded(geometry))));
            };
            let geometry = Geometry {
                x: node.x.round(),
                y: node.y.round(),
                width: scaled_size(element.width, node.scale_x),
                height: scaled_size(element.height, node.scale_y),
                rotation: node.rotation.round(),
            };
            Some((id.clone(), ElementPatch::geometry(geometry)))
        })
        .collect()
}

fn rounded(geometry: Geometry) -> Geometry {
    Geometry {
        x: geometry.x.round(),
        y: geometry.y.round(),
        width: geometry.width.round().max(MIN_ELEMENT_SIZE),
        height: geometry.height.round().max(MIN_ELEMENT_SIZE),
        rotation: geometry.rotation.round(),
    }
}

fn scaled_size(size: f64, scale: f64) -> f64 {
    (size * scale).round().max(MIN_ELEMENT_SIZE)
}
