//! Starting geometry, style and config for each element type.

use crate::{ElementConfig, ElementId, ElementStyle, ElementType, Geometry, SceneElement, TextAlign};

const FONT_STACK: &str = "Inter, system-ui, sans-serif";

/// Base name of a new element, before its ordinal.
pub fn display_name(element_type: ElementType) -> &'static str {
    match element_type {
        ElementType::AlertBox => "Alert Box",
        ElementType::Chat => "Chat",
        ElementType::Text => "Text",
        ElementType::Image => "Image",
        ElementType::CustomEvent => "Custom Event",
    }
}

pub fn default_geometry(element_type: ElementType) -> Geometry {
    let (x, y, width, height) = match element_type {
        ElementType::AlertBox => (660.0, 390.0, 600.0, 300.0),
        ElementType::Chat => (50.0, 600.0, 400.0, 400.0),
        ElementType::Text => (760.0, 50.0, 400.0, 60.0),
        ElementType::Image => (760.0, 440.0, 400.0, 200.0),
        ElementType::CustomEvent => (660.0, 390.0, 500.0, 200.0),
    };
    Geometry {
        x,
        y,
        width,
        height,
        rotation: 0.0,
    }
}

pub fn default_style(element_type: ElementType) -> ElementStyle {
    let text = |font_size: f64, padding: f64, align: Option<TextAlign>| ElementStyle {
        opacity: Some(1.0),
        font_family: Some(FONT_STACK.to_string()),
        font_size: Some(font_size),
        color: Some("#ffffff".to_string()),
        padding: Some(padding),
        text_align: align,
        ..Default::default()
    };

    match element_type {
        ElementType::AlertBox => ElementStyle {
            background_color: Some("rgba(0, 0, 0, 0.85)".to_string()),
            border_radius: Some(12.0),
            border: Some("2px solid #FF3B30".to_string()),
            ..text(24.0, 32.0, Some(TextAlign::Center))
        },
        ElementType::Chat => ElementStyle {
            background_color: Some("rgba(0, 0, 0, 0.6)".to_string()),
            border_radius: Some(8.0),
            ..text(16.0, 8.0, None)
        },
        ElementType::Text => ElementStyle {
            background_color: Some("transparent".to_string()),
            border_radius: Some(0.0),
            ..text(32.0, 8.0, Some(TextAlign::Center))
        },
        ElementType::Image => ElementStyle {
            background_color: Some("transparent".to_string()),
            border_radius: Some(0.0),
            opacity: Some(1.0),
            ..Default::default()
        },
        ElementType::CustomEvent => ElementStyle {
            background_color: Some("rgba(0, 0, 0, 0.85)".to_string()),
            border_radius: Some(12.0),
            border: Some("2px solid #8B5CF6".to_string()),
            ..text(24.0, 16.0, Some(TextAlign::Center))
        },
    }
}

/// Build a new element of `element_type` from its template.
///
/// `existing_of_type` is the number of elements of the same type already in
/// the scene; the new one is named after the next ordinal.
pub fn new_element(
    element_type: ElementType,
    id: ElementId,
    existing_of_type: usize,
    z_index: i64,
) -> SceneElement {
    let geometry = default_geometry(element_type);
    SceneElement {
        id,
        name: format!("{} {}", display_name(element_type), existing_of_type + 1),
        x: geometry.x,
        y: geometry.y,
        width: geometry.width,
        height: geometry.height,
        rotation: geometry.rotation,
        z_index,
        visible: true,
        locked: false,
        style: default_style(element_type),
        config: ElementConfig::default_for(element_type),
    }
}
