//! Scenes as they are stored and sent over the wire.

use overlay_model::{AlertKind, ElementConfig, ElementType, Scene};
use serde_json::json;

fn stored_scene() -> serde_json::Value {
    json!({
        "id": 3,
        "name": "Starting Soon",
        "width": 1280,
        "height": 720,
        "is_active": true,
        "created_at": "2024-03-01T12:00:00Z",
        "updated_at": "2024-03-01T12:05:00Z",
        "elements": [
            {
                "id": "6a1f",
                "type": "alert-box",
                "name": "Alert Box 1",
                "x": 660, "y": 390, "width": 600, "height": 300,
                "rotation": 0, "zIndex": 1,
                "visible": true, "locked": false,
                "style": {"backgroundColor": "rgba(0, 0, 0, 0.85)", "borderRadius": 12},
                "config": {"alertTypes": ["follow", "raid"], "duration": 7000, "animation": "fadeInUp"}
            },
            {
                "id": "9c2e",
                "type": "text",
                "name": "Now Playing",
                "x": 760, "y": 50, "width": 400, "height": 60,
                "rotation": 15, "zIndex": 2,
                "visible": false, "locked": true,
                "style": {"fontSize": 32, "textAlign": "center"},
                "config": {
                    "content": "Nothing playing",
                    "fontWeight": "bold",
                    "lineHeight": 1.5,
                    "dataBinding": {
                        "enabled": true,
                        "eventName": "song",
                        "fieldPath": "title",
                        "template": "♪ {{artist}} - {{title}}",
                        "timeout": 30
                    }
                }
            }
        ]
    })
}

#[test]
fn test_stored_scene_parses() {
    let scene: Scene = serde_json::from_value(stored_scene()).unwrap();

    assert_eq!(scene.id, Some(3));
    assert!(scene.is_active);
    assert!(scene.created_at.is_some());
    assert_eq!(scene.elements.len(), 2);

    let alert = &scene.elements[0];
    assert_eq!(alert.element_type(), ElementType::AlertBox);
    match &alert.config {
        ElementConfig::AlertBox(config) => {
            assert!(config.alert_types.contains(&AlertKind::Raid));
            assert!(!config.alert_types.contains(&AlertKind::Donation));
            assert_eq!(config.duration, 7000);
        }
        other => panic!("expected alert box config, got {:?}", other),
    }

    let text = &scene.elements[1];
    assert!(!text.visible);
    assert!(text.locked);
    assert_eq!(text.rotation, 15.0);
    let binding = text.config.data_binding().unwrap();
    assert!(binding.is_live());
    assert_eq!(binding.timeout, Some(30));
}

#[test]
fn test_scene_survives_reserialization() {
    let scene: Scene = serde_json::from_value(stored_scene()).unwrap();
    let json = serde_json::to_string(&scene).unwrap();
    let reparsed: Scene = serde_json::from_str(&json).unwrap();
    assert_eq!(scene, reparsed);
}

#[test]
fn test_unknown_element_type_fails() {
    let mut raw = stored_scene();
    raw["elements"][0]["type"] = json!("marquee");
    assert!(serde_json::from_value::<Scene>(raw).is_err());
}

#[test]
fn test_minimal_scene_gets_defaults() {
    let scene: Scene = serde_json::from_value(json!({"name": "Blank"})).unwrap();
    assert_eq!(scene.id, None);
    assert_eq!((scene.width, scene.height), (1920, 1080));
    assert!(scene.elements.is_empty());
    assert!(!scene.is_active);
}
