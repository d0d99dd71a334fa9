//! Integration tests for editor crate

use overlay_editor::{
    EditorStore, Mutation, MutationOutcome, NodeTransform, ReorderDirection, SurfaceSnapshot,
};
use overlay_model::{ElementPatch, ElementType, Geometry, Scene, MIN_ELEMENT_SIZE};

fn store() -> EditorStore {
    let mut store = EditorStore::new();
    store.load_scenes(vec![Scene {
        id: Some(1),
        ..Scene::new("Main")
    }]);
    store
}

fn add(store: &mut EditorStore, element_type: ElementType) -> String {
    store.add_element(element_type).expect("scene is open")
}

#[test]
fn test_clipboard_round_trip() {
    let mut store = store();
    let a = add(&mut store, ElementType::Text);
    let b = add(&mut store, ElementType::Chat);
    store.select(&a, false);
    store.select(&b, true);

    store.apply(Mutation::Copy).unwrap();
    let before = store.current_scene().unwrap().elements.clone();
    let max_z = store.current_scene().unwrap().max_z();

    assert_eq!(store.apply(Mutation::Paste).unwrap(), MutationOutcome::Applied);

    let scene = store.current_scene().unwrap();
    assert_eq!(scene.elements.len(), 4);

    let pasted: Vec<_> = store
        .selection()
        .iter()
        .map(|id| scene.element(id).unwrap())
        .collect();
    assert_eq!(pasted.len(), 2);

    for (i, (copy, original)) in pasted.iter().zip(&before).enumerate() {
        assert!(before.iter().all(|el| el.id != copy.id));
        assert_eq!(copy.x, original.x + 20.0);
        assert_eq!(copy.y, original.y + 20.0);
        assert_eq!(copy.z_index, max_z + 1 + i as i64);
        assert_eq!(copy.name, format!("{} (copy)", original.name));
        assert_eq!(copy.config, original.config);
        assert_eq!(copy.style, original.style);
    }
}

#[test]
fn test_paste_twice_stacks_above() {
    let mut store = store();
    let a = add(&mut store, ElementType::Image);
    store.select(&a, false);
    store.copy();

    store.paste();
    store.paste();

    let scene = store.current_scene().unwrap();
    let mut z: Vec<_> = scene.elements.iter().map(|el| el.z_index).collect();
    z.sort();
    assert_eq!(z, vec![1, 2, 3]);
}

#[test]
fn test_duplicate_leaves_clipboard_alone() {
    let mut store = store();
    let a = add(&mut store, ElementType::Text);
    store.select(&a, false);

    assert_eq!(store.apply(Mutation::Duplicate).unwrap(), MutationOutcome::Applied);
    assert!(store.clipboard().is_empty());
    assert_eq!(store.current_scene().unwrap().elements.len(), 2);
    assert!(!store.selection().contains(&a));
}

#[test]
fn test_paste_with_empty_clipboard_is_noop() {
    let mut store = store();
    add(&mut store, ElementType::Text);
    let levels = store.history().undo_levels();

    assert_eq!(store.apply(Mutation::Paste).unwrap(), MutationOutcome::Noop);
    assert_eq!(store.history().undo_levels(), levels);
}

#[test]
fn test_batch_drag_moves_only_selected() {
    let mut store = store();
    let a = add(&mut store, ElementType::Text);
    let b = add(&mut store, ElementType::Image);
    let c = add(&mut store, ElementType::Chat);
    store.select(&a, false);
    store.select(&b, true);

    let untouched = store.current_scene().unwrap().element(&c).unwrap().clone();

    store.apply(Mutation::BeginGesture).unwrap();
    let levels = store.history().undo_levels();

    let surface = SurfaceSnapshot::from([
        (a.clone(), NodeTransform::at(110.4, 210.6)),
        (b.clone(), NodeTransform::at(510.0, 610.0)),
        (c.clone(), NodeTransform::at(0.0, 0.0)),
    ]);
    let outcome = store
        .apply(Mutation::DragEnd {
            id: a.clone(),
            x: 110.4,
            y: 210.6,
            surface,
        })
        .unwrap();
    assert_eq!(outcome, MutationOutcome::Applied);
    assert_eq!(store.history().undo_levels(), levels);

    let scene = store.current_scene().unwrap();
    let moved_a = scene.element(&a).unwrap();
    assert_eq!((moved_a.x, moved_a.y), (110.0, 211.0));
    let moved_b = scene.element(&b).unwrap();
    assert_eq!((moved_b.x, moved_b.y), (510.0, 610.0));
    assert_eq!(scene.element(&c).unwrap(), &untouched);

    store.apply(Mutation::Undo).unwrap();
    let scene = store.current_scene().unwrap();
    assert_ne!(scene.element(&a).unwrap().x, 110.0);
}

#[test]
fn test_batch_drag_without_surface_moves_target() {
    let mut store = store();
    let a = add(&mut store, ElementType::Text);
    let b = add(&mut store, ElementType::Image);
    store.select(&a, false);
    store.select(&b, true);
    let b_before = store.current_scene().unwrap().element(&b).unwrap().clone();

    store.apply(Mutation::BeginGesture).unwrap();
    let outcome = store
        .apply(Mutation::DragEnd {
            id: a.clone(),
            x: 500.0,
            y: 400.0,
            surface: SurfaceSnapshot::new(),
        })
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Applied);
    let scene = store.current_scene().unwrap();
    let moved = scene.element(&a).unwrap();
    assert_eq!((moved.x, moved.y), (500.0, 400.0));
    assert_eq!(scene.element(&b).unwrap(), &b_before);
}

#[test]
fn test_single_transform_clamps_size() {
    let mut store = store();
    let a = add(&mut store, ElementType::Text);
    store.select(&a, false);

    store.apply(Mutation::BeginGesture).unwrap();
    store
        .apply(Mutation::TransformEnd {
            id: a.clone(),
            geometry: Geometry {
                x: 5.0,
                y: 6.0,
                width: 12.0,
                height: 300.0,
                rotation: 33.3,
            },
            surface: SurfaceSnapshot::new(),
        })
        .unwrap();

    let element = store.current_scene().unwrap().element(&a).unwrap().clone();
    assert_eq!(element.width, MIN_ELEMENT_SIZE);
    assert_eq!(element.height, 300.0);
    assert_eq!(element.rotation, 33.3);
}

#[test]
fn test_mutations_from_json() {
    let mut store = store();
    let a = add(&mut store, ElementType::AlertBox);

    let mutations: Vec<Mutation> = serde_json::from_value(serde_json::json!([
        {"type": "toggleLock", "id": a},
        {"type": "toggleVisibility", "id": a},
        {"type": "setResolution", "width": 1280, "height": 720},
        {"type": "renameScene", "name": "Be Right Back"}
    ]))
    .unwrap();

    for mutation in mutations {
        assert_eq!(store.apply(mutation).unwrap(), MutationOutcome::Applied);
    }

    let scene = store.current_scene().unwrap();
    let element = scene.element(&a).unwrap();
    assert!(element.locked);
    assert!(!element.visible);
    assert_eq!((scene.width, scene.height), (1280, 720));
    assert_eq!(scene.name, "Be Right Back");
}

#[test]
fn test_revision_tracks_scene_changes_only() {
    let mut store = store();
    let a = add(&mut store, ElementType::Text);
    let revision = store.revision();

    store.apply(Mutation::SelectAll).unwrap();
    store.apply(Mutation::Copy).unwrap();
    store.apply(Mutation::BeginGesture).unwrap();
    assert_eq!(store.revision(), revision);

    store
        .apply(Mutation::UpdateElement {
            id: a,
            patch: ElementPatch::position(1.0, 2.0),
        })
        .unwrap();
    assert!(store.revision() > revision);
}

#[test]
fn test_reorder_through_apply() {
    let mut store = store();
    let a = add(&mut store, ElementType::Text);
    let b = add(&mut store, ElementType::Text);

    store
        .apply(Mutation::Reorder {
            id: b.clone(),
            direction: ReorderDirection::Down,
        })
        .unwrap();

    let scene = store.current_scene().unwrap();
    assert!(scene.element(&b).unwrap().z_index < scene.element(&a).unwrap().z_index);
}
