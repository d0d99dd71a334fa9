//! Broadcast-side scenarios driven through the router.

use overlay_live::{LiveContent, LiveRouter, ALERT_EVENT, CHAT_EVENT};
use overlay_model::{defaults, ElementPatch, ElementType, Scene, SceneElement};
use serde_json::{json, Value};
use tokio::time::{Duration, Instant};

fn configured(element_type: ElementType, id: &str, config: Value) -> SceneElement {
    let mut element = defaults::new_element(element_type, id.to_string(), 0, 1);
    ElementPatch {
        config: Some(config),
        ..Default::default()
    }
    .apply_to(&mut element)
    .unwrap();
    element
}

fn router_with(elements: Vec<SceneElement>) -> LiveRouter {
    let mut router = LiveRouter::new();
    router.load_scene(Scene {
        id: Some(1),
        is_active: true,
        elements,
        ..Scene::new("Live")
    });
    router
}

fn current_alert_user(router: &LiveRouter) -> Option<String> {
    match &router.render()[0].content {
        LiveContent::Alert { alert, .. } => alert.as_ref().map(|a| a.username.clone()),
        other => panic!("expected alert content, got {:?}", other),
    }
}

/// Run the router's timers until nothing is scheduled, like the live session does.
fn run_until_idle(router: &mut LiveRouter, mut on_change: impl FnMut(&LiveRouter, Instant)) {
    while let Some(deadline) = router.next_deadline() {
        if router.tick(deadline) {
            on_change(router, deadline);
        }
    }
}

#[test]
fn test_alerts_display_back_to_back() {
    let start = Instant::now();
    let mut router = router_with(vec![configured(
        ElementType::AlertBox,
        "alerts",
        json!({"duration": 5000}),
    )]);

    for user in ["one", "two", "three"] {
        router.route(
            ALERT_EVENT,
            &json!({"type": "follow", "username": user}),
            start,
        );
    }
    assert_eq!(current_alert_user(&router).as_deref(), Some("one"));

    let mut timeline = Vec::new();
    run_until_idle(&mut router, |router, at| {
        timeline.push((at - start, current_alert_user(router)));
    });

    assert_eq!(
        timeline,
        vec![
            (Duration::from_secs(5), Some("two".to_string())),
            (Duration::from_secs(10), Some("three".to_string())),
            (Duration::from_secs(15), None),
        ]
    );
}

#[test]
fn test_custom_event_keeps_newest_when_full() {
    let start = Instant::now();
    let mut router = router_with(vec![configured(
        ElementType::CustomEvent,
        "hype",
        json!({"eventName": "hype", "template": "#{{n}}", "maxQueueSize": 2, "duration": 1000}),
    )]);

    for n in 1..=5 {
        router.route("hype", &json!({"n": n}), start);
    }

    let mut shown = Vec::new();
    let mut record = |router: &LiveRouter| match &router.render()[0].content {
        LiveContent::CustomEvent { current, .. } => {
            if let Some(item) = current {
                shown.push(item.text.clone());
            }
        }
        other => panic!("expected custom event content, got {:?}", other),
    };
    record(&router);
    run_until_idle(&mut router, |router, _| record(router));

    assert_eq!(shown, vec!["#1", "#4", "#5"]);
}

#[test]
fn test_chat_window_and_fade() {
    let start = Instant::now();
    let mut router = router_with(vec![configured(
        ElementType::Chat,
        "chat",
        json!({"maxMessages": 2, "fadeAfter": 10}),
    )]);
    assert!(router.needs_periodic_tick());

    for (i, text) in ["a", "b", "c"].iter().enumerate() {
        router.route(
            CHAT_EVENT,
            &json!({"username": "v", "message": text}),
            start + Duration::from_secs(i as u64 * 4),
        );
    }

    let messages = |router: &LiveRouter| match &router.render()[0].content {
        LiveContent::Chat { messages, .. } => messages
            .iter()
            .map(|m| m.message.clone())
            .collect::<Vec<_>>(),
        other => panic!("expected chat content, got {:?}", other),
    };
    assert_eq!(messages(&router), vec!["b", "c"]);

    // b arrived at 4s, c at 8s
    let mut now = start;
    while now < start + Duration::from_secs(20) {
        now += Duration::from_secs(1);
        router.tick(now);
        if now == start + Duration::from_secs(14) {
            assert_eq!(messages(&router), vec!["c"]);
        }
    }
    assert!(messages(&router).is_empty());
}

#[test]
fn test_unrelated_events_are_ignored() {
    let start = Instant::now();
    let mut router = router_with(vec![
        configured(ElementType::AlertBox, "alerts", json!({})),
        configured(ElementType::Text, "text", json!({"content": "static"})),
    ]);

    assert!(!router.route("song", &json!({"title": "x"}), start));
    assert!(!router.route(CHAT_EVENT, &json!({"username": "v", "message": "hi"}), start));
    assert_eq!(router.next_deadline(), None);
}
