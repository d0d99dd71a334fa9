//! # Event Router
//!
//! Routes named events to the live state of each element in the broadcast
//! scene and produces the render model for the overlay view.
//!
//! The router never touches the document model. Reloading a scene keeps the
//! transient state (queues, bound values) of every element whose id and type
//! survive, reconfigured to its new settings.

use std::collections::{BTreeSet, HashMap};

use overlay_common::earliest;
use overlay_model::{ElementId, ElementConfig, ElementStyle, ElementType, Scene, SceneElement, SceneId};
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::warn;

use crate::alerts::headline;
use crate::{
    Alert, AlertQueue, BindingMode, BoundValue, ChatMessage, ChatWindow, CustomEventQueue,
    QueuedText,
};

/// Event carrying stream alerts
pub const ALERT_EVENT: &str = "alert";

/// Event carrying chat lines
pub const CHAT_EVENT: &str = "chat-message";

/// Transient live state of one element
#[derive(Debug)]
pub enum LiveWidget {
    AlertBox(AlertQueue),
    Chat(ChatWindow),
    Text(BoundValue),
    Image(BoundValue),
    CustomEvent(CustomEventQueue),
}

/// An incoming event, with the well-known payloads parsed once.
struct Incoming<'a> {
    name: &'a str,
    payload: &'a Value,
    alert: Option<Alert>,
    chat: Option<ChatMessage>,
}

impl LiveWidget {
    pub fn for_element(element: &SceneElement) -> Self {
        match &element.config {
            ElementConfig::AlertBox(config) => LiveWidget::AlertBox(AlertQueue::new(config)),
            ElementConfig::Chat(config) => LiveWidget::Chat(ChatWindow::new(config)),
            ElementConfig::Text(config) => {
                LiveWidget::Text(BoundValue::new(config.data_binding.as_ref(), BindingMode::Text))
            }
            ElementConfig::Image(config) => LiveWidget::Image(BoundValue::new(
                config.data_binding.as_ref(),
                BindingMode::Image,
            )),
            ElementConfig::CustomEvent(config) => {
                LiveWidget::CustomEvent(CustomEventQueue::new(config))
            }
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            LiveWidget::AlertBox(_) => ElementType::AlertBox,
            LiveWidget::Chat(_) => ElementType::Chat,
            LiveWidget::Text(_) => ElementType::Text,
            LiveWidget::Image(_) => ElementType::Image,
            LiveWidget::CustomEvent(_) => ElementType::CustomEvent,
        }
    }

    /// Apply new settings, keeping transient state. Returns `false` when the
    /// element changed type and needs a fresh widget.
    fn reconfigure(&mut self, element: &SceneElement) -> bool {
        match (self, &element.config) {
            (LiveWidget::AlertBox(queue), ElementConfig::AlertBox(config)) => {
                queue.reconfigure(config)
            }
            (LiveWidget::Chat(window), ElementConfig::Chat(config)) => window.reconfigure(config),
            (LiveWidget::Text(bound), ElementConfig::Text(config)) => {
                bound.reconfigure(config.data_binding.as_ref())
            }
            (LiveWidget::Image(bound), ElementConfig::Image(config)) => {
                bound.reconfigure(config.data_binding.as_ref())
            }
            (LiveWidget::CustomEvent(queue), ElementConfig::CustomEvent(config)) => {
                queue.reconfigure(config)
            }
            _ => return false,
        }
        true
    }

    /// Event name this widget consumes, if any.
    pub fn event_name(&self) -> Option<&str> {
        match self {
            LiveWidget::AlertBox(_) => Some(ALERT_EVENT),
            LiveWidget::Chat(_) => Some(CHAT_EVENT),
            LiveWidget::Text(bound) | LiveWidget::Image(bound) => bound.event_name(),
            LiveWidget::CustomEvent(queue) => queue.event_name(),
        }
    }

    fn on_event(&mut self, event: &Incoming<'_>, now: Instant) -> bool {
        if self.event_name() != Some(event.name) {
            return false;
        }
        match self {
            LiveWidget::AlertBox(queue) => match &event.alert {
                Some(alert) => queue.on_alert(alert.clone(), now),
                None => false,
            },
            LiveWidget::Chat(window) => match &event.chat {
                Some(message) => {
                    window.push(message.clone(), now);
                    true
                }
                None => false,
            },
            LiveWidget::Text(bound) | LiveWidget::Image(bound) => {
                bound.on_event(event.payload, now);
                true
            }
            LiveWidget::CustomEvent(queue) => {
                queue.on_event(event.payload, now);
                true
            }
        }
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        match self {
            LiveWidget::AlertBox(queue) => queue.tick(now),
            LiveWidget::Chat(window) => window.tick(now),
            LiveWidget::Text(bound) | LiveWidget::Image(bound) => bound.tick(now),
            LiveWidget::CustomEvent(queue) => queue.tick(now),
        }
    }

    /// Next instant at which [`LiveWidget::tick`] has work to do. Chat fade
    /// runs on the periodic tick instead.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self {
            LiveWidget::AlertBox(queue) => queue.next_deadline(),
            LiveWidget::Chat(_) => None,
            LiveWidget::Text(bound) | LiveWidget::Image(bound) => bound.next_deadline(),
            LiveWidget::CustomEvent(queue) => queue.next_deadline(),
        }
    }

    fn content(&self, element: &SceneElement) -> LiveContent {
        match (self, &element.config) {
            (LiveWidget::AlertBox(queue), ElementConfig::AlertBox(config)) => {
                let alert = queue.current().cloned();
                LiveContent::Alert {
                    headline: alert.as_ref().map(|a| headline(a.kind).to_string()),
                    alert,
                    animation: config.animation.clone(),
                }
            }
            (LiveWidget::Chat(window), ElementConfig::Chat(config)) => LiveContent::Chat {
                messages: window.messages().cloned().collect(),
                show_badges: config.show_badges,
            },
            (LiveWidget::Text(bound), ElementConfig::Text(config)) => LiveContent::Text {
                text: bound.resolve(&config.content).to_string(),
                font_weight: config.font_weight.clone(),
                line_height: config.line_height,
            },
            (LiveWidget::Image(bound), ElementConfig::Image(config)) => LiveContent::Image {
                src: bound.resolve(&config.src).to_string(),
                object_fit: config.object_fit.clone(),
            },
            (LiveWidget::CustomEvent(queue), ElementConfig::CustomEvent(config)) => {
                LiveContent::CustomEvent {
                    current: queue.current().cloned(),
                    animation: config.animation.clone(),
                }
            }
            _ => LiveContent::Empty,
        }
    }
}

/// What an element shows right now
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum LiveContent {
    Alert {
        alert: Option<Alert>,
        headline: Option<String>,
        animation: String,
    },
    Chat {
        messages: Vec<ChatMessage>,
        show_badges: bool,
    },
    Text {
        text: String,
        font_weight: String,
        line_height: f64,
    },
    Image {
        src: String,
        object_fit: String,
    },
    CustomEvent {
        current: Option<QueuedText>,
        animation: String,
    },
    Empty,
}

/// One visible element of the live overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedElement {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub z_index: i64,
    pub style: ElementStyle,
    pub content: LiveContent,
}

/// Live state for the broadcast scene
#[derive(Debug, Default)]
pub struct LiveRouter {
    scene: Option<Scene>,
    widgets: HashMap<ElementId, LiveWidget>,
}

impl LiveRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_id(&self) -> Option<SceneId> {
        self.scene.as_ref().and_then(|s| s.id)
    }

    pub fn widget(&self, id: &str) -> Option<&LiveWidget> {
        self.widgets.get(id)
    }

    /// Show `scene`, keeping live state for elements that survive.
    pub fn load_scene(&mut self, scene: Scene) {
        let mut previous = std::mem::take(&mut self.widgets);
        for element in &scene.elements {
            let widget = match previous.remove(&element.id) {
                Some(mut widget) => {
                    if widget.reconfigure(element) {
                        widget
                    } else {
                        LiveWidget::for_element(element)
                    }
                }
                None => LiveWidget::for_element(element),
            };
            self.widgets.insert(element.id.clone(), widget);
        }
        self.scene = Some(scene);
    }

    pub fn clear(&mut self) {
        self.scene = None;
        self.widgets.clear();
    }

    /// Every event name some element currently listens for.
    pub fn event_names(&self) -> BTreeSet<String> {
        self.widgets
            .values()
            .filter_map(LiveWidget::event_name)
            .map(str::to_string)
            .collect()
    }

    /// Deliver an event. Returns whether anything visible changed.
    pub fn route(&mut self, name: &str, payload: &Value, now: Instant) -> bool {
        let listening = |event: &str| self.widgets.values().any(|w| w.event_name() == Some(event));

        let alert = (name == ALERT_EVENT && listening(ALERT_EVENT))
            .then(|| parse_payload::<Alert>(name, payload))
            .flatten();
        let chat = (name == CHAT_EVENT && listening(CHAT_EVENT))
            .then(|| parse_payload::<ChatMessage>(name, payload))
            .flatten();

        let incoming = Incoming {
            name,
            payload,
            alert,
            chat,
        };

        let mut changed = false;
        for widget in self.widgets.values_mut() {
            changed |= widget.on_event(&incoming, now);
        }
        changed
    }

    /// Advance every timer that is due. Returns whether anything changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for widget in self.widgets.values_mut() {
            changed |= widget.tick(now);
        }
        changed
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.widgets
            .values()
            .map(LiveWidget::next_deadline)
            .fold(None, earliest)
    }

    /// Whether a chat window needs the periodic fade tick.
    pub fn needs_periodic_tick(&self) -> bool {
        self.widgets
            .values()
            .any(|w| matches!(w, LiveWidget::Chat(window) if window.fades()))
    }

    /// Visible elements, back to front.
    pub fn render(&self) -> Vec<RenderedElement> {
        let Some(scene) = &self.scene else {
            return Vec::new();
        };

        let mut rendered: Vec<RenderedElement> = scene
            .elements
            .iter()
            .filter(|el| el.visible)
            .filter_map(|el| {
                let widget = self.widgets.get(&el.id)?;
                Some(RenderedElement {
                    id: el.id.clone(),
                    element_type: el.element_type(),
                    x: el.x,
                    y: el.y,
                    width: el.width,
                    height: el.height,
                    rotation: el.rotation,
                    z_index: el.z_index,
                    style: el.style.clone(),
                    content: widget.content(el),
                })
            })
            .collect();
        rendered.sort_by_key(|el| el.z_index);
        rendered
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(event: &str, payload: &Value) -> Option<T> {
    match serde_json::from_value(payload.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(event, error = %e, "dropping malformed payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_model::{defaults, DataBindingConfig, ElementPatch};
    use serde_json::json;
    use tokio::time::Duration;

    fn element(element_type: ElementType, id: &str, z: i64) -> SceneElement {
        defaults::new_element(element_type, id.to_string(), 0, z)
    }

    fn scene(elements: Vec<SceneElement>) -> Scene {
        Scene {
            id: Some(1),
            elements,
            ..Scene::new("Live")
        }
    }

    fn bound_text(id: &str, event: &str) -> SceneElement {
        let mut text = element(ElementType::Text, id, 1);
        let binding = DataBindingConfig {
            enabled: true,
            event_name: event.to_string(),
            field_path: "title".to_string(),
            timeout: Some(5),
            ..Default::default()
        };
        ElementPatch {
            config: Some(json!({ "dataBinding": serde_json::to_value(binding).unwrap() })),
            ..Default::default()
        }
        .apply_to(&mut text)
        .unwrap();
        text
    }

    #[test]
    fn test_event_names() {
        let mut router = LiveRouter::new();
        router.load_scene(scene(vec![
            element(ElementType::AlertBox, "a", 1),
            element(ElementType::Chat, "c", 2),
            element(ElementType::Image, "i", 3),
            bound_text("t", "song"),
        ]));

        let names: Vec<_> = router.event_names().into_iter().collect();
        assert_eq!(names, vec!["alert", "chat-message", "song"]);
    }

    #[test]
    fn test_malformed_alert_is_dropped() {
        let now = Instant::now();
        let mut router = LiveRouter::new();
        router.load_scene(scene(vec![element(ElementType::AlertBox, "a", 1)]));

        assert!(!router.route(ALERT_EVENT, &json!({"type": "hug"}), now));
        assert!(!router.route(ALERT_EVENT, &json!("oops"), now));
        assert!(router.route(
            ALERT_EVENT,
            &json!({"type": "follow", "username": "kit"}),
            now
        ));
    }

    #[test]
    fn test_render_orders_by_z_and_hides_invisible() {
        let mut hidden = element(ElementType::Text, "hidden", 5);
        hidden.visible = false;

        let mut router = LiveRouter::new();
        router.load_scene(scene(vec![
            element(ElementType::Text, "top", 9),
            hidden,
            element(ElementType::Image, "bottom", 1),
        ]));

        let ids: Vec<_> = router.render().into_iter().map(|el| el.id).collect();
        assert_eq!(ids, vec!["bottom", "top"]);
    }

    #[test]
    fn test_bound_text_renders_and_reverts() {
        let start = Instant::now();
        let mut router = LiveRouter::new();
        router.load_scene(scene(vec![bound_text("t", "song")]));

        router.route("song", &json!({"title": "Song A"}), start);
        match &router.render()[0].content {
            LiveContent::Text { text, .. } => assert_eq!(text, "Song A"),
            other => panic!("expected text, got {:?}", other),
        }

        assert_eq!(router.next_deadline(), Some(start + Duration::from_secs(5)));
        assert!(router.tick(start + Duration::from_secs(5)));
        match &router.render()[0].content {
            LiveContent::Text { text, .. } => assert_eq!(text, "Your Text Here"),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_reload_keeps_state_for_surviving_elements() {
        let now = Instant::now();
        let mut router = LiveRouter::new();
        router.load_scene(scene(vec![
            element(ElementType::AlertBox, "a", 1),
            element(ElementType::Chat, "c", 2),
        ]));
        router.route(ALERT_EVENT, &json!({"type": "raid", "username": "kit"}), now);
        router.route(CHAT_EVENT, &json!({"username": "v", "message": "hi"}), now);

        let mut moved = element(ElementType::AlertBox, "a", 1);
        moved.x = 0.0;
        router.load_scene(scene(vec![moved]));

        match &router.render()[0].content {
            LiveContent::Alert { alert, headline, .. } => {
                assert_eq!(alert.as_ref().unwrap().username, "kit");
                assert_eq!(headline.as_deref(), Some("INCOMING RAID!"));
            }
            other => panic!("expected alert, got {:?}", other),
        }
        assert!(router.widget("c").is_none());
    }

    #[test]
    fn test_type_change_resets_widget() {
        let now = Instant::now();
        let mut router = LiveRouter::new();
        router.load_scene(scene(vec![element(ElementType::AlertBox, "x", 1)]));
        router.route(ALERT_EVENT, &json!({"type": "raid", "username": "kit"}), now);

        router.load_scene(scene(vec![element(ElementType::Chat, "x", 1)]));
        assert_eq!(router.widget("x").unwrap().element_type(), ElementType::Chat);
    }

    #[test]
    fn test_periodic_tick_only_for_fading_chat() {
        let mut router = LiveRouter::new();
        router.load_scene(scene(vec![element(ElementType::Chat, "c", 1)]));
        assert!(!router.needs_periodic_tick());

        let mut fading = element(ElementType::Chat, "c", 1);
        ElementPatch {
            config: Some(json!({"fadeAfter": 30})),
            ..Default::default()
        }
        .apply_to(&mut fading)
        .unwrap();
        router.load_scene(scene(vec![fading]));
        assert!(router.needs_periodic_tick());
    }

    #[test]
    fn test_content_json_shape() {
        let now = Instant::now();
        let mut router = LiveRouter::new();
        router.load_scene(scene(vec![element(ElementType::CustomEvent, "e", 1)]));
        router.route("ignored", &json!({}), now);

        let json = serde_json::to_value(router.render()).unwrap();
        assert_eq!(json[0]["type"], "custom-event");
        assert_eq!(json[0]["content"]["kind"], "custom-event");
        assert_eq!(json[0]["zIndex"], 1);
    }
}
