use overlay_common::{coerce_payload, resolve_template};
use overlay_model::CustomEventConfig;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;

use crate::DisplayQueue;

/// One rendered custom-event message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedText {
    pub id: String,
    pub text: String,
}

/// Live state of one custom-event widget.
#[derive(Debug)]
pub struct CustomEventQueue {
    event_name: String,
    template: String,
    queue: DisplayQueue<QueuedText>,
    counter: u64,
}

impl CustomEventQueue {
    pub fn new(config: &CustomEventConfig) -> Self {
        Self {
            event_name: config.event_name.clone(),
            template: config.template_or_default().to_string(),
            queue: DisplayQueue::new(config.display_duration(), Some(config.queue_capacity())),
            counter: 0,
        }
    }

    pub fn reconfigure(&mut self, config: &CustomEventConfig) {
        self.event_name = config.event_name.clone();
        self.template = config.template_or_default().to_string();
        self.queue
            .reconfigure(config.display_duration(), Some(config.queue_capacity()));
    }

    /// The event this widget listens for, if configured.
    pub fn event_name(&self) -> Option<&str> {
        (!self.event_name.is_empty()).then_some(self.event_name.as_str())
    }

    /// Render `payload` through the template and queue it.
    pub fn on_event(&mut self, payload: &Value, now: Instant) {
        let data = coerce_payload(payload.clone());
        self.counter += 1;
        let item = QueuedText {
            id: format!("ce-{}", self.counter),
            text: resolve_template(&self.template, &data),
        };
        self.queue.push(item, now);
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.queue.tick(now)
    }

    pub fn current(&self) -> Option<&QueuedText> {
        self.queue.current()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.pending_len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::time::Duration;

    fn config(template: &str, max_queue_size: usize) -> CustomEventConfig {
        CustomEventConfig {
            event_name: "hype".to_string(),
            template: template.to_string(),
            max_queue_size,
            ..Default::default()
        }
    }

    #[test]
    fn test_renders_template() {
        let now = Instant::now();
        let mut queue = CustomEventQueue::new(&config("{{user}} hit level {{level}}", 10));
        queue.on_event(&json!({"user": "kit", "level": 3}), now);

        let current = queue.current().unwrap();
        assert_eq!(current.text, "kit hit level 3");
        assert_eq!(current.id, "ce-1");
    }

    #[test]
    fn test_scalar_payload_uses_value() {
        let now = Instant::now();
        let mut queue = CustomEventQueue::new(&config("got {{value}}", 10));
        queue.on_event(&json!(42), now);
        assert_eq!(queue.current().unwrap().text, "got 42");
    }

    #[test]
    fn test_default_template() {
        let now = Instant::now();
        let mut queue = CustomEventQueue::new(&config("", 10));
        queue.on_event(&json!({"message": "hello"}), now);
        assert_eq!(queue.current().unwrap().text, "hello");
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let now = Instant::now();
        let mut queue = CustomEventQueue::new(&config("{{n}}", 2));
        for n in 0..6 {
            queue.on_event(&json!({"n": n}), now);
        }

        assert_eq!(queue.current().unwrap().text, "0");
        assert_eq!(queue.pending_len(), 2);

        queue.tick(now + Duration::from_millis(5000));
        assert_eq!(queue.current().unwrap().text, "4");
    }

    #[test]
    fn test_unconfigured_event_name() {
        let queue = CustomEventQueue::new(&CustomEventConfig::default());
        assert_eq!(queue.event_name(), None);
    }
}
