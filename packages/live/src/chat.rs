use std::collections::{BTreeMap, VecDeque};

use overlay_model::ChatConfig;
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

/// A chat line as delivered on the `chat-message` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default)]
    pub id: String,
    pub username: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub badges: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
}

/// Sliding window of the most recent chat messages.
///
/// With a fade configured, messages older than the fade age (measured from
/// when they arrived here) are dropped by [`ChatWindow::tick`].
#[derive(Debug)]
pub struct ChatWindow {
    max_messages: usize,
    fade_after: Option<Duration>,
    messages: VecDeque<(ChatMessage, Instant)>,
}

impl ChatWindow {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            max_messages: config.window_size(),
            fade_after: config.fade_duration(),
            messages: VecDeque::new(),
        }
    }

    pub fn reconfigure(&mut self, config: &ChatConfig) {
        self.max_messages = config.window_size();
        self.fade_after = config.fade_duration();
        self.trim();
    }

    pub fn push(&mut self, message: ChatMessage, now: Instant) {
        self.messages.push_back((message, now));
        self.trim();
    }

    /// Drop faded messages. Returns whether any were dropped.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(fade_after) = self.fade_after else {
            return false;
        };
        let before = self.messages.len();
        self.messages
            .retain(|(_, arrived)| now.saturating_duration_since(*arrived) < fade_after);
        self.messages.len() != before
    }

    /// Whether this window needs the periodic fade tick.
    pub fn fades(&self) -> bool {
        self.fade_after.is_some()
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().map(|(message, _)| message)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn trim(&mut self) {
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }
    }
}
