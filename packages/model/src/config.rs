//! # Element Configuration
//!
//! Each element type carries its own configuration record. The type tag of
//! a [`SceneElement`](crate::SceneElement) is the variant of
//! [`ElementConfig`], so a config that does not match its element's type
//! cannot be represented.
//!
//! On the wire a config is a plain JSON object next to a `"type"` string;
//! [`ElementConfig::from_value`] validates the object against the tag.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ElementType, ModelError};

/// Alert durations of 0 fall back to this value.
pub const DEFAULT_ALERT_DURATION_MS: u64 = 5000;

/// Custom-event queues of size 0 fall back to this capacity.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 10;

pub const DEFAULT_MAX_CHAT_MESSAGES: usize = 20;

pub const DEFAULT_ANIMATION: &str = "fadeInUp";

pub const DEFAULT_CUSTOM_EVENT_TEMPLATE: &str = "{{message}}";

/// Kinds of stream alerts an alert box can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Follow,
    Subscribe,
    Donation,
    Raid,
}

impl AlertKind {
    pub const ALL: [AlertKind; 4] = [
        AlertKind::Follow,
        AlertKind::Subscribe,
        AlertKind::Donation,
        AlertKind::Raid,
    ];
}

/// Type-specific configuration, one variant per [`ElementType`].
#[derive(Debug, Clone, PartialEq)]
pub enum ElementConfig {
    AlertBox(AlertBoxConfig),
    Chat(ChatConfig),
    Text(TextConfig),
    Image(ImageConfig),
    CustomEvent(CustomEventConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertBoxConfig {
    pub alert_types: BTreeSet<AlertKind>,
    /// Display time per alert in milliseconds.
    pub duration: u64,
    pub animation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfig {
    pub max_messages: usize,
    pub show_badges: bool,
    /// Seconds a message stays visible; 0 keeps messages until pushed out.
    pub fade_after: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextConfig {
    pub content: String,
    pub font_weight: String,
    pub line_height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_binding: Option<DataBindingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageConfig {
    pub src: String,
    pub object_fit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_binding: Option<DataBindingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomEventConfig {
    pub event_name: String,
    pub template: String,
    /// Display time per item in milliseconds.
    pub duration: u64,
    pub animation: String,
    pub max_queue_size: usize,
}

/// Live connection from a text/image element to a field of an external event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataBindingConfig {
    pub enabled: bool,
    pub event_name: String,
    pub field_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Image elements only: field holding the image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_for_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Seconds until the bound value reverts to the default; 0 never reverts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl DataBindingConfig {
    /// A binding only takes effect when enabled and pointed at an event.
    pub fn is_live(&self) -> bool {
        self.enabled && !self.event_name.is_empty()
    }

    pub fn revert_after(&self) -> Option<Duration> {
        self.timeout
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Default for AlertBoxConfig {
    fn default() -> Self {
        Self {
            alert_types: AlertKind::ALL.into_iter().collect(),
            duration: DEFAULT_ALERT_DURATION_MS,
            animation: DEFAULT_ANIMATION.to_string(),
        }
    }
}

impl AlertBoxConfig {
    pub fn display_duration(&self) -> Duration {
        Duration::from_millis(non_zero_or(self.duration, DEFAULT_ALERT_DURATION_MS))
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_CHAT_MESSAGES,
            show_badges: true,
            fade_after: 0,
        }
    }
}

impl ChatConfig {
    pub fn window_size(&self) -> usize {
        if self.max_messages == 0 {
            DEFAULT_MAX_CHAT_MESSAGES
        } else {
            self.max_messages
        }
    }

    pub fn fade_duration(&self) -> Option<Duration> {
        (self.fade_after > 0).then(|| Duration::from_secs(self.fade_after))
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            content: "Your Text Here".to_string(),
            font_weight: "bold".to_string(),
            line_height: 1.5,
            data_binding: None,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            src: String::new(),
            object_fit: "contain".to_string(),
            data_binding: None,
        }
    }
}

impl Default for CustomEventConfig {
    fn default() -> Self {
        Self {
            event_name: String::new(),
            template: DEFAULT_CUSTOM_EVENT_TEMPLATE.to_string(),
            duration: DEFAULT_ALERT_DURATION_MS,
            animation: DEFAULT_ANIMATION.to_string(),
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
        }
    }
}

impl CustomEventConfig {
    pub fn display_duration(&self) -> Duration {
        Duration::from_millis(non_zero_or(self.duration, DEFAULT_ALERT_DURATION_MS))
    }

    pub fn queue_capacity(&self) -> usize {
        if self.max_queue_size == 0 {
            DEFAULT_MAX_QUEUE_SIZE
        } else {
            self.max_queue_size
        }
    }

    pub fn template_or_default(&self) -> &str {
        if self.template.is_empty() {
            DEFAULT_CUSTOM_EVENT_TEMPLATE
        } else {
            &self.template
        }
    }
}

fn non_zero_or(value: u64, fallback: u64) -> u64 {
    if value == 0 {
        fallback
    } else {
        value
    }
}

impl ElementConfig {
    /// Default configuration for a freshly created element.
    pub fn default_for(element_type: ElementType) -> Self {
        match element_type {
            ElementType::AlertBox => ElementConfig::AlertBox(AlertBoxConfig::default()),
            ElementType::Chat => ElementConfig::Chat(ChatConfig::default()),
            ElementType::Text => ElementConfig::Text(TextConfig::default()),
            ElementType::Image => ElementConfig::Image(ImageConfig::default()),
            ElementType::CustomEvent => ElementConfig::CustomEvent(CustomEventConfig::default()),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            ElementConfig::AlertBox(_) => ElementType::AlertBox,
            ElementConfig::Chat(_) => ElementType::Chat,
            ElementConfig::Text(_) => ElementType::Text,
            ElementConfig::Image(_) => ElementType::Image,
            ElementConfig::CustomEvent(_) => ElementType::CustomEvent,
        }
    }

    /// Parse a wire config object for the given type tag.
    ///
    /// `null` yields the type's default config; missing fields take their
    /// defaults; a field of the wrong shape is an error.
    pub fn from_value(element_type: ElementType, value: Value) -> Result<Self, ModelError> {
        if value.is_null() {
            return Ok(Self::default_for(element_type));
        }

        let invalid = |source| ModelError::InvalidConfig {
            element_type,
            source,
        };

        let config = match element_type {
            ElementType::AlertBox => {
                ElementConfig::AlertBox(serde_json::from_value(value).map_err(invalid)?)
            }
            ElementType::Chat => ElementConfig::Chat(serde_json::from_value(value).map_err(invalid)?),
            ElementType::Text => ElementConfig::Text(serde_json::from_value(value).map_err(invalid)?),
            ElementType::Image => {
                ElementConfig::Image(serde_json::from_value(value).map_err(invalid)?)
            }
            ElementType::CustomEvent => {
                ElementConfig::CustomEvent(serde_json::from_value(value).map_err(invalid)?)
            }
        };

        Ok(config)
    }

    /// Wire form of the config (without the type tag).
    pub fn to_value(&self) -> Value {
        let value = match self {
            ElementConfig::AlertBox(c) => serde_json::to_value(c),
            ElementConfig::Chat(c) => serde_json::to_value(c),
            ElementConfig::Text(c) => serde_json::to_value(c),
            ElementConfig::Image(c) => serde_json::to_value(c),
            ElementConfig::CustomEvent(c) => serde_json::to_value(c),
        };
        value.unwrap_or_default()
    }

    /// Shallow-merge a JSON object into this config, re-validating the result.
    ///
    /// On error the config is left untouched.
    pub fn merge_patch(&mut self, patch: &Value) -> Result<(), ModelError> {
        let Value::Object(fields) = patch else {
            return Err(ModelError::ConfigPatchNotObject);
        };

        let mut merged = self.to_value();
        if let Value::Object(map) = &mut merged {
            for (key, value) in fields {
                map.insert(key.clone(), value.clone());
            }
        }

        *self = Self::from_value(self.element_type(), merged)?;
        Ok(())
    }

    /// Data binding of a text or image element, if any.
    pub fn data_binding(&self) -> Option<&DataBindingConfig> {
        match self {
            ElementConfig::Text(c) => c.data_binding.as_ref(),
            ElementConfig::Image(c) => c.data_binding.as_ref(),
            ElementConfig::AlertBox(_) | ElementConfig::Chat(_) | ElementConfig::CustomEvent(_) => {
                None
            }
        }
    }
}
