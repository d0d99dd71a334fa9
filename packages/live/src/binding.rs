//! # Data Binding
//!
//! Connects a text or image element to a field of an external event.
//!
//! Each matching event overwrites the bound value; there is no queue. When
//! the binding has a timeout, the value reverts to the binding's default
//! that many seconds after the *last* event.

use overlay_common::{
    coerce_payload, display_value, get_nested_value, resolve_template, TimerSlot,
};
use overlay_model::DataBindingConfig;
use serde_json::Value;
use tokio::time::Instant;

/// How an event payload is turned into the bound value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    /// Template if set, else the field at `fieldPath`
    Text,
    /// Field at `fieldForSrc`, else `fieldPath`
    Image,
}

/// Live value of one data-bound element.
#[derive(Debug)]
pub struct BoundValue {
    mode: BindingMode,
    /// `None` when the binding is absent or not live.
    config: Option<DataBindingConfig>,
    value: Option<String>,
    revert: TimerSlot,
}

impl BoundValue {
    pub fn new(config: Option<&DataBindingConfig>, mode: BindingMode) -> Self {
        let config = config.filter(|c| c.is_live()).cloned();
        let value = config.as_ref().and_then(|c| c.default_value.clone());
        Self {
            mode,
            config,
            value,
            revert: TimerSlot::new(),
        }
    }

    /// Swap in a new binding. Any change to the binding resets the value.
    pub fn reconfigure(&mut self, config: Option<&DataBindingConfig>) {
        let live = config.filter(|c| c.is_live());
        if live != self.config.as_ref() {
            *self = Self::new(live, self.mode);
        }
    }

    pub fn event_name(&self) -> Option<&str> {
        self.config.as_ref().map(|c| c.event_name.as_str())
    }

    /// Take the value from a matching event and (re)arm the revert timer.
    pub fn on_event(&mut self, payload: &Value, now: Instant) {
        let Some(config) = &self.config else {
            return;
        };

        let data = coerce_payload(payload.clone());
        let value = match self.mode {
            BindingMode::Image => {
                let field = config
                    .field_for_src
                    .as_deref()
                    .filter(|f| !f.is_empty())
                    .unwrap_or(config.field_path.as_str());
                extract(&data, field)
            }
            BindingMode::Text => match config.template.as_deref() {
                Some(template) if !template.is_empty() => resolve_template(template, &data),
                _ => extract(&data, &config.field_path),
            },
        };

        match config.revert_after() {
            Some(after) => {
                self.revert.arm(now, after);
            }
            None => {
                self.revert.cancel();
            }
        }
        self.value = Some(value);
    }

    /// Revert to the default if the timeout has passed. Returns whether the
    /// value changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.revert.fire_due(now) {
            return false;
        }
        let default = self.config.as_ref().and_then(|c| c.default_value.clone());
        let changed = self.value != default;
        self.value = default;
        changed
    }

    /// Current bound value, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// What the element should display: the bound value, else `fallback`.
    pub fn resolve<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.value().unwrap_or(fallback)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.revert.deadline()
    }
}

fn extract(data: &Value, path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    get_nested_value(data, path)
        .and_then(display_value)
        .unwrap_or_default()
}
