use std::time::Duration;

use overlay_editor::DEFAULT_HISTORY_DEPTH;
use serde::{Deserialize, Serialize};

use crate::autosave::RetryPolicy;

pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 800;
pub const DEFAULT_CHAT_TICK_MS: u64 = 1000;

/// Tunables shared by the editor session and the live session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Quiet period before an edit is written to storage
    pub autosave_debounce_ms: u64,
    pub history_depth: usize,
    /// Interval of the chat fade tick
    pub chat_tick_ms: u64,
    pub retry: RetryPolicy,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            autosave_debounce_ms: DEFAULT_AUTOSAVE_DEBOUNCE_MS,
            history_depth: DEFAULT_HISTORY_DEPTH,
            chat_tick_ms: DEFAULT_CHAT_TICK_MS,
            retry: RetryPolicy::default(),
        }
    }
}

impl WorkspaceConfig {
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn chat_tick(&self) -> Duration {
        Duration::from_millis(self.chat_tick_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: WorkspaceConfig =
            serde_json::from_str(r#"{"autosave_debounce_ms": 250}"#).unwrap();

        assert_eq!(config.autosave_debounce(), Duration::from_millis(250));
        assert_eq!(config.history_depth, 50);
        assert_eq!(config.chat_tick(), Duration::from_secs(1));
        assert_eq!(config.retry, RetryPolicy::default());
    }
}
