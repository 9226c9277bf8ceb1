use crate::config::default_toast_duration_ms;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Notification and tray appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Base toast duration in milliseconds.
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,

    /// Use light tray glyphs for dark taskbars.
    #[serde(default)]
    pub dark_mode: bool,

    /// The first-run hint has been shown.
    #[serde(default)]
    pub has_seen_welcome: bool,
}

impl UiConfig {
    /// Toast duration as a `Duration`.
    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            toast_duration_ms: default_toast_duration_ms(),
            dark_mode: false,
            has_seen_welcome: false,
        }
    }
}
