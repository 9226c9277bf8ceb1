use snapburst_core::HotkeyAction;

use serde::{Deserialize, Serialize};

/// Chord text per action. An empty string disables the binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Select a rectangle and save it.
    pub rectangle: String,
    /// Capture the foreground window.
    pub window: String,
    /// Capture every display.
    pub fullscreen: String,
    /// Capture the previous rectangle again.
    pub copy_last: String,
    /// Select a rectangle and record it.
    pub video_region: String,
    /// Record the foreground window.
    pub video_window: String,
    /// Record every display.
    pub video_fullscreen: String,
    /// Stop the active recording.
    pub video_stop: String,
}

impl HotkeyConfig {
    /// Chord text bound to `action`.
    pub fn chord(&self, action: HotkeyAction) -> &str {
        match action {
            HotkeyAction::Rectangle => &self.rectangle,
            HotkeyAction::Window => &self.window,
            HotkeyAction::Fullscreen => &self.fullscreen,
            HotkeyAction::CopyLast => &self.copy_last,
            HotkeyAction::VideoRegion => &self.video_region,
            HotkeyAction::VideoWindow => &self.video_window,
            HotkeyAction::VideoFullscreen => &self.video_fullscreen,
            HotkeyAction::VideoStop => &self.video_stop,
        }
    }
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            rectangle: "Ctrl+Shift+1".to_string(),
            window: "Ctrl+Shift+2".to_string(),
            fullscreen: "Ctrl+Shift+3".to_string(),
            copy_last: "Ctrl+Shift+C".to_string(),
            video_region: "Ctrl+Shift+4".to_string(),
            video_window: "Ctrl+Shift+5".to_string(),
            video_fullscreen: "Ctrl+Shift+6".to_string(),
            video_stop: "Ctrl+Shift+0".to_string(),
        }
    }
}
