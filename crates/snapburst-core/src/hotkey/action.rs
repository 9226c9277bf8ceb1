use std::fmt;

/// Logical action bound to a global hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HotkeyAction {
    /// Select a rectangle on screen and save it as an image.
    Rectangle,
    /// Capture the foreground window.
    Window,
    /// Capture the whole virtual screen.
    Fullscreen,
    /// Repeat the last captured rectangle.
    CopyLast,
    /// Select a rectangle and record it as video.
    VideoRegion,
    /// Record the foreground window.
    VideoWindow,
    /// Record the full screen.
    VideoFullscreen,
    /// Stop the active recording.
    VideoStop,
}

impl HotkeyAction {
    /// Every action, in registration order.
    pub const ALL: [HotkeyAction; 8] = [
        HotkeyAction::Rectangle,
        HotkeyAction::Window,
        HotkeyAction::Fullscreen,
        HotkeyAction::CopyLast,
        HotkeyAction::VideoRegion,
        HotkeyAction::VideoWindow,
        HotkeyAction::VideoFullscreen,
        HotkeyAction::VideoStop,
    ];

    /// Whether the action starts or stops a video recording.
    pub fn is_video(self) -> bool {
        matches!(
            self,
            HotkeyAction::VideoRegion
                | HotkeyAction::VideoWindow
                | HotkeyAction::VideoFullscreen
                | HotkeyAction::VideoStop
        )
    }
}

impl fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HotkeyAction::Rectangle => "Rectangle",
            HotkeyAction::Window => "Window",
            HotkeyAction::Fullscreen => "Fullscreen",
            HotkeyAction::CopyLast => "CopyLast",
            HotkeyAction::VideoRegion => "VideoRegion",
            HotkeyAction::VideoWindow => "VideoWindow",
            HotkeyAction::VideoFullscreen => "VideoFullscreen",
            HotkeyAction::VideoStop => "VideoStop",
        };
        f.write_str(name)
    }
}
