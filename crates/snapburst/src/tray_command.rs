use snapburst_core::{BurstStatus, HotkeyAction, OverlayMode};

/// Commands delivered to the main UI thread.
///
/// The main thread owns `TrayManager` (because `TrayIcon` is `!Send`), the
/// hotkey manager and the selection overlay, so all of their mutations flow
/// through this enum.
#[derive(Debug, Clone)]
pub enum TrayCommand {
    /// Recording switched on or off.
    SetRecording(bool),
    /// Burst status changed.
    SetBurst(BurstStatus),
    /// Open the region selection overlay.
    ShowOverlay(OverlayMode),
    /// A global hotkey fired; carries the native hotkey id.
    Hotkey(u32),
    /// Replace the registered hotkeys.
    RegisterHotkeys(Vec<(HotkeyAction, String)>),
    /// Shut down the application. The main thread will exit the event loop.
    Shutdown,
}
