use snapburst_core::{RecordingEvent, ScreenRect};

/// Commands delivered to the app loop from other threads.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// The overlay finished with a rectangle in virtual-screen coordinates.
    RegionSelected(ScreenRect),
    /// The overlay was dismissed.
    SelectionCanceled,
    /// Notification from the recording lifecycle.
    Recording(RecordingEvent),
    /// Request application shutdown.
    Shutdown,
}
