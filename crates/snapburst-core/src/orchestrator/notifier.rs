use crate::session::BurstStatus;

use std::{path::Path, time::Duration};

/// What a region selection will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayMode {
    /// Save the selection as an image.
    Image,
    /// Record the selection as video.
    Video {
        /// Whether to capture audio.
        include_audio: bool,
    },
}

/// User-facing side effects of the orchestrator.
///
/// Implementations must not block; they typically forward to the UI thread.
pub trait Notifier {
    /// Show a transient message.
    fn toast(&self, message: &str, duration: Duration);

    /// Show the region selection overlay. The result comes back through
    /// [`CaptureOrchestrator::region_selected`] or
    /// [`CaptureOrchestrator::selection_canceled`].
    ///
    /// [`CaptureOrchestrator::region_selected`]: crate::CaptureOrchestrator::region_selected
    /// [`CaptureOrchestrator::selection_canceled`]: crate::CaptureOrchestrator::selection_canceled
    fn show_overlay(&self, mode: OverlayMode);

    /// Recording switched on or off.
    fn recording_changed(&self, recording: bool);

    /// Burst status changed (new session, new file, undo).
    fn burst_changed(&self, status: &BurstStatus);

    /// Reveal a folder in the file manager.
    fn open_folder(&self, path: &Path);
}
