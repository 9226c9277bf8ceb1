//! Desktop side effects requested by the orchestrator.

use crate::TrayCommand;

use snapburst_core::{BurstStatus, Notifier, OverlayMode};

use std::{path::Path, time::Duration};

use notify_rust::{Notification, Timeout};
use tao::event_loop::EventLoopProxy;
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

const APP_NAME: &str = "SnapBurst";

/// Toasts through the OS notification center; tray, overlay and hotkey
/// changes go to the main thread.
pub struct DesktopNotifier {
    ui: EventLoopProxy<TrayCommand>,
    runtime: Handle,
}

impl DesktopNotifier {
    /// Create a notifier posting UI work through `ui` and running blocking
    /// notification calls on `runtime`.
    pub fn new(ui: EventLoopProxy<TrayCommand>, runtime: Handle) -> Self {
        Self { ui, runtime }
    }

    fn post(&self, command: TrayCommand) {
        if let Err(e) = self.ui.send_event(command) {
            warn!(error = ?e, "UI thread gone, dropping tray command");
        }
    }
}

impl Notifier for DesktopNotifier {
    fn toast(&self, message: &str, duration: Duration) {
        debug!(text = message, "Toast");

        let body = message.to_string();
        let timeout = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        self.runtime.spawn_blocking(move || {
            let result = Notification::new()
                .appname(APP_NAME)
                .summary(APP_NAME)
                .body(&body)
                .timeout(Timeout::Milliseconds(timeout))
                .show();
            if let Err(e) = result {
                warn!(error = %e, "Failed to show notification");
            }
        });
    }

    fn show_overlay(&self, mode: OverlayMode) {
        self.post(TrayCommand::ShowOverlay(mode));
    }

    fn recording_changed(&self, recording: bool) {
        self.post(TrayCommand::SetRecording(recording));
    }

    fn burst_changed(&self, status: &BurstStatus) {
        self.post(TrayCommand::SetBurst(status.clone()));
    }

    fn open_folder(&self, path: &Path) {
        if let Err(e) = open::that(path) {
            error!(path = ?path, error = %e, "Failed to open folder");
        }
    }
}
