//! Glue between logical actions, the session manager, still capture and the
//! recording lifecycle.
//!
//! The orchestrator is owned by a single context (the app command loop).
//! Hotkey actions, tray actions, overlay results and recording events are all
//! posted there and applied one at a time.

use crate::{
    CoreResult, HotkeyAction, ScreenRect,
    orchestrator::{Notifier, OverlayMode, StillCapture},
    recording::{RecordingEngine, RecordingEvent, RecordingLifecycle},
    session::{Clock, SessionManager, SessionSettings, SystemClock},
};

use std::{path::Path, time::Duration};

use tracing::{debug, error, info, instrument, warn};

/// Extra time a "Saved" toast stays up so its undo/edit actions are reachable.
const SAVE_TOAST_EXTRA: Duration = Duration::from_millis(2000);

const IMAGE_EXTENSION: &str = ".png";
const VIDEO_EXTENSION: &str = ".mp4";

/// Behaviour switches taken from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Copy every saved image to the clipboard.
    pub copy_to_clipboard: bool,
    /// Audio default for hotkey-triggered recordings.
    pub include_audio: bool,
    /// Base toast duration.
    pub toast_duration: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            copy_to_clipboard: true,
            include_audio: false,
            toast_duration: Duration::from_millis(2500),
        }
    }
}

/// Routes actions to still capture or recording.
pub struct CaptureOrchestrator<S, N, E, C = SystemClock>
where
    S: StillCapture,
    N: Notifier,
    E: RecordingEngine,
    C: Clock,
{
    session: SessionManager<C>,
    recorder: RecordingLifecycle<E>,
    capture: S,
    notifier: N,
    settings: OrchestratorSettings,
    is_capturing: bool,
    pending_overlay: Option<OverlayMode>,
    last_rect: Option<ScreenRect>,
    /// Session generation the running recording was started in.
    recording_generation: Option<u64>,
}

impl<S, N, E, C> CaptureOrchestrator<S, N, E, C>
where
    S: StillCapture,
    N: Notifier,
    E: RecordingEngine,
    C: Clock,
{
    /// Assemble an orchestrator from its collaborators.
    pub fn new(
        session: SessionManager<C>,
        recorder: RecordingLifecycle<E>,
        capture: S,
        notifier: N,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            session,
            recorder,
            capture,
            notifier,
            settings,
            is_capturing: false,
            pending_overlay: None,
            last_rect: None,
            recording_generation: None,
        }
    }

    /// Handle a hotkey action.
    ///
    /// Dropped while a capture (or region selection) is in flight so a
    /// repeated key press cannot start a second one.
    #[instrument(skip(self))]
    pub fn handle_action(&mut self, action: HotkeyAction) {
        if self.is_capturing {
            debug!(%action, "Capture in progress, ignoring");
            return;
        }

        info!(%action, "Hotkey action");

        let include_audio = self.settings.include_audio;
        match action {
            HotkeyAction::Rectangle => self.begin_region_capture(),
            HotkeyAction::Window => self.capture_foreground_window(),
            HotkeyAction::Fullscreen => self.capture_fullscreen(),
            HotkeyAction::CopyLast => self.repeat_last_region(),
            HotkeyAction::VideoRegion => self.begin_video_region(include_audio),
            HotkeyAction::VideoWindow => {
                self.start_video_window(include_audio);
            }
            HotkeyAction::VideoFullscreen => {
                self.start_video_fullscreen(include_audio);
            }
            HotkeyAction::VideoStop => self.stop_video(),
        }
    }

    /// Open the overlay to select a rectangle for an image.
    pub fn begin_region_capture(&mut self) {
        self.is_capturing = true;
        self.pending_overlay = Some(OverlayMode::Image);
        self.notifier.show_overlay(OverlayMode::Image);
    }

    /// The overlay finished with a selection.
    #[instrument(skip(self))]
    pub fn region_selected(&mut self, rect: ScreenRect) {
        self.is_capturing = false;

        match self.pending_overlay.take() {
            Some(OverlayMode::Video { include_audio }) => {
                self.start_video_region(rect, include_audio);
            }
            Some(OverlayMode::Image) => {
                self.save_capture(rect);
            }
            None => debug!(%rect, "Selection arrived without a pending request"),
        }
    }

    /// The overlay was dismissed.
    pub fn selection_canceled(&mut self) {
        debug!(pending = ?self.pending_overlay, "Selection canceled");
        self.is_capturing = false;
        self.pending_overlay = None;
    }

    /// Capture the whole virtual screen.
    pub fn capture_fullscreen(&mut self) {
        self.is_capturing = true;
        match self.capture.virtual_screen() {
            Ok(rect) => {
                info!(%rect, "Fullscreen capture");
                self.save_capture(rect);
            }
            Err(e) => self.report("Capture failed", &e.user_message()),
        }
        self.is_capturing = false;
    }

    /// Capture the focused window.
    pub fn capture_foreground_window(&mut self) {
        self.is_capturing = true;
        match self.capture.foreground_window() {
            Ok(Some(window)) if !window.bounds.is_degenerate() => {
                info!(title = %window.title, rect = %window.bounds, "Window capture");
                self.save_capture(window.bounds);
            }
            Ok(Some(window)) => {
                warn!(rect = %window.bounds, "Window capture failed: invalid bounds");
            }
            Ok(None) => {
                warn!("Window capture failed: no foreground window");
                self.toast("No active window to capture");
            }
            Err(e) => self.report("Capture failed", &e.user_message()),
        }
        self.is_capturing = false;
    }

    /// Capture the last captured rectangle again.
    pub fn repeat_last_region(&mut self) {
        match self.last_rect {
            Some(rect) => {
                self.is_capturing = true;
                self.save_capture(rect);
                self.is_capturing = false;
            }
            None => self.toast("No previous region yet"),
        }
    }

    /// Grab `rect` into the next session path.
    ///
    /// Returns whether the image was written.
    #[instrument(skip(self))]
    pub fn save_capture(&mut self, rect: ScreenRect) -> bool {
        self.last_rect = Some(rect);

        let path = match self.write_capture(rect) {
            Ok(path) => path,
            Err(e) => {
                error!(error = %e, "Saving capture failed");
                self.report("Capture failed", &e.user_message());
                return false;
            }
        };

        self.session.register_saved(path.clone());

        if self.settings.copy_to_clipboard {
            if let Err(e) = self.capture.copy_file_to_clipboard(&path) {
                warn!(error = %e, "Copy to clipboard failed");
            }
        }

        info!(path = ?path, "Saved");
        self.notifier.burst_changed(&self.session.status());
        self.notifier.toast(
            &format!("Saved: {}", file_name(&path)),
            self.settings.toast_duration + SAVE_TOAST_EXTRA,
        );
        true
    }

    fn write_capture(&mut self, rect: ScreenRect) -> CoreResult<std::path::PathBuf> {
        let path = self.session.next_file_path(IMAGE_EXTENSION)?;
        self.capture.capture(&rect, &path)?;
        Ok(path)
    }

    /// Record the full screen.
    #[instrument(skip(self))]
    pub fn start_video_fullscreen(&mut self, include_audio: bool) -> bool {
        if self.reject_if_recording() {
            return false;
        }

        match self.session.next_file_path(VIDEO_EXTENSION) {
            Ok(path) => self.announce_start(&path, |recorder, path| {
                recorder.start_fullscreen(path, include_audio)
            }),
            Err(e) => {
                self.report("Recording failed to start", &e.user_message());
                false
            }
        }
    }

    /// Record the focused window.
    #[instrument(skip(self))]
    pub fn start_video_window(&mut self, include_audio: bool) -> bool {
        if self.reject_if_recording() {
            return false;
        }

        let window = match self.capture.foreground_window() {
            Ok(Some(window)) if window.id != 0 => window,
            Ok(_) => {
                self.toast("No active window to record");
                return false;
            }
            Err(e) => {
                self.report("Recording failed to start", &e.user_message());
                return false;
            }
        };

        match self.session.next_file_path(VIDEO_EXTENSION) {
            Ok(path) => self.announce_start(&path, |recorder, path| {
                recorder.start_window(window.id, path, include_audio)
            }),
            Err(e) => {
                self.report("Recording failed to start", &e.user_message());
                false
            }
        }
    }

    /// Open the overlay to select a rectangle for a recording.
    pub fn begin_video_region(&mut self, include_audio: bool) {
        if self.reject_if_recording() {
            return;
        }

        let mode = OverlayMode::Video { include_audio };
        self.is_capturing = true;
        self.pending_overlay = Some(mode);
        self.notifier.show_overlay(mode);
    }

    fn start_video_region(&mut self, rect: ScreenRect, include_audio: bool) -> bool {
        let screen = match self.capture.display_containing(&rect) {
            Ok(screen) => screen,
            Err(e) => {
                self.report("Recording failed to start", &e.user_message());
                return false;
            }
        };
        let relative = rect.relative_to(&screen.bounds);
        if relative.is_degenerate() {
            self.toast("Selection is too small to record");
            return false;
        }

        debug!(device = %screen.device_name, %rect, %relative, "Region recording");

        match self.session.next_file_path(VIDEO_EXTENSION) {
            Ok(path) => self.announce_start(&path, |recorder, path| {
                recorder.start_region(screen.device_name, relative, path, include_audio)
            }),
            Err(e) => {
                self.report("Recording failed to start", &e.user_message());
                false
            }
        }
    }

    /// Sources are validated before this point, so a refused start means
    /// the engine failed and the lifecycle already raised `Failed`; that
    /// event carries the only failure toast.
    fn announce_start<F>(&mut self, path: &Path, start: F) -> bool
    where
        F: FnOnce(&RecordingLifecycle<E>, std::path::PathBuf) -> bool,
    {
        let started = start(&self.recorder, path.to_path_buf());
        if started {
            self.recording_generation = Some(self.session.generation());
            self.toast(&format!("Recording started: {}", file_name(path)));
        } else {
            debug!(path = ?path, "Recording refused by the lifecycle");
        }
        started
    }

    fn reject_if_recording(&mut self) -> bool {
        if self.recorder.is_recording() {
            self.toast("Recording already in progress");
            return true;
        }
        false
    }

    /// Stop the active recording.
    pub fn stop_video(&mut self) {
        self.recorder.stop();
    }

    /// Toggle pause on the active recording.
    pub fn pause_or_resume_video(&mut self) {
        if !self.recorder.can_pause() {
            self.toast("This recorder cannot pause");
            return;
        }
        if self.recorder.is_paused() {
            self.recorder.resume();
        } else {
            self.recorder.pause();
        }
    }

    /// Apply a recording lifecycle notification.
    #[instrument(skip(self))]
    pub fn on_recording_event(&mut self, event: RecordingEvent) {
        match event {
            RecordingEvent::StateChanged(recording) => {
                self.notifier.recording_changed(recording);
            }
            RecordingEvent::Completed(path) => {
                let started_in = self.recording_generation.take();
                if path.as_os_str().is_empty() {
                    return;
                }
                match started_in {
                    Some(generation) if generation != self.session.generation() => {
                        info!(path = ?path, "Video finished after its burst changed, not added to history");
                    }
                    _ => {
                        self.session.register_saved(path.clone());
                        self.notifier.burst_changed(&self.session.status());
                    }
                }
                self.toast(&format!("Saved video: {}", file_name(&path)));
            }
            RecordingEvent::Failed(message) => {
                self.recording_generation = None;
                self.toast(&format!("Recording failed: {message}"));
            }
            RecordingEvent::StatusChanged(status) => {
                debug!(?status, "Recording status");
            }
        }
    }

    /// Start a new burst.
    pub fn start_burst(&mut self) {
        self.session.start_new_session();
        self.notifier.burst_changed(&self.session.status());
    }

    /// End the current burst.
    pub fn end_burst(&mut self) {
        self.session.end_session();
        self.notifier.burst_changed(&self.session.status());
    }

    /// Delete the last saved file. Returns whether it was removed.
    pub fn undo_last(&mut self) -> bool {
        let undone = self.session.undo_last();
        if undone {
            self.notifier.burst_changed(&self.session.status());
            self.toast("Removed last capture");
        } else {
            self.toast("Nothing to undo");
        }
        undone
    }

    /// Copy the last saved image to the clipboard.
    pub fn copy_last_to_clipboard(&mut self) -> bool {
        let Some(path) = self.session.last_file().map(Path::to_path_buf) else {
            return false;
        };
        if !path.exists() {
            return false;
        }

        match self.capture.copy_file_to_clipboard(&path) {
            Ok(()) => {
                info!(path = ?path, "Copied to clipboard");
                self.toast(&format!("Copied: {}", file_name(&path)));
                true
            }
            Err(e) => {
                error!(error = %e, "Copy last to clipboard failed");
                false
            }
        }
    }

    /// Reveal the folder holding the latest captures.
    pub fn open_last_folder(&self) {
        let folder = self.session.last_folder();
        if folder.is_dir() {
            self.notifier.open_folder(folder);
        } else {
            debug!(folder = ?folder, "Last folder does not exist yet");
        }
    }

    /// Apply reloaded configuration.
    pub fn apply_settings(&mut self, settings: OrchestratorSettings, session: SessionSettings) {
        self.settings = settings;
        self.session.apply_settings(session);
    }

    /// Stop any recording before exit.
    pub fn shutdown(&mut self) {
        if self.recorder.is_recording() {
            info!("Stopping recording for shutdown");
            self.recorder.stop();
        }
    }

    /// Whether a capture or selection is in flight.
    pub fn is_capturing(&self) -> bool {
        self.is_capturing
    }

    /// The session manager.
    pub fn session(&self) -> &SessionManager<C> {
        &self.session
    }

    /// The recording lifecycle.
    pub fn recorder(&self) -> &RecordingLifecycle<E> {
        &self.recorder
    }

    /// The notifier.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn toast(&self, message: &str) {
        self.notifier.toast(message, self.settings.toast_duration);
    }

    fn report(&self, prefix: &str, message: &str) {
        self.toast(&format!("{prefix}: {message}"));
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
