use crate::{
    AppCommand, AppResult, DesktopNotifier, FfmpegEngine, TrayAction, TrayCommand, TrayMenuIds,
    XcapCapture, config::Config,
};

use snapburst_core::{
    CaptureOrchestrator, HotkeyAction, Notifier, RecordingLifecycle, SessionManager,
};

use std::time::Duration;

use tao::event_loop::EventLoopProxy;
use tokio::{runtime::Handle, sync::mpsc};
use tracing::{debug, error, info, instrument, warn};
use tray_icon::menu::MenuEvent;

type Orchestrator = CaptureOrchestrator<XcapCapture, DesktopNotifier, FfmpegEngine>;

/// Extra wait on top of the stop grace before giving up on a recording at exit.
const SHUTDOWN_SLACK: Duration = Duration::from_millis(500);

/// Main application state.
///
/// Runs on the async runtime thread and owns the orchestrator. Tray, overlay
/// and hotkey changes go back to the main thread through `ui` because the
/// tray icon, the overlay window and the hotkey manager must stay there.
pub struct App {
    pub(crate) orchestrator: Orchestrator,
    pub(crate) ui: EventLoopProxy<TrayCommand>,
    pub(crate) config: Config,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) action_rx: mpsc::Receiver<HotkeyAction>,
    pub(crate) menu_ids: TrayMenuIds,
}

impl App {
    /// Wire the orchestrator and its collaborators. Must run inside the
    /// tokio runtime.
    pub(crate) fn new(
        config: Config,
        ui: EventLoopProxy<TrayCommand>,
        command_tx: mpsc::Sender<AppCommand>,
        command_rx: mpsc::Receiver<AppCommand>,
        action_rx: mpsc::Receiver<HotkeyAction>,
        menu_ids: TrayMenuIds,
    ) -> Self {
        let runtime = Handle::current();

        let recorder = RecordingLifecycle::new(
            FfmpegEngine::new(config.video.ffmpeg_path.clone()),
            runtime.clone(),
            config.lifecycle_options(),
        );

        let events_tx = command_tx.clone();
        recorder.subscribe(move |event| {
            if let Err(e) = events_tx.try_send(AppCommand::Recording(event.clone())) {
                warn!(error = %e, "Dropping recording event");
            }
        });

        let orchestrator = CaptureOrchestrator::new(
            SessionManager::new(config.session_settings()),
            recorder,
            XcapCapture,
            DesktopNotifier::new(ui.clone(), runtime),
            config.orchestrator_settings(),
        );

        Self {
            orchestrator,
            ui,
            config,
            command_tx,
            command_rx,
            action_rx,
            menu_ids,
        }
    }

    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("SnapBurst starting");

        self.welcome();

        // MenuEvent::receiver() is a blocking crossbeam receiver; one blocking
        // task forwards it. Dropping tray_event_rx ends the task on the next
        // menu event.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    if let Err(e) = self.handle_tray_event(event).await {
                        error!(error = ?e, "Failed to handle tray event");
                    }
                }

                Some(action) = self.action_rx.recv() => {
                    self.orchestrator.handle_action(action);
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AppCommand::RegionSelected(rect) => self.orchestrator.region_selected(rect),
                        AppCommand::SelectionCanceled => self.orchestrator.selection_canceled(),
                        AppCommand::Recording(event) => self.orchestrator.on_recording_event(event),
                        AppCommand::Shutdown => {
                            info!("Shutdown requested");
                            break;
                        }
                    }
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        self.finish_recording().await;

        drop(tray_event_rx);

        match tokio::time::timeout(Duration::from_secs(1), tray_handle).await {
            Ok(Ok(())) => info!("Tray event forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Tray event forwarder task panicked"),
            Err(_) => info!(
                "Tray event forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        let _ = self.ui.send_event(TrayCommand::Shutdown);
        info!("SnapBurst shut down successfully");

        Ok(())
    }

    /// Stop a running recording and give it the grace period to finalize.
    async fn finish_recording(&mut self) {
        if !self.orchestrator.recorder().is_recording() {
            return;
        }

        self.orchestrator.shutdown();

        let deadline = self.config.video.stop_grace() + SHUTDOWN_SLACK;
        let recorder = self.orchestrator.recorder().clone();
        let finished = tokio::time::timeout(deadline, async {
            while recorder.is_recording() {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await;

        if finished.is_err() {
            warn!("Recording did not finish before exit");
        }
    }

    fn welcome(&mut self) {
        if self.config.ui.has_seen_welcome {
            return;
        }

        let hotkeys = &self.config.hotkeys;
        let text = format!(
            "SnapBurst is running in the tray. {} selects a region, {} captures the screen.",
            hotkeys.chord(HotkeyAction::Rectangle),
            hotkeys.chord(HotkeyAction::Fullscreen),
        );
        self.orchestrator
            .notifier()
            .toast(&text, self.config.ui.toast_duration());

        self.config.ui.has_seen_welcome = true;
        if let Err(e) = self.config.save() {
            warn!(error = ?e, "Failed to persist welcome flag");
        }
    }

    /// Re-read the configuration file and apply it.
    ///
    /// Stop grace and ffmpeg path are read once at startup; everything else
    /// takes effect immediately.
    #[instrument(skip(self))]
    fn reload_settings(&mut self) -> AppResult<()> {
        let config = Config::load()?;

        self.orchestrator
            .apply_settings(config.orchestrator_settings(), config.session_settings());

        if let Err(e) = self
            .ui
            .send_event(TrayCommand::RegisterHotkeys(config.hotkey_bindings()))
        {
            warn!(error = ?e, "UI thread gone, hotkeys not re-registered");
        }

        self.config = config;
        info!("Settings reloaded");
        Ok(())
    }

    /// Handle tray menu events.
    #[instrument(skip(self))]
    async fn handle_tray_event(&mut self, event: MenuEvent) -> AppResult<()> {
        let Some(action) = self.menu_ids.action(&event.id) else {
            debug!(id = ?event.id, "Unknown menu item");
            return Ok(());
        };

        debug!(?action, "Tray action");

        match action {
            TrayAction::NewBurst => self.orchestrator.start_burst(),
            TrayAction::EndBurst => self.orchestrator.end_burst(),
            TrayAction::CopyLast => {
                self.orchestrator.copy_last_to_clipboard();
            }
            TrayAction::OpenLastFolder => self.orchestrator.open_last_folder(),
            TrayAction::UndoLast => {
                self.orchestrator.undo_last();
            }
            TrayAction::ToggleVideo => {
                if self.orchestrator.recorder().is_recording() {
                    self.orchestrator.stop_video();
                } else {
                    self.orchestrator
                        .start_video_fullscreen(self.config.video.include_audio);
                }
            }
            TrayAction::PauseResume => self.orchestrator.pause_or_resume_video(),
            TrayAction::OpenSettings => {
                let path = Config::config_path()?;
                if let Err(e) = open::that(&path) {
                    error!(path = ?path, error = %e, "Failed to open settings file");
                } else {
                    info!("Opened settings file");
                }
            }
            TrayAction::ReloadSettings => self.reload_settings()?,
            TrayAction::Exit => {
                info!("Exit requested from tray menu");
                if let Err(e) = self.command_tx.send(AppCommand::Shutdown).await {
                    error!(error = ?e, "Failed to send shutdown command");
                }
            }
        }

        Ok(())
    }
}
