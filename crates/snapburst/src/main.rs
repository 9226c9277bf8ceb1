//! SnapBurst: tray-resident screenshot bursts and screen recording driven by
//! global hotkeys.

mod app;
mod app_command;
mod config;
mod error;
mod ffmpeg_engine;
mod hotkey_registrar;
mod logging;
mod notifier;
mod overlay;
mod screen_capture;
mod tray_action;
mod tray_command;
mod tray_icon_state;
mod tray_manager;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
    ffmpeg_engine::FfmpegEngine,
    hotkey_registrar::GlobalHotkeyRegistrar,
    notifier::DesktopNotifier,
    overlay::{OverlayOutcome, RegionOverlay},
    screen_capture::XcapCapture,
    tray_action::{TrayAction, TrayMenuIds},
    tray_command::TrayCommand,
    tray_icon_state::TrayIconState,
    tray_manager::TrayManager,
};

use crate::config::Config;

use snapburst_core::HotkeyDispatcher;

use std::sync::Mutex;

use global_hotkey::{GlobalHotKeyEvent, HotKeyState};
use tao::{
    event::{Event, StartCause},
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Application entry point.
fn main() {
    // Flushes the log file on drop; held by the event loop closure.
    let log_guard = logging::init();

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let ui_proxy = event_loop.create_proxy();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let mut tray_manager = match TrayManager::new(config.ui.dark_mode) {
        Ok(tm) => tm,
        Err(e) => {
            error!("Failed to create TrayManager: {:?}", e);
            std::process::exit(1);
        }
    };

    // Hotkey events arrive on whatever thread the OS uses; bounce them to the
    // main thread where the dispatcher lives.
    let hotkey_proxy = Mutex::new(event_loop.create_proxy());
    GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
        if event.state() != HotKeyState::Pressed {
            return;
        }
        match hotkey_proxy.lock() {
            Ok(proxy) => {
                if let Err(e) = proxy.send_event(TrayCommand::Hotkey(event.id())) {
                    warn!(error = ?e, "Event loop gone, dropping hotkey");
                }
            }
            Err(_) => warn!("Hotkey proxy lock poisoned"),
        }
    }));

    // Persists across event loop iterations - dropping it unregisters the hotkeys.
    let mut dispatcher: Option<HotkeyDispatcher<GlobalHotkeyRegistrar>> = None;
    let mut overlay: Option<RegionOverlay> = None;
    let mut command_tx: Option<mpsc::Sender<AppCommand>> = None;
    let mut startup_config = Some(config);

    event_loop.run(move |event, target, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => match cmd {
                TrayCommand::SetRecording(recording) => {
                    if let Err(e) = tray_manager.set_recording(recording) {
                        error!(error = ?e, "Failed to update tray icon");
                    }
                }
                TrayCommand::SetBurst(status) => {
                    if let Err(e) = tray_manager.set_burst(status) {
                        error!(error = ?e, "Failed to update tray icon");
                    }
                }
                TrayCommand::ShowOverlay(mode) => {
                    if overlay.is_some() {
                        debug!("Selection overlay already open");
                    } else {
                        match RegionOverlay::open(target, mode) {
                            Ok(o) => overlay = Some(o),
                            Err(e) => {
                                error!(error = ?e, "Failed to open selection overlay");
                                send_to_app(command_tx.as_ref(), AppCommand::SelectionCanceled);
                            }
                        }
                    }
                }
                TrayCommand::Hotkey(native_id) => {
                    if let Some(d) = dispatcher.as_ref() {
                        d.dispatch_native(native_id);
                    }
                }
                TrayCommand::RegisterHotkeys(bindings) => {
                    if let Some(d) = dispatcher.as_mut() {
                        let live = d.register(bindings);
                        info!(live, "Hotkeys re-registered");
                    }
                }
                TrayCommand::Shutdown => {
                    if let Some(mut d) = dispatcher.take() {
                        d.dispose();
                    }
                    overlay = None;
                    *control_flow = ControlFlow::ExitWithCode(0);
                }
            },
            Event::WindowEvent {
                window_id, event, ..
            } => {
                let Some(active) = overlay.as_mut() else {
                    return;
                };
                if active.window_id() != window_id {
                    return;
                }

                let command = match active.handle(&event) {
                    OverlayOutcome::Pending => return,
                    OverlayOutcome::Selected(rect) => {
                        debug!(mode = ?active.mode(), %rect, "Region selected");
                        AppCommand::RegionSelected(rect)
                    }
                    OverlayOutcome::Canceled => {
                        debug!(mode = ?active.mode(), "Selection canceled");
                        AppCommand::SelectionCanceled
                    }
                };

                // Close the overlay before the capture runs so it is not in the shot.
                overlay = None;
                send_to_app(command_tx.as_ref(), command);
            }
            Event::NewEvents(StartCause::Init) => {
                let Some(config) = startup_config.take() else {
                    return;
                };

                // Register hotkeys on the main thread - tao's event loop pumps
                // the Windows messages needed for WM_HOTKEY delivery.
                let registrar = match GlobalHotkeyRegistrar::new() {
                    Ok(r) => r,
                    Err(e) => {
                        error!("Failed to create hotkey manager: {:?}", e);
                        std::process::exit(1);
                    }
                };
                let (action_tx, action_rx) = mpsc::channel(32);
                let mut hotkeys = HotkeyDispatcher::new(registrar, action_tx);
                let live = hotkeys.register(config.hotkey_bindings());
                info!(live, "Hotkeys registered");
                dispatcher = Some(hotkeys);

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                let (app_tx, app_rx) = mpsc::channel(32);
                command_tx = Some(app_tx.clone());

                let ui = ui_proxy.clone();
                let menu_ids = tray_manager.menu_ids().clone();

                // Spawn tokio runtime on separate thread.
                // TrayManager, the overlay and the hotkey manager stay on the main thread.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async {
                        let app = App::new(config, ui, app_tx, app_rx, action_rx, menu_ids);
                        if let Err(e) = app.run().await {
                            error!(error = ?e, "App error");
                        }
                    });
                });
            }
            _ => {}
        }

        // Keep the log writer and hotkey registrations alive for the app's lifetime.
        let _ = (&log_guard, &dispatcher);
    });
}

fn send_to_app(command_tx: Option<&mpsc::Sender<AppCommand>>, command: AppCommand) {
    match command_tx {
        Some(tx) => {
            if let Err(e) = tx.try_send(command) {
                error!(error = %e, "Failed to deliver command to app loop");
            }
        }
        None => warn!("App loop not running, dropping command"),
    }
}
