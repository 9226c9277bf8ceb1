//! System tray icon with state-based updates.
//!
//! Shows idle, burst and recording states, keeps the tooltip in sync with the
//! burst status and offers the burst and recording controls in its menu.

use crate::{AppError, AppResult, TrayAction, TrayIconState, TrayMenuIds};

use snapburst_core::BurstStatus;

use std::panic::Location;

use error_location::ErrorLocation;
use image::{Rgba, RgbaImage};
use tracing::{info, instrument};
use tray_icon::menu::{Menu, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

const ICON_SIZE: u32 = 32;

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    toggle_video_item: MenuItem,
    pause_item: MenuItem,
    end_burst_item: MenuItem,
    menu_ids: TrayMenuIds,
    dark_mode: bool,
    recording: bool,
    burst: Option<BurstStatus>,
}

impl TrayManager {
    /// Create the tray icon in the idle state.
    #[track_caller]
    #[instrument]
    pub fn new(dark_mode: bool) -> AppResult<Self> {
        let menu = Menu::new();

        let new_burst = MenuItem::new("New burst", true, None);
        let end_burst = MenuItem::new("End burst", false, None);
        let copy_last = MenuItem::new("Copy last to clipboard", true, None);
        let open_folder = MenuItem::new("Open last folder", true, None);
        let undo = MenuItem::new("Undo last capture", true, None);
        let toggle_video = MenuItem::new("Record full screen", true, None);
        let pause = MenuItem::new("Pause recording", false, None);
        let open_settings = MenuItem::new("Open settings file", true, None);
        let reload_settings = MenuItem::new("Reload settings", true, None);
        let exit = MenuItem::new("Exit", true, None);

        let entries = vec![
            (new_burst.id().clone(), TrayAction::NewBurst),
            (end_burst.id().clone(), TrayAction::EndBurst),
            (copy_last.id().clone(), TrayAction::CopyLast),
            (open_folder.id().clone(), TrayAction::OpenLastFolder),
            (undo.id().clone(), TrayAction::UndoLast),
            (toggle_video.id().clone(), TrayAction::ToggleVideo),
            (pause.id().clone(), TrayAction::PauseResume),
            (open_settings.id().clone(), TrayAction::OpenSettings),
            (reload_settings.id().clone(), TrayAction::ReloadSettings),
            (exit.id().clone(), TrayAction::Exit),
        ];

        let separator = PredefinedMenuItem::separator();
        menu.append_items(&[
            &new_burst,
            &end_burst,
            &separator,
            &copy_last,
            &open_folder,
            &undo,
            &PredefinedMenuItem::separator(),
            &toggle_video,
            &pause,
            &PredefinedMenuItem::separator(),
            &open_settings,
            &reload_settings,
            &exit,
        ])
        .map_err(|e| AppError::TrayError {
            reason: format!("Failed to build tray menu: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let icon = render_icon(TrayIconState::Idle, dark_mode)?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip("SnapBurst - Ready")
            .with_menu(Box::new(menu))
            .with_icon(icon)
            .build()
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            toggle_video_item: toggle_video,
            pause_item: pause,
            end_burst_item: end_burst,
            menu_ids: TrayMenuIds { entries },
            dark_mode,
            recording: false,
            burst: None,
        })
    }

    /// Recording switched on or off.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn set_recording(&mut self, recording: bool) -> AppResult<()> {
        self.recording = recording;
        self.toggle_video_item.set_text(if recording {
            "Stop recording"
        } else {
            "Record full screen"
        });
        self.pause_item.set_enabled(recording);
        self.refresh()
    }

    /// Burst status changed.
    #[track_caller]
    pub fn set_burst(&mut self, status: BurstStatus) -> AppResult<()> {
        self.end_burst_item.set_enabled(status.is_active);
        self.burst = Some(status);
        self.refresh()
    }

    /// Menu ids for the app loop.
    pub fn menu_ids(&self) -> &TrayMenuIds {
        &self.menu_ids
    }

    #[track_caller]
    fn refresh(&mut self) -> AppResult<()> {
        let state = icon_state(self.recording, self.burst.as_ref());
        let icon = render_icon(state, self.dark_mode)?;
        let tooltip = tooltip(self.recording, self.burst.as_ref());

        self.tray_icon
            .set_icon(Some(icon))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.tray_icon
            .set_tooltip(Some(tooltip))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(())
    }
}

/// Icon state for the current recording and burst status.
pub fn icon_state(recording: bool, burst: Option<&BurstStatus>) -> TrayIconState {
    if recording {
        TrayIconState::Recording
    } else if burst.is_some_and(|b| b.is_active) {
        TrayIconState::Burst
    } else {
        TrayIconState::Idle
    }
}

/// Tooltip text for the current recording and burst status.
pub fn tooltip(recording: bool, burst: Option<&BurstStatus>) -> String {
    if recording {
        return "SnapBurst - Recording...".to_string();
    }
    match burst {
        Some(status) if status.is_active => {
            let shots = if status.count == 1 { "shot" } else { "shots" };
            format!(
                "SnapBurst - Burst since {}: {} {}",
                status.started_at.format("%H:%M:%S"),
                status.count,
                shots
            )
        }
        _ => "SnapBurst - Ready".to_string(),
    }
}

/// Draw the tray glyph: a filled disc whose colour encodes the state.
#[track_caller]
fn render_icon(state: TrayIconState, dark_mode: bool) -> AppResult<Icon> {
    let fill = match (state, dark_mode) {
        (TrayIconState::Idle, false) => Rgba([64, 64, 64, 255]),
        (TrayIconState::Idle, true) => Rgba([230, 230, 230, 255]),
        (TrayIconState::Burst, _) => Rgba([30, 136, 229, 255]),
        (TrayIconState::Recording, _) => Rgba([229, 57, 53, 255]),
    };

    let center = (ICON_SIZE as f32 - 1.0) / 2.0;
    let radius = ICON_SIZE as f32 / 2.0 - 2.0;
    let rgba = RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        let dist = (dx * dx + dy * dy).sqrt();
        // One pixel of anti-aliasing on the rim.
        let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
        let mut px = fill;
        px[3] = (f32::from(fill[3]) * coverage) as u8;
        px
    });

    Icon::from_rgba(rgba.into_raw(), ICON_SIZE, ICON_SIZE).map_err(|e| AppError::TrayError {
        reason: format!("Failed to create icon from RGBA: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })
}
