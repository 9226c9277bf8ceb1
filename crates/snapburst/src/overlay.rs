//! Full-desktop selection window.
//!
//! A borderless, transparent, always-on-top window spanning every monitor.
//! Press-drag-release with the left button selects a rectangle; Escape,
//! the right button or closing the window cancels.

use crate::{AppError, AppResult, TrayCommand, screen_capture::union_bounds};

use snapburst_core::{OverlayMode, ScreenRect};

use std::panic::Location;

use error_location::ErrorLocation;
use tao::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::EventLoopWindowTarget,
    keyboard::KeyCode,
    window::{CursorIcon, Window, WindowBuilder, WindowId},
};
use tracing::{debug, instrument};

/// Result of feeding one window event to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayOutcome {
    /// Still selecting.
    Pending,
    /// Selection finished, in virtual-screen coordinates.
    Selected(ScreenRect),
    /// Selection abandoned.
    Canceled,
}

/// An open selection overlay.
pub struct RegionOverlay {
    window: Window,
    mode: OverlayMode,
    origin: (i32, i32),
    anchor: Option<(f64, f64)>,
    cursor: (f64, f64),
}

impl RegionOverlay {
    /// Open the overlay over all monitors.
    #[track_caller]
    #[instrument(skip(target))]
    pub fn open(target: &EventLoopWindowTarget<TrayCommand>, mode: OverlayMode) -> AppResult<Self> {
        let monitors: Vec<ScreenRect> = target
            .available_monitors()
            .map(|m| {
                let PhysicalPosition { x, y } = m.position();
                let PhysicalSize { width, height } = m.size();
                ScreenRect::new(x, y, width, height)
            })
            .collect();

        let bounds = union_bounds(&monitors)
            .ok_or_else(|| AppError::TrayError {
                reason: "No monitors available for the selection overlay".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let window = WindowBuilder::new()
            .with_title("SnapBurst selection")
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top(true)
            .with_resizable(false)
            .with_position(PhysicalPosition::new(bounds.x, bounds.y))
            .with_inner_size(PhysicalSize::new(bounds.width, bounds.height))
            .build(target)
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to open selection overlay: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        window.set_cursor_icon(CursorIcon::Crosshair);
        window.set_focus();

        debug!(%bounds, "Selection overlay opened");

        Ok(Self {
            window,
            mode,
            origin: (bounds.x, bounds.y),
            anchor: None,
            cursor: (0.0, 0.0),
        })
    }

    /// Id of the overlay window, for routing window events.
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    /// What the selection is for.
    pub fn mode(&self) -> OverlayMode {
        self.mode
    }

    /// Feed a window event.
    pub fn handle(&mut self, event: &WindowEvent<'_>) -> OverlayOutcome {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x, position.y);
                OverlayOutcome::Pending
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                self.anchor = Some(self.cursor);
                OverlayOutcome::Pending
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } => match self.anchor.take() {
                Some(anchor) => {
                    let rect = selection_rect(anchor, self.cursor, self.origin);
                    if rect.is_degenerate() {
                        OverlayOutcome::Canceled
                    } else {
                        OverlayOutcome::Selected(rect)
                    }
                }
                None => OverlayOutcome::Pending,
            },
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Right,
                ..
            }
            | WindowEvent::CloseRequested => OverlayOutcome::Canceled,
            WindowEvent::KeyboardInput { event, .. }
                if event.physical_key == KeyCode::Escape
                    && event.state == ElementState::Pressed =>
            {
                OverlayOutcome::Canceled
            }
            _ => OverlayOutcome::Pending,
        }
    }
}

/// Rectangle spanned by two window-relative points, in virtual-screen
/// coordinates of a window whose top-left corner is `origin`.
pub fn selection_rect(anchor: (f64, f64), cursor: (f64, f64), origin: (i32, i32)) -> ScreenRect {
    let left = anchor.0.min(cursor.0).round();
    let top = anchor.1.min(cursor.1).round();
    let width = (anchor.0 - cursor.0).abs().round();
    let height = (anchor.1 - cursor.1).abs().round();

    ScreenRect::new(
        origin.0.saturating_add(left as i32),
        origin.1.saturating_add(top as i32),
        width as u32,
        height as u32,
    )
}
