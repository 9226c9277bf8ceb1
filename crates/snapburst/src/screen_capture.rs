//! Still capture through `xcap`, clipboard through `arboard`.

use snapburst_core::{
    CaptureError, CoreResult, DisplayInfo, ScreenRect, StillCapture, WindowInfo,
};

use std::{borrow::Cow, panic::Location, path::Path};

use arboard::{Clipboard, ImageData};
use error_location::ErrorLocation;
use image::{RgbaImage, imageops};
use tracing::{debug, instrument, warn};
use xcap::{Monitor, Window};

/// Desktop capture backed by `xcap`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XcapCapture;

#[track_caller]
fn capture_error(reason: impl Into<String>) -> CaptureError {
    CaptureError::Capture {
        reason: reason.into(),
        location: ErrorLocation::from(Location::caller()),
    }
}

#[track_caller]
fn no_source(reason: impl Into<String>) -> CaptureError {
    CaptureError::NoSource {
        reason: reason.into(),
        location: ErrorLocation::from(Location::caller()),
    }
}

/// Every display with its name and bounds in virtual-screen coordinates.
#[track_caller]
pub fn displays() -> CoreResult<Vec<(Monitor, DisplayInfo)>> {
    let monitors =
        Monitor::all().map_err(|e| no_source(format!("Failed to list monitors: {e}")))?;

    let displays: Vec<_> = monitors
        .into_iter()
        .enumerate()
        .map(|(index, monitor)| {
            let info = DisplayInfo {
                device_name: monitor
                    .name()
                    .unwrap_or_else(|_| format!("Monitor {index}")),
                bounds: ScreenRect::new(
                    monitor.x().unwrap_or(0),
                    monitor.y().unwrap_or(0),
                    monitor.width().unwrap_or(0),
                    monitor.height().unwrap_or(0),
                ),
            };
            (monitor, info)
        })
        .collect();

    if displays.is_empty() {
        return Err(no_source("No displays found"));
    }
    Ok(displays)
}

/// Union of all display bounds.
pub fn union_bounds<'a>(bounds: impl IntoIterator<Item = &'a ScreenRect>) -> Option<ScreenRect> {
    let mut iter = bounds.into_iter();
    let first = iter.next()?;
    let (mut left, mut top, mut right, mut bottom) =
        (i64::from(first.x), i64::from(first.y), first.right(), first.bottom());

    for rect in iter {
        left = left.min(i64::from(rect.x));
        top = top.min(i64::from(rect.y));
        right = right.max(rect.right());
        bottom = bottom.max(rect.bottom());
    }

    Some(ScreenRect::new(
        i32::try_from(left).ok()?,
        i32::try_from(top).ok()?,
        u32::try_from(right - left).ok()?,
        u32::try_from(bottom - top).ok()?,
    ))
}

/// The display overlapping `rect` the most; the first display when none do.
pub fn best_display<'a>(rect: &ScreenRect, displays: &'a [DisplayInfo]) -> Option<&'a DisplayInfo> {
    displays
        .iter()
        .max_by_key(|d| d.bounds.intersection_area(rect))
        .filter(|d| d.bounds.intersection_area(rect) > 0)
        .or_else(|| displays.first())
}

impl StillCapture for XcapCapture {
    fn virtual_screen(&self) -> CoreResult<ScreenRect> {
        let displays = displays()?;
        union_bounds(displays.iter().map(|(_, info)| &info.bounds))
            .ok_or_else(|| no_source("No displays found"))
    }

    fn foreground_window(&self) -> CoreResult<Option<WindowInfo>> {
        let windows =
            Window::all().map_err(|e| no_source(format!("Failed to list windows: {e}")))?;

        let visible = windows
            .into_iter()
            .filter(|w| !w.is_minimized().unwrap_or(true));

        // Window::all is ordered front to back; prefer the focused window.
        let mut first = None;
        for window in visible {
            if window.is_focused().unwrap_or(false) {
                return Ok(Some(window_info(&window)));
            }
            if first.is_none() && !window.title().unwrap_or_default().is_empty() {
                first = Some(window_info(&window));
            }
        }
        Ok(first)
    }

    fn display_containing(&self, rect: &ScreenRect) -> CoreResult<DisplayInfo> {
        let infos: Vec<DisplayInfo> = displays()?.into_iter().map(|(_, info)| info).collect();
        best_display(rect, &infos)
            .cloned()
            .ok_or_else(|| no_source("No displays found"))
    }

    #[instrument(skip(self))]
    fn capture(&self, rect: &ScreenRect, path: &Path) -> CoreResult<()> {
        if rect.is_degenerate() {
            return Err(capture_error(format!("Rectangle {rect} is too small")));
        }

        let mut canvas = RgbaImage::new(rect.width, rect.height);
        let mut covered = false;

        for (monitor, info) in displays()? {
            if info.bounds.intersection_area(rect) == 0 {
                continue;
            }

            let shot = monitor
                .capture_image()
                .map_err(|e| capture_error(format!("Failed to capture {}: {e}", info.device_name)))?;

            paste_overlap(&mut canvas, rect, &info.bounds, &shot);
            covered = true;
        }

        if !covered {
            return Err(capture_error(format!("Rectangle {rect} is off screen")));
        }

        canvas
            .save(path)
            .map_err(|e| capture_error(format!("Failed to write {}: {e}", path.display())))?;

        debug!(path = ?path, %rect, "Capture written");
        Ok(())
    }

    fn copy_file_to_clipboard(&self, path: &Path) -> CoreResult<()> {
        let image = image::open(path)
            .map_err(|e| capture_error(format!("Failed to read {}: {e}", path.display())))?
            .into_rgba8();
        let (width, height) = image.dimensions();

        let mut clipboard =
            Clipboard::new().map_err(|e| capture_error(format!("Clipboard unavailable: {e}")))?;

        clipboard
            .set_image(ImageData {
                width: width as usize,
                height: height as usize,
                bytes: Cow::Owned(image.into_raw()),
            })
            .map_err(|e| {
                warn!(error = %e, "Clipboard rejected image");
                capture_error(format!("Failed to copy to clipboard: {e}"))
            })
    }
}

fn window_info(window: &Window) -> WindowInfo {
    WindowInfo {
        id: u64::from(window.id().unwrap_or(0)),
        title: window.title().unwrap_or_default(),
        bounds: ScreenRect::new(
            window.x().unwrap_or(0),
            window.y().unwrap_or(0),
            window.width().unwrap_or(0),
            window.height().unwrap_or(0),
        ),
    }
}

/// Copy the part of `shot` (a capture of display `display`) that overlaps
/// `rect` into `canvas` (which covers `rect`). Handles displays whose pixel
/// size differs from their logical bounds.
fn paste_overlap(canvas: &mut RgbaImage, rect: &ScreenRect, display: &ScreenRect, shot: &RgbaImage) {
    let left = rect.x.max(display.x);
    let top = rect.y.max(display.y);
    let right = rect.right().min(display.right());
    let bottom = rect.bottom().min(display.bottom());
    if right <= i64::from(left) || bottom <= i64::from(top) {
        return;
    }

    let scale_x = f64::from(shot.width()) / f64::from(display.width.max(1));
    let scale_y = f64::from(shot.height()) / f64::from(display.height.max(1));

    let src_x = (f64::from(left - display.x) * scale_x) as u32;
    let src_y = (f64::from(top - display.y) * scale_y) as u32;
    let width = (right - i64::from(left)) as u32;
    let height = (bottom - i64::from(top)) as u32;
    let src_w = ((f64::from(width) * scale_x) as u32).min(shot.width().saturating_sub(src_x));
    let src_h = ((f64::from(height) * scale_y) as u32).min(shot.height().saturating_sub(src_y));
    if src_w == 0 || src_h == 0 {
        return;
    }

    let mut part = imageops::crop_imm(shot, src_x, src_y, src_w, src_h).to_image();
    if src_w != width || src_h != height {
        part = imageops::resize(&part, width, height, imageops::FilterType::Triangle);
    }

    imageops::replace(
        canvas,
        &part,
        i64::from(left - rect.x),
        i64::from(top - rect.y),
    );
}
