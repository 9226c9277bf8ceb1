use crate::{CoreResult, ScreenRect};

use std::path::Path;

/// A physical display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    /// Platform device name, as the recording engine expects it.
    pub device_name: String,
    /// Bounds in virtual-screen coordinates.
    pub bounds: ScreenRect,
}

/// A top-level window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Platform window id.
    pub id: u64,
    /// Window title, for logs.
    pub title: String,
    /// Bounds in virtual-screen coordinates.
    pub bounds: ScreenRect,
}

/// Still image capture and clipboard capability.
pub trait StillCapture {
    /// Bounds of the whole virtual screen.
    fn virtual_screen(&self) -> CoreResult<ScreenRect>;

    /// The window that currently has focus, if any.
    fn foreground_window(&self) -> CoreResult<Option<WindowInfo>>;

    /// The display overlapping `rect` the most.
    fn display_containing(&self, rect: &ScreenRect) -> CoreResult<DisplayInfo>;

    /// Grab `rect` and write it to `path`; the format follows the extension.
    fn capture(&self, rect: &ScreenRect, path: &Path) -> CoreResult<()>;

    /// Put the image stored at `path` on the clipboard.
    fn copy_file_to_clipboard(&self, path: &Path) -> CoreResult<()>;
}
