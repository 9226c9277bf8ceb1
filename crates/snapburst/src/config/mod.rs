mod capture_config;
#[allow(clippy::module_inception)]
mod config;
mod hotkey_config;
mod ui_config;
mod video_config;

pub(crate) use {
    capture_config::CaptureConfig, config::Config, hotkey_config::HotkeyConfig,
    ui_config::UiConfig, video_config::VideoConfig,
};

use std::path::PathBuf;

use directories::{ProjectDirs, UserDirs};

pub(crate) const QUALIFIER: &str = "com";
pub(crate) const ORGANIZATION: &str = "snapburst";
pub(crate) const APPLICATION: &str = "SnapBurst";

pub(crate) const DEFAULT_COPY_TO_CLIPBOARD: bool = true;
pub(crate) const DEFAULT_INCLUDE_AUDIO: bool = false;
pub(crate) const DEFAULT_STOP_GRACE_MS: u64 = 4000;
pub(crate) const DEFAULT_FFMPEG: &str = "ffmpeg";
pub(crate) const DEFAULT_TOAST_DURATION_MS: u64 = 2500;

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// `Pictures/SnapBurst`, falling back to the data dir and then the working dir.
pub(crate) fn default_save_root() -> PathBuf {
    if let Some(pictures) = UserDirs::new().and_then(|d| d.picture_dir().map(PathBuf::from)) {
        return pictures.join(APPLICATION);
    }
    match project_dirs() {
        Some(dirs) => dirs.data_dir().join("captures"),
        None => PathBuf::from("captures"),
    }
}

pub(crate) fn default_file_name_template() -> String {
    snapburst_core::DEFAULT_TEMPLATE.to_string()
}

pub(crate) fn default_copy_to_clipboard() -> bool {
    DEFAULT_COPY_TO_CLIPBOARD
}

pub(crate) fn default_include_audio() -> bool {
    DEFAULT_INCLUDE_AUDIO
}

pub(crate) fn default_stop_grace_ms() -> u64 {
    DEFAULT_STOP_GRACE_MS
}

pub(crate) fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from(DEFAULT_FFMPEG)
}

pub(crate) fn default_toast_duration_ms() -> u64 {
    DEFAULT_TOAST_DURATION_MS
}
