//! Configuration management for snapburst.
//!
//! Handles loading and saving the TOML configuration file with
//! cross-platform paths, per-field defaults and atomic writes.

use crate::{
    AppError, AppResult,
    config::{CaptureConfig, HotkeyConfig, UiConfig, VideoConfig, project_dirs},
};

use snapburst_core::{
    HotkeyAction, LifecycleOptions, OrchestratorSettings, SessionSettings,
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Still capture settings.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Screen recording settings.
    #[serde(default)]
    pub video: VideoConfig,
    /// Global hotkey chords.
    #[serde(default)]
    pub hotkeys: HotkeyConfig,
    /// Toasts and tray appearance.
    #[serde(default)]
    pub ui: UiConfig,
    /// Set when the file on disk was unusable and these are stand-in
    /// defaults. Such a config is never written back.
    #[serde(skip)]
    pub(crate) fallback: bool,
}

impl Config {
    /// Load configuration from disk, creating the default file if missing.
    ///
    /// A file that cannot be read or parsed is logged and replaced by
    /// defaults in memory; the file on disk is left for the user to fix.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path. Same fallback rules as [`Config::load`].
    #[track_caller]
    pub fn load_from(config_path: &Path) -> AppResult<Self> {
        if !config_path.exists() {
            info!(config_path = ?config_path, "No config found, creating default");
            let config = Config::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let parsed = fs::read_to_string(config_path)
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to read config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
            .and_then(|contents| Self::from_toml_str(&contents));

        match parsed {
            Ok(config) => {
                info!(config_path = ?config_path, "Configuration loaded");
                Ok(config)
            }
            Err(e) => {
                error!(config_path = ?config_path, error = %e, "Config unusable, using defaults");
                Ok(Config {
                    fallback: true,
                    ..Config::default()
                })
            }
        }
    }

    /// Parse TOML text. Missing sections and fields take their defaults.
    #[track_caller]
    pub fn from_toml_str(contents: &str) -> AppResult<Self> {
        toml::from_str(contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Save configuration to the default location.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save(&self) -> AppResult<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Whether these values replaced an unreadable file.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Save configuration using the atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write. A fallback config is not
    /// written, so the broken file stays for the user to repair.
    #[track_caller]
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        if self.fallback {
            warn!(config_path = ?config_path, "Config came from defaults after a load error, not saving");
            return Ok(());
        }

        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(parent) = config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
                debug!(config_dir = ?parent, "Created config directory");
            }
        }

        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// `action → chord text` for every action, in registration order.
    pub fn hotkey_bindings(&self) -> Vec<(HotkeyAction, String)> {
        HotkeyAction::ALL
            .iter()
            .map(|&action| (action, self.hotkeys.chord(action).to_string()))
            .collect()
    }

    /// Snapshot for the session manager.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            root: self.capture.save_root.clone(),
            template: self.capture.file_name_template.clone(),
        }
    }

    /// Snapshot for the capture orchestrator.
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            copy_to_clipboard: self.capture.copy_to_clipboard,
            include_audio: self.video.include_audio,
            toast_duration: self.ui.toast_duration(),
        }
    }

    /// Options for the recording lifecycle.
    pub fn lifecycle_options(&self) -> LifecycleOptions {
        LifecycleOptions {
            stop_grace: self.video.stop_grace(),
            ..LifecycleOptions::default()
        }
    }

    /// Path of the config file, creating its directory if needed.
    #[track_caller]
    pub fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = project_dirs().ok_or_else(|| AppError::ConfigError {
            reason: "Failed to get config directory".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }
}
