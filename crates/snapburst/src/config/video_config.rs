use crate::config::{default_ffmpeg_path, default_include_audio, default_stop_grace_ms};

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// Screen recording configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Record audio with hotkey-triggered recordings.
    #[serde(default = "default_include_audio")]
    pub include_audio: bool,

    /// How long a stop may take before the recording is abandoned.
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,

    /// ffmpeg executable; a bare name is looked up on `PATH`.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
}

impl VideoConfig {
    /// Stop grace period as a `Duration`.
    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            include_audio: default_include_audio(),
            stop_grace_ms: default_stop_grace_ms(),
            ffmpeg_path: default_ffmpeg_path(),
        }
    }
}
