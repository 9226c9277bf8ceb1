use std::{panic::Location, path::PathBuf};

use error_location::ErrorLocation;
use thiserror::Error;

/// Capture core errors with source location tracking.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Filesystem operation failed.
    #[error("IO error on {path:?}: {source} {location}")]
    Io {
        /// Path the operation was acting on.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The recording engine rejected or failed an operation.
    #[error("Recording engine error: {reason} {location}")]
    Engine {
        /// Description of the engine failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A hotkey chord could not be parsed.
    #[error("Invalid hotkey chord {chord:?}: {reason} {location}")]
    InvalidChord {
        /// The chord text as supplied.
        chord: String,
        /// Why parsing failed.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The OS refused a hotkey registration.
    #[error("Hotkey registration failed: {reason} {location}")]
    Registration {
        /// Human-readable reason for failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No capture source (window, display) was available.
    #[error("No capture source: {reason} {location}")]
    NoSource {
        /// What was missing.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Still image capture or clipboard transfer failed.
    #[error("Capture failed: {reason} {location}")]
    Capture {
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl CaptureError {
    /// Wrap an IO error for `path`, recording the caller's location.
    #[track_caller]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CaptureError::Io {
            path: path.into(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Build an engine error, recording the caller's location.
    #[track_caller]
    pub fn engine(reason: impl Into<String>) -> Self {
        CaptureError::Engine {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Short message suitable for a toast: the reason without the location suffix.
    pub fn user_message(&self) -> String {
        match self {
            CaptureError::Io { source, .. } => source.to_string(),
            CaptureError::Engine { reason, .. }
            | CaptureError::Registration { reason, .. }
            | CaptureError::NoSource { reason, .. }
            | CaptureError::Capture { reason, .. } => reason.clone(),
            CaptureError::InvalidChord { chord, reason, .. } => format!("{chord}: {reason}"),
        }
    }
}

/// Result type alias using [`CaptureError`].
pub type Result<T> = std::result::Result<T, CaptureError>;
