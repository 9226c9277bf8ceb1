//! Boundary to the external screen recording engine.
//!
//! The engine is an opaque capability: create a handle for a described
//! source, tell it to record/stop/pause/resume, and listen for lifecycle
//! callbacks. Callbacks are posted through an [`EngineEventSink`] from
//! whatever thread the engine uses; the lifecycle drains them on its own task.

use crate::{CoreResult, ScreenRect};

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

/// What to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    /// The whole virtual screen (all monitors).
    VirtualScreen,
    /// A single top-level window.
    Window {
        /// Platform window id.
        window_id: u64,
    },
    /// A sub-rectangle of one display.
    DisplayRegion {
        /// Platform display device name.
        device_name: String,
        /// Rectangle relative to the display's top-left corner.
        rect: ScreenRect,
    },
}

/// Fixed encoder parameters handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Target frames per second.
    pub framerate: u32,
    /// Target bitrate in bits per second.
    pub bitrate: u32,
    /// Whether duplicate frames are emitted to hold the frame rate.
    pub fixed_framerate: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            framerate: 30,
            bitrate: 8_000_000,
            fixed_framerate: false,
        }
    }
}

/// Full engine configuration for one recording attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Recording source.
    pub source: SourceDescriptor,
    /// Capture microphone and system audio.
    pub include_audio: bool,
    /// Draw the mouse cursor into the video.
    pub capture_cursor: bool,
    /// Encoder parameters.
    pub encoder: EncoderOptions,
}

/// Engine-reported status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineStatus {
    /// Not recording; terminal once a recording has run.
    Idle,
    /// Frames are being written.
    Recording,
    /// Recording is paused.
    Paused,
    /// Stop accepted, output being finalized.
    Finishing,
}

/// Callback from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The output file was finalized. `None` means "the path you gave me".
    Completed {
        /// Final output path reported by the engine.
        path: Option<PathBuf>,
    },
    /// Recording failed.
    Failed {
        /// Engine error message.
        message: String,
    },
    /// Status transition.
    StatusChanged(EngineStatus),
}

/// Sender half handed to the engine at creation time.
///
/// Sends never block. Once the lifecycle has let go of the attempt the
/// messages are silently dropped.
#[derive(Debug, Clone)]
pub struct EngineEventSink {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EngineEventSink {
    /// A sink and the receiver its events arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Report that the output file is complete.
    pub fn complete(&self, path: Option<PathBuf>) -> bool {
        self.send(EngineEvent::Completed { path })
    }

    /// Report a recording failure.
    pub fn failed(&self, message: impl Into<String>) -> bool {
        self.send(EngineEvent::Failed {
            message: message.into(),
        })
    }

    /// Report a status transition.
    pub fn status(&self, status: EngineStatus) -> bool {
        self.send(EngineEvent::StatusChanged(status))
    }

    /// Post a raw event. Returns `false` when nobody listens any more.
    pub fn send(&self, event: EngineEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Factory for recording handles.
pub trait RecordingEngine: Send + Sync + 'static {
    /// Per-attempt handle type.
    type Handle: EngineHandle;

    /// Create a handle configured with `options`. Callbacks for this attempt
    /// go through `events`.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine cannot be configured for the source.
    fn create(&self, options: &EngineOptions, events: EngineEventSink) -> CoreResult<Self::Handle>;

    /// Whether handles honour `pause`/`resume`.
    fn supports_pause(&self) -> bool {
        true
    }
}

/// A single recording attempt.
///
/// All calls may block; the lifecycle always invokes them from a blocking
/// worker, never from the owning context.
pub trait EngineHandle: Send + Sync + 'static {
    /// Begin writing to `path`. Returns once the engine accepted the request.
    fn record(&self, path: &Path) -> CoreResult<()>;

    /// Ask the engine to finish. Completion arrives later as a callback.
    fn stop(&self) -> CoreResult<()>;

    /// Pause frame capture.
    fn pause(&self) -> CoreResult<()>;

    /// Resume frame capture.
    fn resume(&self) -> CoreResult<()>;

    /// Release engine resources. Called exactly once per handle.
    fn dispose(&self);
}
