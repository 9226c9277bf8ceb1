//! SnapBurst Core Library
//!
//! Burst screenshot sessions, global hotkey dispatch and a screen recording
//! lifecycle over an external engine. Platform capabilities (hotkey
//! registration, pixel capture, the recording engine, toasts) sit behind
//! traits implemented by the application crate.
//!
//! # Example
//!
//! ```no_run
//! use snapburst_core::{SessionManager, SessionSettings, CoreResult};
//!
//! fn main() -> CoreResult<()> {
//!     let mut session = SessionManager::new(SessionSettings {
//!         root: "/tmp/shots".into(),
//!         template: "HHmmss_###".to_string(),
//!     });
//!
//!     session.start_new_session();
//!     let path = session.next_file_path(".png")?;
//!     // ... write the image to `path` ...
//!     session.register_saved(path);
//!
//!     println!("{:?}", session.status());
//!     Ok(())
//! }
//! ```

mod error;
mod geometry;
mod hotkey;
mod orchestrator;
mod recording;
mod session;

pub use {
    error::{CaptureError, Result as CoreResult},
    geometry::ScreenRect,
    hotkey::{Chord, HotkeyAction, HotkeyDispatcher, HotkeyRegistrar, Key, Modifiers},
    orchestrator::{
        CaptureOrchestrator, DisplayInfo, Notifier, OrchestratorSettings, OverlayMode,
        StillCapture, WindowInfo,
    },
    recording::{
        DEFAULT_STOP_GRACE, ElapsedClock, EncoderOptions, EngineEvent, EngineEventSink,
        EngineHandle, EngineOptions, EngineStatus, LifecycleOptions, RecordingEngine,
        RecordingEvent, RecordingLifecycle, RecordingState, STOPPED_UNEXPECTEDLY,
        SourceDescriptor,
    },
    session::{
        BurstStatus, Clock, DEFAULT_TEMPLATE, FileNameTemplate, SessionManager, SessionSettings,
        SystemClock,
    },
};
