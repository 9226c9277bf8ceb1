mod elapsed;
mod engine;
mod lifecycle;
mod observer;
mod state;

pub use {
    elapsed::ElapsedClock,
    engine::{
        EncoderOptions, EngineEvent, EngineEventSink, EngineHandle, EngineOptions, EngineStatus,
        RecordingEngine, SourceDescriptor,
    },
    lifecycle::{DEFAULT_STOP_GRACE, LifecycleOptions, RecordingLifecycle, STOPPED_UNEXPECTEDLY},
    observer::RecordingEvent,
    state::RecordingState,
};
