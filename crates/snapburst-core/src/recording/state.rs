use std::fmt;

/// Recording lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordingState {
    /// No recording attempt.
    #[default]
    Idle,
    /// Engine handle created, `record` submitted but not yet accepted.
    Starting,
    /// Engine accepted the recording.
    Recording,
    /// Recording paused locally.
    Paused,
    /// Stop requested, waiting for the engine to finish.
    Stopping,
}

impl RecordingState {
    /// Any state other than [`Idle`](RecordingState::Idle).
    pub fn is_active(self) -> bool {
        self != RecordingState::Idle
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordingState::Idle => "idle",
            RecordingState::Starting => "starting",
            RecordingState::Recording => "recording",
            RecordingState::Paused => "paused",
            RecordingState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}
