use crate::recording::EngineStatus;

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use tracing::error;

/// Notification published by the recording lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingEvent {
    /// Recording switched on (`true`) or fully off (`false`).
    StateChanged(bool),
    /// Output file finalized.
    Completed(PathBuf),
    /// Attempt failed; carries a user-facing message.
    Failed(String),
    /// Engine status transition.
    StatusChanged(EngineStatus),
}

type Observer = Arc<dyn Fn(&RecordingEvent) + Send + Sync>;

/// Fault-isolating observer list.
///
/// Each observer is called with no lifecycle lock held. A panicking observer
/// is logged and skipped; the others still receive the event.
#[derive(Default)]
pub(crate) struct ObserverSet {
    observers: Mutex<Vec<Observer>>,
}

impl ObserverSet {
    pub(crate) fn subscribe(&self, observer: Observer) {
        self.observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(observer);
    }

    pub(crate) fn notify(&self, events: &[RecordingEvent]) {
        if events.is_empty() {
            return;
        }

        // Snapshot so observers may subscribe from inside a callback.
        let observers: Vec<Observer> = self
            .observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        for event in events {
            for (index, observer) in observers.iter().enumerate() {
                if catch_unwind(AssertUnwindSafe(|| observer(event))).is_err() {
                    error!(observer = index, ?event, "Recording observer panicked");
                }
            }
        }
    }
}
