//! Fakes shared by the unit tests.

use crate::{
    CaptureError, Chord, Clock, CoreResult, EngineEventSink, EngineHandle, EngineOptions,
    HotkeyRegistrar, RecordingEngine,
};

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{NaiveDate, NaiveDateTime};

/// Clock frozen at a settable instant.
#[derive(Clone)]
pub(crate) struct ManualClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

#[allow(clippy::unwrap_used)]
impl ManualClock {
    pub(crate) fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Self {
        let now = NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap();
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub(crate) fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

#[allow(clippy::unwrap_used)]
impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}

/// Registrar that records live ids and can refuse chosen chords.
#[derive(Default)]
pub(crate) struct FakeRegistrar {
    pub(crate) live: BTreeSet<u32>,
    pub(crate) refused: Vec<Chord>,
    pub(crate) register_calls: usize,
    pub(crate) unregister_calls: usize,
}

impl HotkeyRegistrar for FakeRegistrar {
    fn register(&mut self, id: u32, chord: &Chord) -> CoreResult<()> {
        self.register_calls += 1;
        if self.refused.contains(chord) {
            return Err(CaptureError::Registration {
                reason: format!("{chord} already taken"),
                location: error_location::ErrorLocation::from(std::panic::Location::caller()),
            });
        }
        self.live.insert(id);
        Ok(())
    }

    fn unregister(&mut self, id: u32) {
        self.unregister_calls += 1;
        self.live.remove(&id);
    }
}

/// One call made on a [`MockHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EngineCall {
    Record(PathBuf),
    Stop,
    Pause,
    Resume,
    Dispose,
}

/// Scripted engine behaviour.
#[derive(Debug, Clone, Default)]
pub(crate) struct EngineScript {
    /// `create` fails.
    pub(crate) fail_create: bool,
    /// `record` fails.
    pub(crate) fail_record: bool,
    /// `stop` fails.
    pub(crate) fail_stop: bool,
    /// `pause` fails.
    pub(crate) fail_pause: bool,
    /// On `stop`, write the output file and report completion.
    pub(crate) complete_on_stop: bool,
    /// Engine declares it cannot pause.
    pub(crate) no_pause: bool,
    /// `record` blocks this long before it is logged and returns.
    pub(crate) record_delay: Option<Duration>,
}

#[derive(Default)]
struct MockState {
    script: EngineScript,
    calls: Vec<EngineCall>,
    created: Vec<EngineOptions>,
    sinks: Vec<EngineEventSink>,
}

/// Recording engine double. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

#[allow(clippy::unwrap_used)]
impl MockEngine {
    pub(crate) fn scripted(script: EngineScript) -> Self {
        let engine = Self::default();
        engine.state.lock().unwrap().script = script;
        engine
    }

    pub(crate) fn set_script(&self, script: EngineScript) {
        self.state.lock().unwrap().script = script;
    }

    pub(crate) fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn count(&self, call: &EngineCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub(crate) fn created(&self) -> Vec<EngineOptions> {
        self.state.lock().unwrap().created.clone()
    }

    /// Sink of the most recent attempt.
    pub(crate) fn sink(&self) -> EngineEventSink {
        self.state.lock().unwrap().sinks.last().cloned().unwrap()
    }
}

pub(crate) struct MockHandle {
    state: Arc<Mutex<MockState>>,
    sink: EngineEventSink,
    path: Mutex<Option<PathBuf>>,
}

#[allow(clippy::unwrap_used)]
impl RecordingEngine for MockEngine {
    type Handle = MockHandle;

    fn create(&self, options: &EngineOptions, events: EngineEventSink) -> CoreResult<MockHandle> {
        let mut state = self.state.lock().unwrap();
        if state.script.fail_create {
            return Err(CaptureError::engine("no capture device"));
        }
        state.created.push(options.clone());
        state.sinks.push(events.clone());
        Ok(MockHandle {
            state: Arc::clone(&self.state),
            sink: events,
            path: Mutex::new(None),
        })
    }

    fn supports_pause(&self) -> bool {
        !self.state.lock().unwrap().script.no_pause
    }
}

#[allow(clippy::unwrap_used)]
impl MockHandle {
    fn log(&self, call: EngineCall) -> EngineScript {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state.script.clone()
    }
}

#[allow(clippy::unwrap_used)]
impl EngineHandle for MockHandle {
    fn record(&self, path: &Path) -> CoreResult<()> {
        let delay = self.state.lock().unwrap().script.record_delay;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let script = self.log(EngineCall::Record(path.to_path_buf()));
        if script.fail_record {
            return Err(CaptureError::engine("encoder unavailable"));
        }
        *self.path.lock().unwrap() = Some(path.to_path_buf());
        Ok(())
    }

    fn stop(&self) -> CoreResult<()> {
        let script = self.log(EngineCall::Stop);
        if script.fail_stop {
            return Err(CaptureError::engine("stop rejected"));
        }
        if script.complete_on_stop {
            let path = self.path.lock().unwrap().clone();
            if let Some(path) = &path {
                std::fs::write(path, b"mp4").unwrap();
            }
            self.sink.complete(path);
        }
        Ok(())
    }

    fn pause(&self) -> CoreResult<()> {
        let script = self.log(EngineCall::Pause);
        if script.fail_pause {
            return Err(CaptureError::engine("pause unsupported"));
        }
        Ok(())
    }

    fn resume(&self) -> CoreResult<()> {
        self.log(EngineCall::Resume);
        Ok(())
    }

    fn dispose(&self) {
        self.log(EngineCall::Dispose);
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub(crate) async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
