//! Recording lifecycle state machine.
//!
//! ```text
//!            start()            record() ok
//!   Idle ─────────────▶ Starting ─────────────▶ Recording ◀──┐
//!    ▲                     │                     │ pause()   │ resume()
//!    │                     │ stop()              ▼           │
//!    │                     │                   Paused ───────┘
//!    │                     ▼                     │
//!    └──── cleanup ◀── Stopping ◀────────────────┘ stop()
//! ```
//!
//! Every transition happens under one mutex. Each attempt owns one blocking
//! worker that runs its engine calls in submission order and disposes the
//! handle after the last one, so a stop can never overtake the record call
//! it follows. Engine callbacks arrive as messages on a per-attempt channel.
//! A cleanup from any state returns to `Idle`, bumps the stop token
//! (invalidating pending timeout guards) and drops the attempt so late
//! callbacks are ignored. Exactly one terminal notification (`Completed` or
//! `Failed`) is raised per attempt.

use crate::{
    CoreResult, ScreenRect,
    recording::{
        ElapsedClock, EncoderOptions, EngineEvent, EngineEventSink, EngineHandle, EngineOptions,
        EngineStatus, RecordingEngine, RecordingEvent, RecordingState, SourceDescriptor,
        observer::ObserverSet,
    },
};

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{runtime::Handle, sync::mpsc};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// How long a stop may take before the attempt is force-cleaned.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(4);

/// Failure message raised when the stop grace period runs out.
pub const STOPPED_UNEXPECTEDLY: &str = "Recording stopped unexpectedly";

const RECORDING_FAILED: &str = "Recording failed";

/// Tunables for [`RecordingLifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleOptions {
    /// Timeout guard duration armed by [`RecordingLifecycle::stop`].
    pub stop_grace: Duration,
    /// Encoder parameters for every attempt.
    pub encoder: EncoderOptions,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            stop_grace: DEFAULT_STOP_GRACE,
            encoder: EncoderOptions::default(),
        }
    }
}

/// Owns the recording state machine over an external engine.
///
/// Cheap to clone; clones share the same state.
pub struct RecordingLifecycle<E: RecordingEngine> {
    inner: Arc<Inner<E>>,
}

impl<E: RecordingEngine> Clone for RecordingLifecycle<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<E: RecordingEngine> {
    engine: E,
    runtime: Handle,
    options: LifecycleOptions,
    session: Mutex<RecordingSession>,
    stop_token: AtomicU64,
    completion_raised: AtomicBool,
    observers: ObserverSet,
}

/// Engine call queued on an attempt's worker.
#[derive(Debug)]
enum EngineCommand {
    Stop,
    Pause,
    Resume,
}

struct RecordingSession {
    state: RecordingState,
    /// Queue to the attempt's engine worker. Dropping it lets the worker
    /// finish the queued calls and dispose the handle.
    worker: Option<mpsc::UnboundedSender<EngineCommand>>,
    attempt: u64,
    attempt_id: Uuid,
    current_path: Option<PathBuf>,
    last_completed_path: Option<PathBuf>,
    last_status: EngineStatus,
    clock: ElapsedClock,
}

impl RecordingSession {
    fn submit(&self, command: EngineCommand) -> bool {
        match &self.worker {
            Some(worker) => worker.send(command).is_ok(),
            None => false,
        }
    }

    fn is_current(&self, attempt: u64) -> bool {
        self.attempt == attempt && self.worker.is_some()
    }
}

impl<E: RecordingEngine> RecordingLifecycle<E> {
    /// Create an idle lifecycle. Background work is spawned on `runtime`.
    pub fn new(engine: E, runtime: Handle, options: LifecycleOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                runtime,
                options,
                session: Mutex::new(RecordingSession {
                    state: RecordingState::Idle,
                    worker: None,
                    attempt: 0,
                    attempt_id: Uuid::nil(),
                    current_path: None,
                    last_completed_path: None,
                    last_status: EngineStatus::Idle,
                    clock: ElapsedClock::default(),
                }),
                stop_token: AtomicU64::new(0),
                completion_raised: AtomicBool::new(false),
                observers: ObserverSet::default(),
            }),
        }
    }

    /// Register an observer for [`RecordingEvent`]s.
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&RecordingEvent) + Send + Sync + 'static,
    {
        self.inner.observers.subscribe(Arc::new(observer));
    }

    /// Record the whole virtual screen.
    pub fn start_fullscreen(&self, path: PathBuf, include_audio: bool) -> bool {
        self.inner
            .start(SourceDescriptor::VirtualScreen, path, include_audio)
    }

    /// Record a single window. A zero id is rejected.
    pub fn start_window(&self, window_id: u64, path: PathBuf, include_audio: bool) -> bool {
        if window_id == 0 {
            warn!("Window recording requested without a window");
            return false;
        }
        self.inner
            .start(SourceDescriptor::Window { window_id }, path, include_audio)
    }

    /// Record `rect` (relative to the display) of display `device_name`.
    pub fn start_region(
        &self,
        device_name: impl Into<String>,
        rect: ScreenRect,
        path: PathBuf,
        include_audio: bool,
    ) -> bool {
        if rect.is_degenerate() {
            warn!(%rect, "Region recording requested with an empty rectangle");
            return false;
        }
        let source = SourceDescriptor::DisplayRegion {
            device_name: device_name.into(),
            rect,
        };
        self.inner.start(source, path, include_audio)
    }

    /// Ask the engine to finish. No-op when idle or already stopping.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Pause a running recording. No-op unless recording.
    pub fn pause(&self) {
        self.inner.pause();
    }

    /// Resume a paused recording. No-op unless paused.
    pub fn resume(&self) {
        self.inner.resume();
    }

    /// Delete the last completed recording from disk.
    ///
    /// Rejected (returns `false`) while an attempt is in progress or when no
    /// recording has completed.
    #[instrument(skip(self))]
    pub fn delete_last_recording(&self) -> bool {
        let mut s = self.inner.session();

        if s.state.is_active() {
            warn!(state = %s.state, "Refusing to delete while recording");
            return false;
        }

        let Some(path) = s.last_completed_path.clone() else {
            return false;
        };

        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                error!(path = ?path, error = ?e, "Failed to delete recording");
                return false;
            }
            info!(path = ?path, "Recording deleted");
        }

        s.last_completed_path = None;
        true
    }

    /// Current state.
    pub fn state(&self) -> RecordingState {
        self.inner.session().state
    }

    /// Any attempt in progress, including starting and stopping.
    pub fn is_recording(&self) -> bool {
        self.state().is_active()
    }

    /// Whether the recording is paused.
    pub fn is_paused(&self) -> bool {
        self.state() == RecordingState::Paused
    }

    /// Whether a stop is pending.
    pub fn is_stopping(&self) -> bool {
        self.state() == RecordingState::Stopping
    }

    /// Whether the engine can pause at all.
    pub fn can_pause(&self) -> bool {
        self.inner.engine.supports_pause()
    }

    /// Recorded time, excluding paused intervals.
    pub fn elapsed(&self) -> Duration {
        self.inner.session().clock.elapsed()
    }

    /// Output path of the attempt in progress.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.inner.session().current_path.clone()
    }

    /// Output path of the last recording that completed.
    pub fn last_completed_path(&self) -> Option<PathBuf> {
        self.inner.session().last_completed_path.clone()
    }
}

impl<E: RecordingEngine> Inner<E> {
    fn session(&self) -> MutexGuard<'_, RecordingSession> {
        self.session.lock().unwrap_or_else(|e| {
            error!("Recording session lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Compare-and-set on `completion_raised`; true for the first caller only.
    fn mark_complete_once(&self) -> bool {
        self.completion_raised
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[instrument(skip(self))]
    fn start(self: &Arc<Self>, source: SourceDescriptor, path: PathBuf, include_audio: bool) -> bool {
        let events = {
            let mut s = self.session();

            if s.state.is_active() {
                warn!(state = %s.state, current = ?s.current_path, "Start requested while already recording");
                return false;
            }

            let options = EngineOptions {
                source,
                include_audio,
                capture_cursor: true,
                encoder: self.options.encoder,
            };

            let (sink, rx) = EngineEventSink::channel();
            let handle = match self.engine.create(&options, sink) {
                Ok(handle) => handle,
                Err(e) => {
                    error!(error = %e, "Failed to create recording engine");
                    drop(s);
                    self.observers
                        .notify(&[RecordingEvent::Failed(e.user_message())]);
                    return false;
                }
            };

            let (worker, commands) = mpsc::unbounded_channel();

            s.attempt += 1;
            s.attempt_id = Uuid::new_v4();
            s.state = RecordingState::Starting;
            s.worker = Some(worker);
            s.current_path = Some(path.clone());
            s.last_completed_path = None;
            s.last_status = EngineStatus::Idle;
            s.clock.restart();
            self.completion_raised.store(false, Ordering::Release);

            let attempt = s.attempt;
            let attempt_id = s.attempt_id;
            self.runtime
                .spawn(Arc::clone(self).pump_engine_events(attempt, rx));

            let inner = Arc::clone(self);
            let target = path.clone();
            self.runtime.spawn_blocking(move || {
                inner.run_engine_worker(attempt, attempt_id, handle, &target, commands);
            });

            info!(
                %attempt_id,
                path = ?path,
                include_audio,
                "Recording start submitted"
            );

            [RecordingEvent::StateChanged(true)]
        };

        self.observers.notify(&events);
        true
    }

    /// Submit the record call, then run the attempt's later engine calls in
    /// the order they were queued. The handle is disposed once the queue is
    /// closed and drained.
    fn run_engine_worker(
        &self,
        attempt: u64,
        attempt_id: Uuid,
        handle: E::Handle,
        path: &Path,
        mut commands: mpsc::UnboundedReceiver<EngineCommand>,
    ) {
        let result = handle.record(path);
        self.on_record_submitted(attempt, attempt_id, result);

        while let Some(command) = commands.blocking_recv() {
            match command {
                EngineCommand::Stop => {
                    if let Err(e) = handle.stop() {
                        error!(%attempt_id, error = %e, "Engine stop failed");
                        self.fail_attempt(attempt, e.user_message());
                    }
                }
                // Best-effort once applied locally: an engine refusal is
                // logged and the state stays as requested.
                EngineCommand::Pause => {
                    if let Err(e) = handle.pause() {
                        warn!(%attempt_id, error = %e, "Engine pause failed");
                    }
                }
                EngineCommand::Resume => {
                    if let Err(e) = handle.resume() {
                        warn!(%attempt_id, error = %e, "Engine resume failed");
                    }
                }
            }
        }

        handle.dispose();
        debug!(%attempt_id, "Engine handle disposed");
    }

    fn on_record_submitted(&self, attempt: u64, attempt_id: Uuid, result: CoreResult<()>) {
        let events = {
            let mut s = self.session();

            if !s.is_current(attempt) {
                debug!(%attempt_id, "Record submission finished for a stale attempt");
                return;
            }

            match result {
                Ok(()) => {
                    let mut events = Vec::new();
                    if s.state == RecordingState::Starting {
                        s.state = RecordingState::Recording;
                        debug!(%attempt_id, "Engine accepted recording");
                        if s.last_status != EngineStatus::Recording {
                            s.last_status = EngineStatus::Recording;
                            events.push(RecordingEvent::StatusChanged(EngineStatus::Recording));
                        }
                    }
                    events
                }
                Err(e) => {
                    error!(%attempt_id, error = %e, "Engine rejected recording, rolling back");
                    let mut events = self.cleanup(&mut s);
                    if self.mark_complete_once() {
                        events.push(RecordingEvent::Failed(e.user_message()));
                    }
                    events
                }
            }
        };

        self.observers.notify(&events);
    }

    #[instrument(skip(self))]
    fn stop(self: &Arc<Self>) {
        let token = {
            let mut s = self.session();

            if !s.state.is_active() || s.state == RecordingState::Stopping {
                debug!(state = %s.state, "Stop ignored");
                return;
            }

            if !s.submit(EngineCommand::Stop) {
                error!(attempt_id = %s.attempt_id, "Engine worker gone, forcing cleanup");
                let mut events = self.cleanup(&mut s);
                if self.mark_complete_once() {
                    events.push(RecordingEvent::Failed(STOPPED_UNEXPECTEDLY.to_string()));
                }
                drop(s);
                self.observers.notify(&events);
                return;
            }

            s.state = RecordingState::Stopping;
            s.clock.pause();
            let token = self.stop_token.fetch_add(1, Ordering::AcqRel) + 1;

            info!(attempt_id = %s.attempt_id, token, "Recording stop requested");
            token
        };

        let inner = Arc::clone(self);
        let grace = self.options.stop_grace;
        self.runtime.spawn(async move {
            tokio::time::sleep(grace).await;
            inner.on_stop_timeout(token);
        });
    }

    fn on_stop_timeout(&self, token: u64) {
        let events = {
            let mut s = self.session();

            if !s.state.is_active() || self.stop_token.load(Ordering::Acquire) != token {
                debug!(token, "Stop guard expired after the attempt moved on");
                return;
            }

            warn!(attempt_id = %s.attempt_id, "Recording stop timed out, forcing cleanup");
            let mut events = self.cleanup(&mut s);
            if self.mark_complete_once() {
                events.push(RecordingEvent::Failed(STOPPED_UNEXPECTEDLY.to_string()));
            }
            events
        };

        self.observers.notify(&events);
    }

    fn pause(&self) {
        let mut s = self.session();
        if s.state != RecordingState::Recording || !s.submit(EngineCommand::Pause) {
            return;
        }
        s.state = RecordingState::Paused;
        s.clock.pause();
        info!(attempt_id = %s.attempt_id, "Recording pause requested");
    }

    fn resume(&self) {
        let mut s = self.session();
        if s.state != RecordingState::Paused || !s.submit(EngineCommand::Resume) {
            return;
        }
        s.state = RecordingState::Recording;
        s.clock.resume();
        info!(attempt_id = %s.attempt_id, "Recording resume requested");
    }

    async fn pump_engine_events(
        self: Arc<Self>,
        attempt: u64,
        mut rx: mpsc::UnboundedReceiver<EngineEvent>,
    ) {
        while let Some(event) = rx.recv().await {
            if !self.on_engine_event(attempt, event) {
                break;
            }
        }
        debug!(attempt, "Engine event pump finished");
    }

    /// Apply one engine callback. Returns `false` once the attempt is over
    /// and the subscription should be dropped.
    fn on_engine_event(&self, attempt: u64, event: EngineEvent) -> bool {
        let (events, keep_listening) = {
            let mut s = self.session();

            if !s.is_current(attempt) {
                debug!(attempt, ?event, "Dropping callback for a finished attempt");
                return false;
            }

            match event {
                EngineEvent::Completed { path } => {
                    let path = path.or_else(|| s.current_path.clone()).unwrap_or_default();
                    info!(attempt_id = %s.attempt_id, path = ?path, "Engine reported completion");

                    let mut events = self.cleanup(&mut s);
                    if self.mark_complete_once() {
                        if !path.as_os_str().is_empty() {
                            s.last_completed_path = Some(path.clone());
                        }
                        events.push(RecordingEvent::Completed(path));
                    }
                    (events, false)
                }
                EngineEvent::Failed { message } => {
                    let message = if message.trim().is_empty() {
                        RECORDING_FAILED.to_string()
                    } else {
                        message
                    };
                    error!(attempt_id = %s.attempt_id, reason = %message, "Engine reported failure");

                    let mut events = self.cleanup(&mut s);
                    if self.mark_complete_once() {
                        events.push(RecordingEvent::Failed(message));
                    }
                    (events, false)
                }
                EngineEvent::StatusChanged(status) => self.on_engine_status(&mut s, status),
            }
        };

        self.observers.notify(&events);
        keep_listening
    }

    fn on_engine_status(
        &self,
        s: &mut RecordingSession,
        status: EngineStatus,
    ) -> (Vec<RecordingEvent>, bool) {
        if status == s.last_status {
            return (Vec::new(), true);
        }

        debug!(attempt_id = %s.attempt_id, ?status, "Engine status");

        match status {
            EngineStatus::Recording => {
                s.last_status = status;
                match s.state {
                    RecordingState::Starting => s.state = RecordingState::Recording,
                    RecordingState::Paused => {
                        s.state = RecordingState::Recording;
                        s.clock.resume();
                    }
                    _ => {}
                }
                (vec![RecordingEvent::StatusChanged(status)], true)
            }
            EngineStatus::Paused => {
                s.last_status = status;
                if s.state == RecordingState::Recording {
                    s.state = RecordingState::Paused;
                    s.clock.pause();
                }
                (vec![RecordingEvent::StatusChanged(status)], true)
            }
            EngineStatus::Finishing => {
                s.last_status = status;
                (vec![RecordingEvent::StatusChanged(status)], true)
            }
            EngineStatus::Idle => {
                let path = s.current_path.clone().filter(|p| p.exists());

                match path {
                    Some(path) => {
                        info!(attempt_id = %s.attempt_id, path = ?path, "Engine went idle, output present");
                        let mut events = self.cleanup(s);
                        if self.mark_complete_once() {
                            s.last_completed_path = Some(path.clone());
                            events.push(RecordingEvent::Completed(path));
                        }
                        (events, false)
                    }
                    // Stopping: the timeout guard is armed and an explicit
                    // callback may still follow.
                    None if s.state == RecordingState::Stopping => {
                        debug!(attempt_id = %s.attempt_id, "Engine idle without output while stopping, waiting");
                        s.last_status = status;
                        (Vec::new(), true)
                    }
                    // Not silently dropped: outside a stop the source is gone
                    // (window closed, display unplugged) and the attempt
                    // fails so observers still get their one terminal
                    // notification.
                    None => {
                        warn!(attempt_id = %s.attempt_id, "Engine went idle without output");
                        let mut events = self.cleanup(s);
                        if self.mark_complete_once() {
                            events.push(RecordingEvent::Failed(STOPPED_UNEXPECTEDLY.to_string()));
                        }
                        (events, false)
                    }
                }
            }
        }
    }

    fn fail_attempt(&self, attempt: u64, message: String) {
        let events = {
            let mut s = self.session();
            if !s.is_current(attempt) {
                return;
            }
            let mut events = self.cleanup(&mut s);
            if self.mark_complete_once() {
                events.push(RecordingEvent::Failed(message));
            }
            events
        };

        self.observers.notify(&events);
    }

    /// Force the session back to idle. Idempotent.
    ///
    /// Closing the worker queue disposes the handle after any engine call
    /// already queued for it.
    fn cleanup(&self, s: &mut RecordingSession) -> Vec<RecordingEvent> {
        let worker = s.worker.take();

        if worker.is_none() && !s.state.is_active() {
            return Vec::new();
        }
        drop(worker);

        let mut events = Vec::new();
        if s.state.is_active() {
            s.state = RecordingState::Idle;
            s.clock.reset();
            events.push(RecordingEvent::StateChanged(false));
            events.push(RecordingEvent::StatusChanged(EngineStatus::Idle));
        }

        s.current_path = None;
        s.last_status = EngineStatus::Idle;
        self.stop_token.fetch_add(1, Ordering::AcqRel);

        debug!(attempt_id = %s.attempt_id, "Recording cleaned up");
        events
    }
}
