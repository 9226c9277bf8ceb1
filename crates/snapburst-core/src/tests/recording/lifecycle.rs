use crate::{
    EngineStatus, LifecycleOptions, RecordingEvent, RecordingLifecycle, RecordingState,
    STOPPED_UNEXPECTEDLY, ScreenRect, SourceDescriptor,
    tests::support::{EngineCall, EngineScript, MockEngine, wait_until},
};

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use tempfile::TempDir;
use tokio::runtime::Handle;

const WAIT: Duration = Duration::from_secs(2);
const GRACE: Duration = Duration::from_millis(100);

type Events = Arc<Mutex<Vec<RecordingEvent>>>;

fn lifecycle(engine: &MockEngine) -> (RecordingLifecycle<MockEngine>, Events) {
    lifecycle_with_grace(engine, GRACE)
}

fn lifecycle_with_grace(
    engine: &MockEngine,
    stop_grace: Duration,
) -> (RecordingLifecycle<MockEngine>, Events) {
    let options = LifecycleOptions {
        stop_grace,
        ..LifecycleOptions::default()
    };
    let lifecycle = RecordingLifecycle::new(engine.clone(), Handle::current(), options);

    let events: Events = Arc::default();
    let sink = Arc::clone(&events);
    lifecycle.subscribe(move |event| {
        sink.lock().unwrap_or_else(|e| e.into_inner()).push(event.clone());
    });
    (lifecycle, events)
}

#[allow(clippy::unwrap_used)]
fn completed(events: &Events) -> Vec<PathBuf> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            RecordingEvent::Completed(path) => Some(path.clone()),
            _ => None,
        })
        .collect()
}

#[allow(clippy::unwrap_used)]
fn failed(events: &Events) -> Vec<String> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            RecordingEvent::Failed(message) => Some(message.clone()),
            _ => None,
        })
        .collect()
}

#[allow(clippy::unwrap_used)]
fn has(events: &Events, wanted: &RecordingEvent) -> bool {
    events.lock().unwrap().iter().any(|e| e == wanted)
}

async fn started(lifecycle: &RecordingLifecycle<MockEngine>) -> bool {
    wait_until(WAIT, || lifecycle.state() == RecordingState::Recording).await
}

/// WHAT: Start moves through Starting to Recording once the engine accepts
/// WHY: UI must show "recording" only after the engine took the request
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_idle_when_starting_fullscreen_then_recording() {
    // Given: An idle lifecycle
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::default();
    let (lifecycle, events) = lifecycle(&engine);
    let path = temp.path().join("clip.mp4");

    // When: Starting a fullscreen recording
    let accepted = lifecycle.start_fullscreen(path.clone(), true);

    // Then: Engine configured for the virtual screen and state reaches Recording
    assert!(accepted);
    assert!(started(&lifecycle).await);
    let created = engine.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].source, SourceDescriptor::VirtualScreen);
    assert!(created[0].include_audio);
    assert_eq!(engine.count(&EngineCall::Record(path.clone())), 1);
    assert_eq!(lifecycle.current_path(), Some(path));
    assert!(has(&events, &RecordingEvent::StateChanged(true)));
    assert!(has(
        &events,
        &RecordingEvent::StatusChanged(EngineStatus::Recording)
    ));
}

/// WHAT: A second start while recording is rejected
/// WHY: Only one recording may run at a time
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_starting_again_then_rejected() {
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::default();
    let (lifecycle, _events) = lifecycle(&engine);
    assert!(lifecycle.start_fullscreen(temp.path().join("a.mp4"), false));
    assert!(started(&lifecycle).await);

    let second = lifecycle.start_window(7, temp.path().join("b.mp4"), false);

    assert!(!second);
    assert_eq!(engine.created().len(), 1);
    assert_eq!(lifecycle.current_path(), Some(temp.path().join("a.mp4")));
}

/// WHAT: Invalid window ids and empty regions are rejected up front
/// WHY: The engine must never be configured with an impossible source
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_invalid_source_when_starting_then_rejected_without_engine() {
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::default();
    let (lifecycle, _events) = lifecycle(&engine);

    assert!(!lifecycle.start_window(0, temp.path().join("w.mp4"), false));
    assert!(!lifecycle.start_region(
        "DISPLAY1",
        ScreenRect::new(10, 10, 1, 300),
        temp.path().join("r.mp4"),
        false
    ));

    assert!(engine.created().is_empty());
    assert_eq!(lifecycle.state(), RecordingState::Idle);
}

/// WHAT: Region recording passes device name and rectangle to the engine
/// WHY: The engine records relative to one display
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_region_when_starting_then_display_region_source() {
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::default();
    let (lifecycle, _events) = lifecycle(&engine);
    let rect = ScreenRect::new(100, 50, 640, 480);

    assert!(lifecycle.start_region("DISPLAY2", rect, temp.path().join("r.mp4"), false));

    assert_eq!(
        engine.created()[0].source,
        SourceDescriptor::DisplayRegion {
            device_name: "DISPLAY2".to_string(),
            rect,
        }
    );
}

/// WHAT: Completion before the guard fires raises exactly one Completed
/// WHY: The timeout guard must not turn a good recording into a failure
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_engine_completes_when_stopping_then_single_completion() {
    // Given: A recording whose engine finishes promptly on stop
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::scripted(EngineScript {
        complete_on_stop: true,
        ..EngineScript::default()
    });
    let (lifecycle, events) = lifecycle(&engine);
    let path = temp.path().join("done.mp4");
    assert!(lifecycle.start_fullscreen(path.clone(), false));
    assert!(started(&lifecycle).await);

    // When: Stopping and waiting past the grace period
    lifecycle.stop();
    assert!(wait_until(WAIT, || lifecycle.state() == RecordingState::Idle).await);
    tokio::time::sleep(GRACE * 3).await;

    // Then: One completion, no failure, handle disposed once
    assert_eq!(completed(&events), vec![path.clone()]);
    assert!(failed(&events).is_empty());
    assert_eq!(lifecycle.last_completed_path(), Some(path));
    assert!(lifecycle.current_path().is_none());
    assert!(wait_until(WAIT, || engine.count(&EngineCall::Dispose) == 1).await);
    assert!(has(&events, &RecordingEvent::StateChanged(false)));
}

/// WHAT: No engine callback after stop raises exactly one failure
/// WHY: A hung engine must not leave the app stuck in "stopping"
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_silent_engine_when_stop_grace_expires_then_single_failure() {
    // Given: A recording whose engine never reports back
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::default();
    let (lifecycle, events) = lifecycle(&engine);
    assert!(lifecycle.start_fullscreen(temp.path().join("hung.mp4"), false));
    assert!(started(&lifecycle).await);

    // When: Stopping
    lifecycle.stop();
    assert!(lifecycle.is_stopping());

    // Then: After the grace period the attempt is cleaned up with one failure
    assert!(wait_until(WAIT, || lifecycle.state() == RecordingState::Idle).await);
    tokio::time::sleep(GRACE).await;
    assert_eq!(failed(&events), vec![STOPPED_UNEXPECTEDLY.to_string()]);
    assert!(completed(&events).is_empty());

    // When: A late completion arrives
    engine.sink().complete(None);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Then: It is ignored
    assert!(completed(&events).is_empty());
}

/// WHAT: Duplicate completion paths raise one notification
/// WHY: Engines may report both a completion callback and an idle status
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_duplicate_completion_signals_then_single_completion() {
    // Given: A recording whose output file exists
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::default();
    let (lifecycle, events) = lifecycle(&engine);
    let path = temp.path().join("dup.mp4");
    assert!(lifecycle.start_fullscreen(path.clone(), false));
    assert!(started(&lifecycle).await);
    std::fs::write(&path, b"mp4").unwrap();

    // When: The engine reports idle, then completion twice
    let sink = engine.sink();
    sink.status(EngineStatus::Idle);
    sink.complete(Some(path.clone()));
    sink.complete(Some(path.clone()));
    assert!(wait_until(WAIT, || lifecycle.state() == RecordingState::Idle).await);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Then: Exactly one Completed
    assert_eq!(completed(&events), vec![path]);
    assert!(failed(&events).is_empty());
}

/// WHAT: Engine going idle without output while recording is a failure
/// WHY: The capture source vanished (window closed, display unplugged)
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_engine_idles_without_output_then_failure() {
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::default();
    let (lifecycle, events) = lifecycle(&engine);
    assert!(lifecycle.start_fullscreen(temp.path().join("gone.mp4"), false));
    assert!(started(&lifecycle).await);

    engine.sink().status(EngineStatus::Idle);

    assert!(wait_until(WAIT, || lifecycle.state() == RecordingState::Idle).await);
    assert_eq!(failed(&events), vec![STOPPED_UNEXPECTEDLY.to_string()]);
}

/// WHAT: Engine failure message is forwarded once
/// WHY: Users need the engine's reason, not a generic message
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_engine_fails_then_message_forwarded() {
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::default();
    let (lifecycle, events) = lifecycle(&engine);
    assert!(lifecycle.start_fullscreen(temp.path().join("f.mp4"), false));
    assert!(started(&lifecycle).await);

    engine.sink().failed("disk full");
    engine.sink().failed("disk full again");

    assert!(wait_until(WAIT, || lifecycle.state() == RecordingState::Idle).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(failed(&events), vec!["disk full".to_string()]);
}

/// WHAT: A rejected record call rolls back to idle with one failure
/// WHY: A failed start must leave the lifecycle usable
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_record_rejected_when_starting_then_rolled_back() {
    // Given: An engine whose record call fails
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::scripted(EngineScript {
        fail_record: true,
        ..EngineScript::default()
    });
    let (lifecycle, events) = lifecycle(&engine);

    // When: Starting
    assert!(lifecycle.start_fullscreen(temp.path().join("x.mp4"), false));

    // Then: Back to idle with the engine's reason
    assert!(wait_until(WAIT, || !failed(&events).is_empty()).await);
    assert_eq!(lifecycle.state(), RecordingState::Idle);
    assert_eq!(failed(&events), vec!["encoder unavailable".to_string()]);
    assert!(has(&events, &RecordingEvent::StateChanged(false)));
    assert!(wait_until(WAIT, || engine.count(&EngineCall::Dispose) == 1).await);
}

/// WHAT: Engine creation failure is reported without entering Starting
/// WHY: No handle exists to clean up
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_create_fails_when_starting_then_false_and_failure() {
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::scripted(EngineScript {
        fail_create: true,
        ..EngineScript::default()
    });
    let (lifecycle, events) = lifecycle(&engine);

    assert!(!lifecycle.start_fullscreen(temp.path().join("x.mp4"), false));

    assert_eq!(lifecycle.state(), RecordingState::Idle);
    assert_eq!(failed(&events), vec!["no capture device".to_string()]);
    assert!(!has(&events, &RecordingEvent::StateChanged(true)));
}

/// WHAT: An engine stop error fails the attempt immediately
/// WHY: Waiting for the guard would only delay the inevitable
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_stop_rejected_when_stopping_then_single_failure() {
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::scripted(EngineScript {
        fail_stop: true,
        ..EngineScript::default()
    });
    let (lifecycle, events) = lifecycle(&engine);
    assert!(lifecycle.start_fullscreen(temp.path().join("s.mp4"), false));
    assert!(started(&lifecycle).await);

    lifecycle.stop();

    assert!(wait_until(WAIT, || lifecycle.state() == RecordingState::Idle).await);
    tokio::time::sleep(GRACE * 2).await;
    assert_eq!(failed(&events), vec!["stop rejected".to_string()]);
}

/// WHAT: Pause freezes elapsed time and resume continues it
/// WHY: Paused intervals are not part of the recording
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_paused_then_elapsed_frozen_until_resume() {
    // Given: A running recording
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::default();
    let (lifecycle, _events) = lifecycle(&engine);
    assert!(lifecycle.start_fullscreen(temp.path().join("p.mp4"), false));
    assert!(started(&lifecycle).await);
    tokio::time::sleep(Duration::from_millis(20)).await;

    // When: Paused for a while
    lifecycle.pause();
    assert!(lifecycle.is_paused());
    let frozen = lifecycle.elapsed();
    tokio::time::sleep(Duration::from_millis(40)).await;

    // Then: Elapsed did not move and the engine was told
    assert_eq!(lifecycle.elapsed(), frozen);
    assert!(wait_until(WAIT, || engine.count(&EngineCall::Pause) == 1).await);

    // When: Resumed
    lifecycle.resume();
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Then: Recording again and elapsed advances
    assert_eq!(lifecycle.state(), RecordingState::Recording);
    assert!(lifecycle.elapsed() > frozen);
    assert!(wait_until(WAIT, || engine.count(&EngineCall::Resume) == 1).await);
}

/// WHAT: A panicking observer does not starve the others
/// WHY: One faulty UI listener must not break recording notifications
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used, clippy::panic)]
async fn given_panicking_observer_when_notifying_then_others_still_called() {
    // Given: A panicking observer registered before a collecting one
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::default();
    let lifecycle = RecordingLifecycle::new(
        engine.clone(),
        Handle::current(),
        LifecycleOptions::default(),
    );
    lifecycle.subscribe(|_| panic!("observer bug"));
    let events: Events = Arc::default();
    let sink = Arc::clone(&events);
    lifecycle.subscribe(move |event| {
        sink.lock().unwrap().push(event.clone());
    });

    // When: Starting a recording
    assert!(lifecycle.start_fullscreen(temp.path().join("o.mp4"), false));

    // Then: The collecting observer saw the state change
    assert!(has(&events, &RecordingEvent::StateChanged(true)));
    assert!(started(&lifecycle).await);
}

/// WHAT: The last completed recording can be deleted once, never mid-recording
/// WHY: Undo for videos must not touch a file the engine is writing
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_completed_recording_when_deleting_then_removed_once() {
    // Given: A completed recording
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::scripted(EngineScript {
        complete_on_stop: true,
        ..EngineScript::default()
    });
    let (lifecycle, _events) = lifecycle(&engine);
    let path = temp.path().join("del.mp4");
    assert!(lifecycle.start_fullscreen(path.clone(), false));
    assert!(started(&lifecycle).await);
    lifecycle.stop();
    assert!(wait_until(WAIT, || lifecycle.last_completed_path().is_some()).await);
    assert!(path.exists());

    // When: A new recording is running
    assert!(lifecycle.start_fullscreen(temp.path().join("next.mp4"), false));
    assert!(started(&lifecycle).await);

    // Then: Deletion is refused
    assert!(!lifecycle.delete_last_recording());
    lifecycle.stop();
    assert!(wait_until(WAIT, || lifecycle.state() == RecordingState::Idle).await);

    // When: Idle again, deleting the latest completion
    let latest = lifecycle.last_completed_path().unwrap();
    assert!(lifecycle.delete_last_recording());

    // Then: File removed and a second delete finds nothing
    assert!(!latest.exists());
    assert!(!lifecycle.delete_last_recording());
}

/// WHAT: A pause the engine refuses keeps the local Paused state
/// WHY: Pause is best-effort; an engine error is not a recording failure
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_engine_refuses_pause_when_pausing_then_stays_paused_without_failure() {
    // Given: An engine that rejects pause
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::scripted(EngineScript {
        fail_pause: true,
        ..EngineScript::default()
    });
    let (lifecycle, events) = lifecycle(&engine);
    assert!(lifecycle.start_fullscreen(temp.path().join("np.mp4"), false));
    assert!(started(&lifecycle).await);

    // When: Pausing
    lifecycle.pause();

    // Then: The engine was asked, the state stays Paused, nothing failed
    assert!(wait_until(WAIT, || engine.count(&EngineCall::Pause) == 1).await);
    assert_eq!(lifecycle.state(), RecordingState::Paused);
    assert!(lifecycle.is_paused());
    assert!(failed(&events).is_empty());
}

/// WHAT: A stop issued while record is still blocking reaches the engine after it
/// WHY: Stopping and disposing before record returns would leave the engine
/// running with nothing left to stop it
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_slow_record_when_stopping_while_starting_then_engine_calls_stay_ordered() {
    // Given: An engine whose record call takes 300 ms
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::scripted(EngineScript {
        record_delay: Some(Duration::from_millis(300)),
        complete_on_stop: true,
        ..EngineScript::default()
    });
    let (lifecycle, events) = lifecycle_with_grace(&engine, WAIT);
    let path = temp.path().join("slow.mp4");
    assert!(lifecycle.start_fullscreen(path.clone(), false));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(lifecycle.state(), RecordingState::Starting);

    // When: Stopping before record has returned
    lifecycle.stop();
    assert!(lifecycle.is_stopping());

    // Then: Record, stop and dispose run in that order and the video completes
    assert!(wait_until(WAIT, || engine.count(&EngineCall::Dispose) == 1).await);
    assert_eq!(
        engine.calls(),
        vec![EngineCall::Record(path.clone()), EngineCall::Stop, EngineCall::Dispose]
    );
    assert_eq!(lifecycle.state(), RecordingState::Idle);
    assert_eq!(completed(&events), vec![path]);
    assert!(failed(&events).is_empty());
}

/// WHAT: Pause then resume reach the engine in the order they were requested
/// WHY: A resume that overtakes its pause would leave the engine paused
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_recording_when_pausing_and_resuming_quickly_then_engine_sees_same_order() {
    // Given: A running recording
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::default();
    let (lifecycle, _events) = lifecycle(&engine);
    let path = temp.path().join("pr.mp4");
    assert!(lifecycle.start_fullscreen(path.clone(), false));
    assert!(started(&lifecycle).await);

    // When: Pausing and resuming back to back, twice
    lifecycle.pause();
    lifecycle.resume();
    lifecycle.pause();
    lifecycle.resume();

    // Then: The engine saw the calls in request order
    assert!(wait_until(WAIT, || engine.count(&EngineCall::Resume) == 2).await);
    assert_eq!(
        engine.calls(),
        vec![
            EngineCall::Record(path),
            EngineCall::Pause,
            EngineCall::Resume,
            EngineCall::Pause,
            EngineCall::Resume,
        ]
    );
    assert_eq!(lifecycle.state(), RecordingState::Recording);
}

/// WHAT: The guard armed by an earlier stop does nothing to a later recording
/// WHY: A completed stop bumps the stop token; its guard must not kill the
/// next attempt when it fires
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[allow(clippy::unwrap_used)]
async fn given_stale_stop_guard_when_it_fires_during_next_recording_then_ignored() {
    // Given: A first recording stopped and completed well inside the grace period
    let temp = TempDir::new().unwrap();
    let engine = MockEngine::scripted(EngineScript {
        complete_on_stop: true,
        ..EngineScript::default()
    });
    let (lifecycle, events) = lifecycle(&engine);
    let first = temp.path().join("first.mp4");
    assert!(lifecycle.start_fullscreen(first.clone(), false));
    assert!(started(&lifecycle).await);
    lifecycle.stop();
    assert!(wait_until(WAIT, || lifecycle.state() == RecordingState::Idle).await);

    // When: A second recording runs while the first guard expires
    let second = temp.path().join("second.mp4");
    assert!(lifecycle.start_fullscreen(second.clone(), false));
    assert!(started(&lifecycle).await);
    tokio::time::sleep(GRACE * 3).await;

    // Then: The second attempt is untouched
    assert_eq!(lifecycle.state(), RecordingState::Recording);
    assert_eq!(lifecycle.current_path(), Some(second));
    assert!(failed(&events).is_empty());
    assert_eq!(completed(&events), vec![first]);
    assert_eq!(engine.count(&EngineCall::Dispose), 1);
}
