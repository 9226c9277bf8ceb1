use crate::{
    SessionManager, SessionSettings,
    tests::support::ManualClock,
};

use std::{collections::HashSet, fs, path::Path};

use tempfile::TempDir;

fn manager(root: &Path, template: &str) -> (SessionManager<ManualClock>, ManualClock) {
    let clock = ManualClock::at(2024, 1, 1, 14, 30, 0);
    let settings = SessionSettings {
        root: root.to_path_buf(),
        template: template.to_string(),
    };
    (SessionManager::with_clock(settings, clock.clone()), clock)
}

/// WHAT: Consecutive paths are distinct with padded counters
/// WHY: A burst must never overwrite an earlier frame
#[test]
#[allow(clippy::unwrap_used)]
fn given_active_session_when_requesting_paths_then_all_distinct() {
    // Given: An active session
    let temp = TempDir::new().unwrap();
    let (mut session, _clock) = manager(temp.path(), "HHmmss_###");
    session.start_new_session();

    // When: Requesting five paths within the same second
    let paths: Vec<_> = (0..5)
        .map(|_| session.next_file_path(".png").unwrap())
        .collect();

    // Then: All distinct, counters 001..005
    let unique: HashSet<_> = paths.iter().collect();
    assert_eq!(unique.len(), 5);
    assert!(paths[0].ends_with("143000_001.png"));
    assert!(paths[4].ends_with("143000_005.png"));
    assert_eq!(session.counter(), 5);
}

/// WHAT: The session folder is created on first use only
/// WHY: Starting and ending an empty burst must leave no directories behind
#[test]
#[allow(clippy::unwrap_used)]
fn given_new_session_when_no_path_requested_then_folder_not_created() {
    // Given: A freshly started session
    let temp = TempDir::new().unwrap();
    let (mut session, _clock) = manager(temp.path(), "HHmmss_###");
    session.start_new_session();
    let folder = temp.path().join("2024-01-01").join("143000");

    // Then: Nothing on disk yet and last_folder falls back to the root
    assert!(!folder.exists());
    assert_eq!(session.last_folder(), temp.path());
    assert!(session.status().folder.is_none());

    // When: The first path is requested
    let path = session.next_file_path("png").unwrap();

    // Then: Folder exists and is reported
    assert!(folder.is_dir());
    assert_eq!(path.parent().unwrap(), folder);
    assert_eq!(session.last_folder(), folder);
    assert_eq!(session.status().folder, Some(folder));
}

/// WHAT: End-to-end path for a burst started at 14:30:00 and saved at 14:30:01
/// WHY: Documents the folder layout users see on disk. Uses `{time}_{counter}`
/// so the name reads `143001_001`; with `{date}_{time}_{counter}` the same save
/// is named `2024-01-01_143001_001` (next test)
#[test]
#[allow(clippy::unwrap_used)]
fn given_burst_when_saving_one_second_later_then_dated_folder_and_name() {
    // Given: Session started at 2024-01-01 14:30:00
    let temp = TempDir::new().unwrap();
    let (mut session, clock) = manager(temp.path(), "{time}_{counter}");
    session.start_new_session();

    // When: Saving one second later
    clock.advance(chrono::Duration::seconds(1));
    let path = session.next_file_path(".png").unwrap();

    // Then: root/2024-01-01/143000/143001_001.png
    assert_eq!(
        path,
        temp.path()
            .join("2024-01-01")
            .join("143000")
            .join("143001_001.png")
    );
}

/// WHAT: The dated template puts the save date in the file name as well
/// WHY: `{date}` always renders, so the name is not the bare `143001_001`
/// even though the folder already carries the date
#[test]
#[allow(clippy::unwrap_used)]
fn given_dated_template_when_saving_one_second_later_then_date_prefixed_name() {
    // Given: Session started at 2024-01-01 14:30:00 with the dated template
    let temp = TempDir::new().unwrap();
    let (mut session, clock) = manager(temp.path(), "{date}_{time}_{counter}");
    session.start_new_session();

    // When: Saving one second later
    clock.advance(chrono::Duration::seconds(1));
    let path = session.next_file_path(".png").unwrap();

    // Then: root/2024-01-01/143000/2024-01-01_143001_001.png
    assert_eq!(
        path,
        temp.path()
            .join("2024-01-01")
            .join("143000")
            .join("2024-01-01_143001_001.png")
    );
}

/// WHAT: Without an active session paths go to the root
/// WHY: Captures outside a burst still need a home
#[test]
#[allow(clippy::unwrap_used)]
fn given_no_session_when_requesting_path_then_root_used() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("captures");
    let (mut session, _clock) = manager(&root, "HHmmss_###");

    let path = session.next_file_path(".png").unwrap();

    assert!(root.is_dir());
    assert_eq!(path.parent().unwrap(), root);
    assert!(!session.is_active());
}

/// WHAT: Existing files are skipped by advancing the counter
/// WHY: Restarting the app in the same second must not overwrite files
#[test]
#[allow(clippy::unwrap_used)]
fn given_existing_file_when_requesting_path_then_counter_skips_it() {
    // Given: 143000_001.png already exists in the root
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("143000_001.png"), b"old").unwrap();
    let (mut session, _clock) = manager(temp.path(), "HHmmss_###");

    // When: Requesting a path
    let path = session.next_file_path(".png").unwrap();

    // Then: The next free name is used
    assert!(path.ends_with("143000_002.png"));
}

/// WHAT: Undo deletes the most recent file and pops history
/// WHY: Undo is the quick fix for an accidental capture
#[test]
#[allow(clippy::unwrap_used)]
fn given_saved_files_when_undoing_then_latest_deleted() {
    // Given: Two saved files
    let temp = TempDir::new().unwrap();
    let (mut session, _clock) = manager(temp.path(), "HHmmss_###");
    session.start_new_session();
    let first = session.next_file_path(".png").unwrap();
    fs::write(&first, b"1").unwrap();
    session.register_saved(first.clone());
    let second = session.next_file_path(".png").unwrap();
    fs::write(&second, b"2").unwrap();
    session.register_saved(second.clone());

    // When: Undoing once
    let undone = session.undo_last();

    // Then: Only the second file is gone
    assert!(undone);
    assert!(!second.exists());
    assert!(first.exists());
    assert_eq!(session.last_file(), Some(first.as_path()));
}

/// WHAT: Undo on empty history returns false
/// WHY: Nothing to undo is not an error but must be reported
#[test]
#[allow(clippy::unwrap_used)]
fn given_empty_history_when_undoing_then_false() {
    let temp = TempDir::new().unwrap();
    let (mut session, _clock) = manager(temp.path(), "HHmmss_###");

    assert!(!session.undo_last());
}

/// WHAT: Undo of a file already deleted counts as success
/// WHY: The user's intent (file gone) is already satisfied
#[test]
#[allow(clippy::unwrap_used)]
fn given_missing_file_when_undoing_then_true_and_popped() {
    let temp = TempDir::new().unwrap();
    let (mut session, _clock) = manager(temp.path(), "HHmmss_###");
    session.register_saved(temp.path().join("gone.png"));

    assert!(session.undo_last());
    assert_eq!(session.history_len(), 0);
}

/// WHAT: Starting or ending a session clears history and counter
/// WHY: Undo must not reach into a previous burst
#[test]
#[allow(clippy::unwrap_used)]
fn given_history_when_ending_session_then_cleared() {
    let temp = TempDir::new().unwrap();
    let (mut session, _clock) = manager(temp.path(), "HHmmss_###");
    session.start_new_session();
    let path = session.next_file_path(".png").unwrap();
    session.register_saved(path);

    session.end_session();

    assert_eq!(session.history_len(), 0);
    assert_eq!(session.counter(), 0);
    assert_eq!(session.last_folder(), temp.path());
}

/// WHAT: Starting and ending sessions each bump the generation
/// WHY: Late results are matched against the session they were started in
#[test]
#[allow(clippy::unwrap_used)]
fn given_session_changes_when_reading_generation_then_strictly_increasing() {
    let temp = TempDir::new().unwrap();
    let (mut session, _clock) = manager(temp.path(), "HHmmss_###");
    let initial = session.generation();

    session.start_new_session();
    let started = session.generation();
    session.end_session();
    let ended = session.generation();

    assert!(started > initial);
    assert!(ended > started);
}
