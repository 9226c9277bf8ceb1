//! Burst session tracking, output path generation and undo history.

use crate::{
    CaptureError, CoreResult,
    session::{BurstStatus, Clock, FileNameTemplate, SystemClock},
};

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument, warn};

/// The part of the configuration the session manager consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Root directory for all captures.
    pub root: PathBuf,
    /// File name template, see [`FileNameTemplate`].
    pub template: String,
}

/// Tracks the current burst, hands out collision-free output paths and
/// remembers saved files for undo.
///
/// A session manager starts with an implicit, inactive session whose files
/// go straight into the root directory. [`start_new_session`] switches to a
/// dated session folder, [`end_session`] switches back.
///
/// [`start_new_session`]: SessionManager::start_new_session
/// [`end_session`]: SessionManager::end_session
pub struct SessionManager<C: Clock = SystemClock> {
    clock: C,
    root: PathBuf,
    template: FileNameTemplate,
    history: Vec<PathBuf>,
    counter: u32,
    start_time: NaiveDateTime,
    folder: Option<PathBuf>,
    folder_created: bool,
    active: bool,
    generation: u64,
}

impl SessionManager<SystemClock> {
    /// Create a session manager using local system time.
    pub fn new(settings: SessionSettings) -> Self {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> SessionManager<C> {
    /// Create a session manager reading time from `clock`.
    pub fn with_clock(settings: SessionSettings, clock: C) -> Self {
        let start_time = clock.now();
        Self {
            clock,
            root: settings.root,
            template: FileNameTemplate::new(settings.template),
            history: Vec::new(),
            counter: 0,
            start_time,
            folder: None,
            folder_created: false,
            active: false,
            generation: 0,
        }
    }

    /// Apply new settings. An active session keeps its folder; the new root
    /// is used from the next session on.
    pub fn apply_settings(&mut self, settings: SessionSettings) {
        self.root = settings.root;
        self.template = FileNameTemplate::new(settings.template);
        debug!(root = ?self.root, template = self.template.as_str(), "Session settings applied");
    }

    /// Begin a new burst: counter reset, history cleared, folder computed
    /// as `root/<date>/<time>` of the start time but not created yet.
    #[instrument(skip(self))]
    pub fn start_new_session(&mut self) {
        self.counter = 0;
        self.history.clear();
        self.start_time = self.clock.now();
        self.folder = Some(
            self.root
                .join(self.start_time.format("%Y-%m-%d").to_string())
                .join(self.start_time.format("%H%M%S").to_string()),
        );
        self.folder_created = false;
        self.active = true;
        self.generation += 1;

        info!(folder = ?self.folder, "Burst started");
    }

    /// End the current burst. Later paths go to the root directory.
    #[instrument(skip(self))]
    pub fn end_session(&mut self) {
        let was_active = self.active;
        self.counter = 0;
        self.history.clear();
        self.folder = None;
        self.folder_created = false;
        self.active = false;
        self.generation += 1;

        if was_active {
            info!("Burst ended");
        }
    }

    /// Next free output path with `extension` (leading dot optional).
    ///
    /// Creates the session folder on first use, or the root directory when no
    /// session is active. The counter always advances; if a file with the
    /// rendered name already exists it keeps advancing until the name is free.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Io`] when the target directory cannot be created.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn next_file_path(&mut self, extension: &str) -> CoreResult<PathBuf> {
        let target = self.ensure_target_dir()?;
        let now = self.clock.now();
        let extension = normalize_extension(extension);

        loop {
            self.counter += 1;
            let name = self.template.render(now, self.counter);
            let path = target.join(format!("{name}{extension}"));

            if !path.exists() {
                debug!(path = ?path, counter = self.counter, "Next file path");
                return Ok(path);
            }

            debug!(path = ?path, "Path already taken, advancing counter");
        }
    }

    /// Remember a file that was written for this session.
    pub fn register_saved(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!(path = ?path, depth = self.history.len() + 1, "Saved file registered");
        self.history.push(path);
    }

    /// Delete the most recently saved file and forget it.
    ///
    /// Returns `false` on empty history or when deletion fails. A file that
    /// no longer exists counts as undone. The entry is popped either way.
    #[instrument(skip(self))]
    pub fn undo_last(&mut self) -> bool {
        let Some(path) = self.history.pop() else {
            debug!("Nothing to undo");
            return false;
        };

        if !path.exists() {
            info!(path = ?path, "Undo: file already gone");
            return true;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = ?path, "Undo: file deleted");
                true
            }
            Err(e) => {
                warn!(path = ?path, error = ?e, "Undo: failed to delete file");
                false
            }
        }
    }

    /// Most recently saved file, if any.
    pub fn last_file(&self) -> Option<&Path> {
        self.history.last().map(PathBuf::as_path)
    }

    /// Folder holding the latest captures: the session folder once it
    /// exists, the root otherwise.
    pub fn last_folder(&self) -> &Path {
        match (&self.folder, self.active && self.folder_created) {
            (Some(folder), true) => folder.as_path(),
            _ => self.root.as_path(),
        }
    }

    /// Snapshot for display.
    pub fn status(&self) -> BurstStatus {
        BurstStatus {
            is_active: self.active,
            started_at: self.start_time,
            folder: self
                .folder
                .as_ref()
                .filter(|_| self.folder_created)
                .cloned(),
            count: self.counter,
        }
    }

    /// Bumped whenever a session starts or ends. History entries only
    /// belong to the generation they were produced in.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a burst is active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Counter value of the last path handed out.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Number of undoable entries.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Configured root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[track_caller]
    fn ensure_target_dir(&mut self) -> CoreResult<PathBuf> {
        let target = match (&self.folder, self.active) {
            (Some(folder), true) => folder.clone(),
            _ => self.root.clone(),
        };

        if self.active && self.folder_created {
            return Ok(target);
        }

        if !target.exists() {
            fs::create_dir_all(&target).map_err(|e| CaptureError::io(&target, e))?;
            debug!(dir = ?target, "Created capture directory");
        }

        if self.active {
            self.folder_created = true;
        }

        Ok(target)
    }
}

fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim();
    if trimmed.is_empty() || trimmed.starts_with('.') {
        trimmed.to_string()
    } else {
        format!(".{trimmed}")
    }
}
