use std::path::PathBuf;

use chrono::NaiveDateTime;

/// Snapshot of the current burst for the tray tooltip and HUD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurstStatus {
    /// Whether a burst is active.
    pub is_active: bool,
    /// When the current (or implicit) session started.
    pub started_at: NaiveDateTime,
    /// Session folder, once it has been created on disk.
    pub folder: Option<PathBuf>,
    /// Number of paths handed out in this session.
    pub count: u32,
}
