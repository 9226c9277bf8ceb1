/// Tray icon states corresponding to application workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// No burst, no recording.
    Idle,
    /// A burst session is active.
    Burst,
    /// A screen recording is running.
    Recording,
}
