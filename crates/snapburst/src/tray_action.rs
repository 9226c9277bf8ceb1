use tray_icon::menu::MenuId;

/// Tray menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    /// Start a new burst.
    NewBurst,
    /// End the current burst.
    EndBurst,
    /// Copy the last saved image to the clipboard.
    CopyLast,
    /// Open the folder of the latest captures.
    OpenLastFolder,
    /// Delete the last saved file.
    UndoLast,
    /// Start a fullscreen recording, or stop the running one.
    ToggleVideo,
    /// Pause or resume the running recording.
    PauseResume,
    /// Open the configuration file.
    OpenSettings,
    /// Re-read the configuration file.
    ReloadSettings,
    /// Quit.
    Exit,
}

/// Menu ids of the tray entries, cloneable across threads.
#[derive(Debug, Clone)]
pub struct TrayMenuIds {
    pub(crate) entries: Vec<(MenuId, TrayAction)>,
}

impl TrayMenuIds {
    /// Action for a clicked menu id.
    pub fn action(&self, id: &MenuId) -> Option<TrayAction> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == id)
            .map(|(_, action)| *action)
    }
}
