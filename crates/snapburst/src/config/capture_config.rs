use crate::config::{default_copy_to_clipboard, default_file_name_template, default_save_root};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where and how still captures are saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Root folder; bursts go to `<root>/<date>/<time>/`.
    #[serde(default = "default_save_root")]
    pub save_root: PathBuf,

    /// File name template (`HHmmss_###` or `{date}_{time}_{counter}` style).
    #[serde(default = "default_file_name_template")]
    pub file_name_template: String,

    /// Copy every saved image to the clipboard.
    #[serde(default = "default_copy_to_clipboard")]
    pub copy_to_clipboard: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            save_root: default_save_root(),
            file_name_template: default_file_name_template(),
            copy_to_clipboard: default_copy_to_clipboard(),
        }
    }
}
