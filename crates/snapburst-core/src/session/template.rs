//! File name templates.
//!
//! Two dialects are accepted and may be mixed:
//!
//! | legacy   | placeholder | renders as                    |
//! |----------|-------------|-------------------------------|
//! | `HHmmss` | `{time}`    | save time, `143001`           |
//! |          | `{date}`    | save date, `2024-01-01`       |
//! | `###`    | `{counter}` | session counter, at least 3 digits |
//!
//! A template without any counter token gets `_<counter>` appended so names
//! stay unique within a session.

use chrono::NaiveDateTime;

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = "HHmmss_###";

const LEGACY_TIME: &str = "HHmmss";
const LEGACY_COUNTER: &str = "###";
const DATE: &str = "{date}";
const TIME: &str = "{time}";
const COUNTER: &str = "{counter}";

/// A parsed file name template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameTemplate {
    text: String,
}

impl FileNameTemplate {
    /// Wrap template text. Blank text falls back to [`DEFAULT_TEMPLATE`].
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let text = if text.trim().is_empty() {
            DEFAULT_TEMPLATE.to_string()
        } else {
            text.trim().to_string()
        };
        Self { text }
    }

    /// Template text as configured.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether the template carries its own counter token.
    pub fn has_counter(&self) -> bool {
        self.text.contains(LEGACY_COUNTER) || self.text.contains(COUNTER)
    }

    /// Render a file name (without extension) for `at` and `counter`.
    pub fn render(&self, at: NaiveDateTime, counter: u32) -> String {
        let date = at.format("%Y-%m-%d").to_string();
        let time = at.format("%H%M%S").to_string();
        let count = format!("{counter:03}");

        let mut name = self
            .text
            .replace(DATE, &date)
            .replace(TIME, &time)
            .replace(COUNTER, &count)
            .replace(LEGACY_TIME, &time)
            .replace(LEGACY_COUNTER, &count);

        if !self.has_counter() {
            name.push('_');
            name.push_str(&count);
        }

        sanitize(&name)
    }
}

impl Default for FileNameTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

/// Replace characters that cannot appear in a file name on any desktop OS.
/// Path separators are included so a template can never leave its folder.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
