//! Hotkey chord parsing.
//!
//! A chord is written `Mod+Mod+...+Key`: any number of modifiers from
//! {Ctrl, Shift, Alt, Win} in any order plus exactly one key, either a single
//! decimal digit or a named key. Tokens are trimmed and case-insensitive.

use crate::{CaptureError, CoreResult};

use std::{fmt, ops::BitOr, panic::Location, str::FromStr};

use error_location::ErrorLocation;

/// Modifier bitset. Bit values follow the Win32 `MOD_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Modifiers(u8);

impl Modifiers {
    /// No modifier held.
    pub const NONE: Modifiers = Modifiers(0);
    /// Alt / Option.
    pub const ALT: Modifiers = Modifiers(0x1);
    /// Control.
    pub const CONTROL: Modifiers = Modifiers(0x2);
    /// Shift.
    pub const SHIFT: Modifiers = Modifiers(0x4);
    /// Windows / Super / Command.
    pub const WIN: Modifiers = Modifiers(0x8);

    /// Raw bit representation.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set in `self`.
    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no modifier is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

/// Terminal key of a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Top-row digit `0`-`9`.
    Digit(u8),
    /// Letter `A`-`Z`, stored uppercase.
    Letter(char),
    /// Function key `F1`-`F24`.
    Function(u8),
    /// Numeric keypad digit `0`-`9`.
    Numpad(u8),
    /// Space bar.
    Space,
    /// Enter / Return.
    Enter,
    /// Tab.
    Tab,
    /// Escape.
    Escape,
    /// Backspace.
    Backspace,
    /// Delete.
    Delete,
    /// Insert.
    Insert,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Print screen.
    PrintScreen,
    /// Pause / Break.
    Pause,
    /// `-`
    Minus,
    /// `=`
    Equal,
    /// `,`
    Comma,
    /// `.`
    Period,
    /// `/`
    Slash,
    /// `\`
    Backslash,
    /// `;`
    Semicolon,
    /// `'`
    Quote,
    /// `` ` ``
    Backquote,
    /// `[`
    BracketLeft,
    /// `]`
    BracketRight,
}

impl Key {
    /// Parse a single key token. Returns `None` for unknown names.
    pub fn from_token(token: &str) -> Option<Key> {
        let lower = token.to_ascii_lowercase();
        let bytes = lower.as_bytes();

        if bytes.len() == 1 {
            let c = bytes[0];
            if c.is_ascii_digit() {
                return Some(Key::Digit(c - b'0'));
            }
            if c.is_ascii_lowercase() {
                return Some(Key::Letter(char::from(c.to_ascii_uppercase())));
            }
        }

        // WPF-style digit names ("D1") and keypad names ("NumPad1").
        if bytes.len() == 2 && bytes[0] == b'd' && bytes[1].is_ascii_digit() {
            return Some(Key::Digit(bytes[1] - b'0'));
        }
        if let Some(rest) = lower.strip_prefix("numpad") {
            if rest.len() == 1 && rest.as_bytes()[0].is_ascii_digit() {
                return Some(Key::Numpad(rest.as_bytes()[0] - b'0'));
            }
            return None;
        }
        if let Some(rest) = lower.strip_prefix('f') {
            if let Ok(n) = rest.parse::<u8>() {
                if (1..=24).contains(&n) && !rest.starts_with('0') {
                    return Some(Key::Function(n));
                }
            }
        }

        let key = match lower.as_str() {
            "space" => Key::Space,
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "esc" | "escape" => Key::Escape,
            "backspace" | "back" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "insert" | "ins" => Key::Insert,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" | "pgup" | "prior" => Key::PageUp,
            "pagedown" | "pgdn" | "next" => Key::PageDown,
            "up" => Key::Up,
            "down" => Key::Down,
            "left" => Key::Left,
            "right" => Key::Right,
            "printscreen" | "prtsc" | "print" | "snapshot" => Key::PrintScreen,
            "pause" => Key::Pause,
            "minus" | "oemminus" | "-" => Key::Minus,
            "equal" | "oemplus" | "=" => Key::Equal,
            "comma" | "oemcomma" | "," => Key::Comma,
            "period" | "oemperiod" | "." => Key::Period,
            "slash" | "oemquestion" | "/" => Key::Slash,
            "backslash" | "oem5" | "\\" => Key::Backslash,
            "semicolon" | "oem1" | ";" => Key::Semicolon,
            "quote" | "oemquotes" | "'" => Key::Quote,
            "backquote" | "oem3" | "`" => Key::Backquote,
            "bracketleft" | "oemopenbrackets" | "[" => Key::BracketLeft,
            "bracketright" | "oem6" | "]" => Key::BracketRight,
            _ => return None,
        };

        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Digit(d) => write!(f, "{d}"),
            Key::Letter(c) => write!(f, "{c}"),
            Key::Function(n) => write!(f, "F{n}"),
            Key::Numpad(d) => write!(f, "NumPad{d}"),
            other => {
                let name = match other {
                    Key::Space => "Space",
                    Key::Enter => "Enter",
                    Key::Tab => "Tab",
                    Key::Escape => "Escape",
                    Key::Backspace => "Backspace",
                    Key::Delete => "Delete",
                    Key::Insert => "Insert",
                    Key::Home => "Home",
                    Key::End => "End",
                    Key::PageUp => "PageUp",
                    Key::PageDown => "PageDown",
                    Key::Up => "Up",
                    Key::Down => "Down",
                    Key::Left => "Left",
                    Key::Right => "Right",
                    Key::PrintScreen => "PrintScreen",
                    Key::Pause => "Pause",
                    Key::Minus => "Minus",
                    Key::Equal => "Equal",
                    Key::Comma => "Comma",
                    Key::Period => "Period",
                    Key::Slash => "Slash",
                    Key::Backslash => "Backslash",
                    Key::Semicolon => "Semicolon",
                    Key::Quote => "Quote",
                    Key::Backquote => "Backquote",
                    Key::BracketLeft => "BracketLeft",
                    Key::BracketRight => "BracketRight",
                    Key::Digit(_) | Key::Letter(_) | Key::Function(_) | Key::Numpad(_) => "",
                };
                f.write_str(name)
            }
        }
    }
}

/// A parsed key combination: modifiers plus one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    /// Held modifiers.
    pub modifiers: Modifiers,
    /// Terminal key.
    pub key: Key,
}

impl Chord {
    /// Create a chord from its parts.
    pub fn new(modifiers: Modifiers, key: Key) -> Self {
        Self { modifiers, key }
    }

    /// Parse chord text such as `"Ctrl+Shift+R"`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::InvalidChord`] for empty text, unknown tokens,
    /// a missing key, or more than one key.
    #[track_caller]
    pub fn parse(text: &str) -> CoreResult<Self> {
        let invalid = |reason: &str| CaptureError::InvalidChord {
            chord: text.to_string(),
            reason: reason.to_string(),
            location: ErrorLocation::from(Location::caller()),
        };

        let mut modifiers = Modifiers::NONE;
        let mut key = None;
        let mut saw_token = false;

        for part in text.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            saw_token = true;
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers = modifiers | Modifiers::CONTROL,
                "shift" => modifiers = modifiers | Modifiers::SHIFT,
                "alt" | "option" => modifiers = modifiers | Modifiers::ALT,
                "win" | "windows" | "super" | "meta" | "cmd" | "command" => {
                    modifiers = modifiers | Modifiers::WIN
                }
                _ => {
                    let parsed = Key::from_token(part).ok_or_else(|| invalid("unknown key"))?;
                    if key.replace(parsed).is_some() {
                        return Err(invalid("more than one key"));
                    }
                }
            }
        }

        if !saw_token {
            return Err(invalid("empty chord"));
        }

        let key = key.ok_or_else(|| invalid("no key"))?;
        Ok(Self { modifiers, key })
    }
}

impl FromStr for Chord {
    type Err = CaptureError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Chord::parse(s)
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Modifiers::CONTROL, "Ctrl"),
            (Modifiers::ALT, "Alt"),
            (Modifiers::SHIFT, "Shift"),
            (Modifiers::WIN, "Win"),
        ];
        for (flag, name) in names {
            if self.modifiers.contains(flag) {
                write!(f, "{name}+")?;
            }
        }
        write!(f, "{}", self.key)
    }
}
