//! `global-hotkey` backed registrar.
//!
//! Must be created and used on the thread running the `tao` event loop so
//! that `WM_HOTKEY` messages are pumped on Windows.

use crate::{AppError, AppResult};

use snapburst_core::{CaptureError, Chord, CoreResult, HotkeyRegistrar, Key};

use std::{collections::HashMap, panic::Location};

use error_location::ErrorLocation;
use global_hotkey::{
    GlobalHotKeyManager,
    hotkey::{Code, HotKey, Modifiers},
};
use tracing::{debug, instrument, warn};

/// OS hotkey registrations keyed by dispatcher id.
pub struct GlobalHotkeyRegistrar {
    manager: GlobalHotKeyManager,
    by_id: HashMap<u32, HotKey>,
    native_to_id: HashMap<u32, u32>,
}

impl GlobalHotkeyRegistrar {
    /// Create the platform hotkey manager.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let manager = GlobalHotKeyManager::new().map_err(|e| AppError::HotkeySetupFailed {
            reason: format!("Failed to create manager: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(Self {
            manager,
            by_id: HashMap::new(),
            native_to_id: HashMap::new(),
        })
    }
}

impl HotkeyRegistrar for GlobalHotkeyRegistrar {
    fn register(&mut self, id: u32, chord: &Chord) -> CoreResult<()> {
        let hotkey = to_hotkey(chord).ok_or_else(|| CaptureError::Registration {
            reason: format!("{chord} has no platform key code"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        self.manager
            .register(hotkey)
            .map_err(|e| CaptureError::Registration {
                reason: format!("Failed to register {chord}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(id, native_id = hotkey.id(), %chord, "Global hotkey registered");
        self.native_to_id.insert(hotkey.id(), id);
        self.by_id.insert(id, hotkey);
        Ok(())
    }

    fn unregister(&mut self, id: u32) {
        let Some(hotkey) = self.by_id.remove(&id) else {
            return;
        };
        self.native_to_id.remove(&hotkey.id());

        if let Err(e) = self.manager.unregister(hotkey) {
            warn!(id, error = %e, "Failed to unregister global hotkey");
        }
    }

    fn resolve(&self, native_id: u32) -> Option<u32> {
        self.native_to_id.get(&native_id).copied()
    }
}

/// Platform hotkey for a parsed chord. `None` when the key has no code.
pub fn to_hotkey(chord: &Chord) -> Option<HotKey> {
    let code = to_code(chord.key)?;

    let mut mods = Modifiers::empty();
    let flags = [
        (snapburst_core::Modifiers::CONTROL, Modifiers::CONTROL),
        (snapburst_core::Modifiers::ALT, Modifiers::ALT),
        (snapburst_core::Modifiers::SHIFT, Modifiers::SHIFT),
        (snapburst_core::Modifiers::WIN, Modifiers::SUPER),
    ];
    for (ours, theirs) in flags {
        if chord.modifiers.contains(ours) {
            mods |= theirs;
        }
    }

    let mods = if mods.is_empty() { None } else { Some(mods) };
    Some(HotKey::new(mods, code))
}

fn to_code(key: Key) -> Option<Code> {
    let code = match key {
        Key::Digit(d) => digit_code(d)?,
        Key::Numpad(d) => numpad_code(d)?,
        Key::Letter(c) => letter_code(c)?,
        Key::Function(n) => function_code(n)?,
        Key::Space => Code::Space,
        Key::Enter => Code::Enter,
        Key::Tab => Code::Tab,
        Key::Escape => Code::Escape,
        Key::Backspace => Code::Backspace,
        Key::Delete => Code::Delete,
        Key::Insert => Code::Insert,
        Key::Home => Code::Home,
        Key::End => Code::End,
        Key::PageUp => Code::PageUp,
        Key::PageDown => Code::PageDown,
        Key::Up => Code::ArrowUp,
        Key::Down => Code::ArrowDown,
        Key::Left => Code::ArrowLeft,
        Key::Right => Code::ArrowRight,
        Key::PrintScreen => Code::PrintScreen,
        Key::Pause => Code::Pause,
        Key::Minus => Code::Minus,
        Key::Equal => Code::Equal,
        Key::Comma => Code::Comma,
        Key::Period => Code::Period,
        Key::Slash => Code::Slash,
        Key::Backslash => Code::Backslash,
        Key::Semicolon => Code::Semicolon,
        Key::Quote => Code::Quote,
        Key::Backquote => Code::Backquote,
        Key::BracketLeft => Code::BracketLeft,
        Key::BracketRight => Code::BracketRight,
    };
    Some(code)
}

fn digit_code(d: u8) -> Option<Code> {
    const CODES: [Code; 10] = [
        Code::Digit0,
        Code::Digit1,
        Code::Digit2,
        Code::Digit3,
        Code::Digit4,
        Code::Digit5,
        Code::Digit6,
        Code::Digit7,
        Code::Digit8,
        Code::Digit9,
    ];
    CODES.get(usize::from(d)).copied()
}

fn numpad_code(d: u8) -> Option<Code> {
    const CODES: [Code; 10] = [
        Code::Numpad0,
        Code::Numpad1,
        Code::Numpad2,
        Code::Numpad3,
        Code::Numpad4,
        Code::Numpad5,
        Code::Numpad6,
        Code::Numpad7,
        Code::Numpad8,
        Code::Numpad9,
    ];
    CODES.get(usize::from(d)).copied()
}

fn function_code(n: u8) -> Option<Code> {
    const CODES: [Code; 24] = [
        Code::F1,
        Code::F2,
        Code::F3,
        Code::F4,
        Code::F5,
        Code::F6,
        Code::F7,
        Code::F8,
        Code::F9,
        Code::F10,
        Code::F11,
        Code::F12,
        Code::F13,
        Code::F14,
        Code::F15,
        Code::F16,
        Code::F17,
        Code::F18,
        Code::F19,
        Code::F20,
        Code::F21,
        Code::F22,
        Code::F23,
        Code::F24,
    ];
    usize::from(n)
        .checked_sub(1)
        .and_then(|i| CODES.get(i))
        .copied()
}

fn letter_code(c: char) -> Option<Code> {
    let code = match c.to_ascii_uppercase() {
        'A' => Code::KeyA,
        'B' => Code::KeyB,
        'C' => Code::KeyC,
        'D' => Code::KeyD,
        'E' => Code::KeyE,
        'F' => Code::KeyF,
        'G' => Code::KeyG,
        'H' => Code::KeyH,
        'I' => Code::KeyI,
        'J' => Code::KeyJ,
        'K' => Code::KeyK,
        'L' => Code::KeyL,
        'M' => Code::KeyM,
        'N' => Code::KeyN,
        'O' => Code::KeyO,
        'P' => Code::KeyP,
        'Q' => Code::KeyQ,
        'R' => Code::KeyR,
        'S' => Code::KeyS,
        'T' => Code::KeyT,
        'U' => Code::KeyU,
        'V' => Code::KeyV,
        'W' => Code::KeyW,
        'X' => Code::KeyX,
        'Y' => Code::KeyY,
        'Z' => Code::KeyZ,
        _ => return None,
    };
    Some(code)
}
