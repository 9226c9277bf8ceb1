mod action;
mod chord;
mod dispatcher;
mod registrar;

pub use {
    action::HotkeyAction,
    chord::{Chord, Key, Modifiers},
    dispatcher::HotkeyDispatcher,
    registrar::HotkeyRegistrar,
};
