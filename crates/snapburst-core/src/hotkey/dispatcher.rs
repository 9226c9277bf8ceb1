//! Global hotkey dispatcher.
//!
//! Turns a set of `action → chord text` bindings into OS registrations and
//! turns OS hotkey messages back into [`HotkeyAction`]s delivered on a single
//! channel. Re-registration always releases the previous set first.

use crate::hotkey::{Chord, HotkeyAction, HotkeyRegistrar};

use std::collections::BTreeMap;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, instrument, warn};

/// Dispatcher ids start at 1 for every binding set.
const FIRST_ID: u32 = 1;

/// Bridges OS hotkey registrations to logical actions.
pub struct HotkeyDispatcher<R: HotkeyRegistrar> {
    registrar: R,
    bindings: BTreeMap<u32, (HotkeyAction, Chord)>,
    next_id: u32,
    subscriber: mpsc::Sender<HotkeyAction>,
}

impl<R: HotkeyRegistrar> HotkeyDispatcher<R> {
    /// Create a dispatcher with no registrations.
    pub fn new(registrar: R, subscriber: mpsc::Sender<HotkeyAction>) -> Self {
        Self {
            registrar,
            bindings: BTreeMap::new(),
            next_id: FIRST_ID,
            subscriber,
        }
    }

    /// Replace the current binding set.
    ///
    /// All previous registrations are released and the id counter reset
    /// before anything new is registered. Empty or unparseable chords and
    /// chords the OS refuses are skipped; the returned count is the number
    /// of live registrations afterwards.
    #[instrument(skip(self, bindings))]
    pub fn register<I, S>(&mut self, bindings: I) -> usize
    where
        I: IntoIterator<Item = (HotkeyAction, S)>,
        S: AsRef<str>,
    {
        self.unregister_all();

        for (action, text) in bindings {
            let text = text.as_ref();
            if text.trim().is_empty() {
                debug!(%action, "No chord configured, skipping");
                continue;
            }

            let chord = match Chord::parse(text) {
                Ok(chord) => chord,
                Err(e) => {
                    warn!(%action, chord = text, error = %e, "Unparseable hotkey, skipping");
                    continue;
                }
            };

            let id = self.next_id;
            self.next_id += 1;

            match self.registrar.register(id, &chord) {
                Ok(()) => {
                    debug!(%action, %chord, id, "Hotkey registered");
                    self.bindings.insert(id, (action, chord));
                }
                Err(e) => {
                    warn!(%action, %chord, error = %e, "Hotkey registration refused, skipping");
                }
            }
        }

        info!(count = self.bindings.len(), "Hotkeys registered");
        self.bindings.len()
    }

    /// Release every registration. Safe to call repeatedly.
    pub fn unregister_all(&mut self) {
        for id in std::mem::take(&mut self.bindings).into_keys() {
            self.registrar.unregister(id);
        }
        self.next_id = FIRST_ID;
    }

    /// Teardown: release everything. Idempotent.
    pub fn dispose(&mut self) {
        self.unregister_all();
    }

    /// Handle an OS hotkey message carrying a dispatcher id.
    ///
    /// Emits exactly one action for a known id and returns `true`; unknown
    /// ids are ignored.
    pub fn dispatch(&self, id: u32) -> bool {
        let Some((action, chord)) = self.bindings.get(&id) else {
            debug!(id, "Ignoring unknown hotkey id");
            return false;
        };

        debug!(%action, %chord, "Hotkey pressed");

        match self.subscriber.try_send(*action) {
            Ok(()) => true,
            Err(TrySendError::Full(action)) => {
                warn!(%action, "Action channel full, dropping hotkey press");
                false
            }
            Err(TrySendError::Closed(action)) => {
                debug!(%action, "Action channel closed, dropping hotkey press");
                false
            }
        }
    }

    /// Handle an OS hotkey message carrying the registrar's native id.
    pub fn dispatch_native(&self, native_id: u32) -> bool {
        match self.registrar.resolve(native_id) {
            Some(id) => self.dispatch(id),
            None => false,
        }
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Chord currently bound to `action`, if any.
    pub fn chord_for(&self, action: HotkeyAction) -> Option<Chord> {
        self.bindings
            .values()
            .find(|(bound, _)| *bound == action)
            .map(|(_, chord)| *chord)
    }

    /// Access the underlying registrar.
    pub fn registrar(&self) -> &R {
        &self.registrar
    }
}

impl<R: HotkeyRegistrar> Drop for HotkeyDispatcher<R> {
    fn drop(&mut self) {
        self.unregister_all();
    }
}
