use crate::{CoreResult, hotkey::Chord};

/// OS-level global hotkey registration.
///
/// Implementations wrap the platform API. Ids are chosen by the
/// [`HotkeyDispatcher`](crate::HotkeyDispatcher); the registrar only has to
/// remember which native registration belongs to which id.
pub trait HotkeyRegistrar {
    /// Register `chord` under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the OS refuses the combination (already taken by
    /// another process, unsupported key).
    fn register(&mut self, id: u32, chord: &Chord) -> CoreResult<()>;

    /// Release the registration for `id`. Releasing an unknown or already
    /// released id must be a no-op.
    fn unregister(&mut self, id: u32);

    /// Map a native hotkey event id back to the id passed to
    /// [`register`](Self::register). Registrars whose native ids are the
    /// dispatcher ids keep the default.
    fn resolve(&self, native_id: u32) -> Option<u32> {
        Some(native_id)
    }
}
