//! Einmal zuweisbare Ready-Zelle fuer den Attach-Abschluss.

use std::sync::OnceLock;

use crate::error::SplineSyncError;

/// Single-Assignment-Zelle: wird bei der Konstruktion des Controllers
/// angelegt, genau einmal erfüllt oder abgelehnt und ist fuer Aufrufer
/// read-only.
///
/// Ersetzt das Paar aus mutierbaren Resolve-/Reject-Callbacks, mit dem das
/// Ready-Future sonst emuliert würde.
#[derive(Debug, Default)]
pub struct ReadyCell {
    slot: OnceLock<Result<(), SplineSyncError>>,
}

impl ReadyCell {
    /// Erstellt eine unerfüllte Zelle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Erfüllt die Zelle. Nach dem ersten Setzen ein No-op.
    pub(crate) fn fulfill(&self) {
        let _ = self.slot.set(Ok(()));
    }

    /// Lehnt die Zelle mit einem Fehler ab. Nach dem ersten Setzen ein No-op.
    pub(crate) fn reject(&self, error: SplineSyncError) {
        let _ = self.slot.set(Err(error));
    }

    /// Aktueller Zustand: `None` solange unerfüllt.
    pub fn get(&self) -> Option<&Result<(), SplineSyncError>> {
        self.slot.get()
    }

    /// Gibt `true` zurück, wenn die Zelle erfolgreich erfüllt wurde.
    pub fn is_ready(&self) -> bool {
        matches!(self.slot.get(), Some(Ok(())))
    }
}
