//! Fehler-Taxonomie der Bibliothek.
//!
//! Alle Varianten sind `Clone`, damit die einmal gesetzte Ready-Zelle
//! ([`crate::sync::ReadyCell`]) den gespeicherten Fehler beliebig oft
//! herausgeben kann.

use thiserror::Error;

/// Fehlerklassen der Spline-Synchronisation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplineSyncError {
    /// Quell-Geometrie hat den falschen Typ oder ist fehlerhaft aufgebaut.
    #[error("Validierung fehlgeschlagen: {0}")]
    Validation(String),

    /// Versuch, eine bereits zugewiesene Quelle durch eine andere zu ersetzen.
    #[error("Konfigurationsfehler: {0}")]
    Configuration(String),

    /// Lookup eines abgeleiteten Records ohne Treffer.
    #[error("Kein Record mit Derived-ID {0}")]
    DerivedNotFound(u64),

    /// Lookup eines Quell-Records ohne Treffer.
    #[error("Kein Quell-Record mit ID {0}")]
    SourceNotFound(u64),

    /// Der Ziel-Store hat einen Edit-Batch abgelehnt.
    #[error("Edit-Batch abgelehnt: {0}")]
    Sync(String),

    /// Die Linien-Quelle konnte nicht geladen werden.
    #[error("Quelle konnte nicht geladen werden: {0}")]
    Load(String),
}

impl SplineSyncError {
    /// Kurzform fuer `Validation` mit formatierter Nachricht.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Kurzform fuer `Configuration` mit formatierter Nachricht.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Kurzform fuer `Sync` mit formatierter Nachricht.
    pub fn sync(msg: impl Into<String>) -> Self {
        Self::Sync(msg.into())
    }

    /// Kurzform fuer `Load` mit formatierter Nachricht.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }
}
