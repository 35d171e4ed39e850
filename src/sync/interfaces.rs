//! Schmale Trait-Schnittstellen zu den externen Kollaborateuren.
//!
//! Die Synchronisation besitzt weder Wire-Protokoll noch Dateiformat —
//! sie konsumiert ausschließlich die hier definierten Fähigkeiten einer
//! Linien-Quelle und eines Ziel-Stores.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::core::{GeometryKind, LineRecord};
use crate::error::SplineSyncError;
use crate::sync::EditBatch;

/// Monoton steigendes Änderungssignal.
///
/// Ersetzt Framework-verwaltete Reaktivität durch ein explizites Objekt:
/// Quellen erhöhen beim Bearbeiten den Generationszähler, der Controller
/// vergleicht Generationen beim Tick. Klonen ist billig (geteilter Zähler).
#[derive(Debug, Clone, Default)]
pub struct ChangeSignal(Arc<AtomicU64>);

impl ChangeSignal {
    /// Erstellt ein Signal mit Generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Meldet eine Änderung (erhöht die Generation um 1).
    pub fn raise(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Aktuelle Generation.
    pub fn generation(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Handle eines aktiven Abonnements (für explizites Abbestellen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Ready-Zustand einer geladenen Quelle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    /// Geometrie-Typ der Quelle; nur [`GeometryKind::Polyline`] ist zulässig
    pub geometry_kind: GeometryKind,
}

/// Fähigkeiten der Linien-Quelle.
pub trait LineSource {
    /// Lädt die Quelle und liefert ihren Ready-Zustand.
    fn load(&self) -> Result<SourceInfo, SplineSyncError>;

    /// Alle aktuellen Quell-Records in stabiler Reihenfolge.
    fn query_all(&self) -> Result<Vec<LineRecord>, SplineSyncError>;

    /// Einzelner Quell-Record; `SourceNotFound` wenn die ID fehlt.
    fn query_by_id(&self, id: u64) -> Result<LineRecord, SplineSyncError>;

    /// Registriert ein Änderungssignal; die Quelle ruft bei jeder Bearbeitung
    /// [`ChangeSignal::raise`] auf.
    fn subscribe(&self, signal: ChangeSignal) -> SubscriptionId;

    /// Bestellt ein zuvor registriertes Abonnement ab.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Ergebnis eines angewendeten Edit-Batches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Vom Store vergebene Derived-IDs, parallel zu `batch.adds`
    pub assigned_ids: Vec<u64>,
}

/// Fähigkeiten des Ziel-Stores fuer abgeleitete Records.
pub trait TargetStore {
    /// Wendet einen Edit-Batch atomar an und vergibt IDs fuer alle Adds.
    ///
    /// Schlägt mit `Sync` fehl, wenn der Store den Batch ablehnt; bereits
    /// angewendete Teile werden von diesem Kern nicht zurückgerollt.
    fn apply_edits(&self, batch: &EditBatch) -> Result<ApplyOutcome, SplineSyncError>;
}
