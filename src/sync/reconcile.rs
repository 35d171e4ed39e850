//! Reiner Diff-Algorithmus zwischen Identity-Mapping und neuem Record-Satz.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::core::DerivedRecord;
use crate::error::SplineSyncError;
use crate::sync::ApplyOutcome;

/// Zuordnung Quell-ID → Derived-ID über Refresh-Zyklen hinweg.
///
/// Gehört exklusiv dem [`crate::sync::SyncController`], lebt fuer dessen
/// Prozess-Lebensdauer und wird nach jedem erfolgreichen Apply als Ganzes
/// ersetzt — nie gemergt. Die IndexMap hält die Einfüge-Reihenfolge stabil,
/// damit Delete-Batches deterministisch ausfallen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityMap {
    entries: IndexMap<u64, u64>,
}

impl IdentityMap {
    /// Erstellt ein leeres Mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Baut ein Mapping aus (Quell-ID, Derived-ID)-Paaren.
    pub fn from_entries(entries: impl IntoIterator<Item = (u64, u64)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Anzahl der Einträge.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Gibt `true` zurück, wenn das Mapping leer ist.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Derived-ID zu einer Quell-ID.
    pub fn derived_id_for(&self, source_id: u64) -> Option<u64> {
        self.entries.get(&source_id).copied()
    }

    /// Quell-ID zu einer Derived-ID (Rückwärts-Suche).
    pub fn source_id_for(&self, derived_id: u64) -> Option<u64> {
        self.entries
            .iter()
            .find(|(_, &did)| did == derived_id)
            .map(|(&sid, _)| sid)
    }

    /// Iteriert über (Quell-ID, Derived-ID) in stabiler Reihenfolge.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.entries.iter().map(|(&sid, &did)| (sid, did))
    }

    /// Baut das Mapping nach einem erfolgreichen Apply von Grund auf neu:
    /// ein Eintrag je Update plus ein Eintrag je Add mit der vom Store
    /// vergebenen ID. Der alte Zustand geht bewusst nicht ein, damit sich
    /// keine veralteten Einträge ansammeln.
    pub fn from_apply(
        batch: &EditBatch,
        outcome: &ApplyOutcome,
    ) -> Result<Self, SplineSyncError> {
        if outcome.assigned_ids.len() != batch.adds.len() {
            return Err(SplineSyncError::sync(format!(
                "Store lieferte {} IDs fuer {} Adds",
                outcome.assigned_ids.len(),
                batch.adds.len()
            )));
        }

        let mut entries = IndexMap::with_capacity(batch.updates.len() + batch.adds.len());
        for (derived_id, record) in &batch.updates {
            entries.insert(record.source_id, *derived_id);
        }
        for (record, &derived_id) in batch.adds.iter().zip(&outcome.assigned_ids) {
            entries.insert(record.source_id, derived_id);
        }

        Ok(Self { entries })
    }
}

/// Minimaler Edit-Batch eines Refresh-Zyklus.
///
/// Wird je Refresh frisch berechnet und genau einmal konsumiert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditBatch {
    /// Neue Records ohne Derived-ID (vergibt der Store beim Apply)
    pub adds: Vec<DerivedRecord>,
    /// Bestehende Records mit ihrer beibehaltenen Derived-ID
    pub updates: Vec<(u64, DerivedRecord)>,
    /// Derived-IDs verschwundener Quell-Records
    pub deletes: Vec<u64>,
}

impl EditBatch {
    /// Gibt `true` zurück, wenn der Batch keine Edits enthält.
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// Vergleicht den neuen Record-Satz mit dem alten Identity-Mapping.
///
/// Ein Durchlauf plus Aufräum-Schritt, O(n):
/// 1. Jeder neue Record wird über seine Quell-ID im alten Mapping gesucht.
///    Treffer beanspruchen ihre Derived-ID (Update), der Rest wird ein Add
///    ohne ID. Jede Derived-ID kann nur einmal beansprucht werden.
/// 2. Alle nicht beanspruchten Mapping-Einträge existieren in der Quelle
///    nicht mehr und werden über ihre alte Derived-ID gelöscht.
pub fn reconcile(old_map: &IdentityMap, new_records: Vec<DerivedRecord>) -> EditBatch {
    let mut claimed: HashSet<u64> = HashSet::with_capacity(new_records.len());
    let mut adds = Vec::new();
    let mut updates = Vec::new();

    for record in new_records {
        match old_map.derived_id_for(record.source_id) {
            Some(derived_id) if !claimed.contains(&record.source_id) => {
                claimed.insert(record.source_id);
                updates.push((derived_id, record));
            }
            _ => adds.push(record),
        }
    }

    // Reihenfolge folgt dem alten Mapping → deterministische Delete-Batches
    let deletes = old_map
        .iter()
        .filter(|(source_id, _)| !claimed.contains(source_id))
        .map(|(_, derived_id)| derived_id)
        .collect();

    EditBatch {
        adds,
        updates,
        deletes,
    }
}
