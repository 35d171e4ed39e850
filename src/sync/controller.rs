//! Orchestrierung: Laden, Abfragen, Spline-Ableitung, Reconciliation, Apply.

use std::sync::Arc;
use std::time::Instant;

use crate::core::{DerivedRecord, GeometryKind, LineRecord};
use crate::error::SplineSyncError;
use crate::geometry::{DistanceMetric, Spline, MIN_SPLINE_POINTS};
use crate::shared::SyncOptions;
use crate::sync::{
    reconcile, ChangeSignal, IdentityMap, LineSource, ReadyCell, RefreshScheduler, SubscriptionId,
    TargetStore,
};

/// Zustand des Controllers.
///
/// `Failed` ist terminal, solange nicht dieselbe Quelle erneut
/// zugewiesen wird.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Noch keine Quelle zugewiesen
    Uninitialized,
    /// Quelle wird geladen und validiert
    Loading,
    /// Synchronisiert, wartet auf Änderungen
    Ready,
    /// Ein Refresh-Zyklus läuft
    Refreshing,
    /// Initiales Laden fehlgeschlagen
    Failed,
}

/// Hält einen abgeleiteten Record-Satz synchron zu einer Linien-Quelle.
///
/// Ein Controller besitzt genau ein Identity-Mapping und treibt pro
/// Refresh-Zyklus: query → Spline-Ableitung je Record → Reconciliation →
/// Apply im Ziel-Store → Mapping-Neuaufbau. Es läuft höchstens ein Refresh
/// gleichzeitig (Single-Flight); Änderungssignale während eines Laufs
/// kollabieren zu genau einem Folge-Lauf.
///
/// Der Host pumpt [`SyncController::tick`] (z.B. je Frame oder Timer-Event)
/// und reicht dabei den aktuellen Zeitpunkt herein.
pub struct SyncController {
    options: SyncOptions,
    metric: Box<dyn DistanceMetric>,
    store: Box<dyn TargetStore>,
    source: Option<Arc<dyn LineSource>>,
    subscription: Option<SubscriptionId>,
    signal: ChangeSignal,
    seen_generation: u64,
    scheduler: RefreshScheduler,
    identity: IdentityMap,
    ready: ReadyCell,
    state: ControllerState,
}

impl SyncController {
    /// Erstellt einen Controller ohne Quelle.
    pub fn new(
        store: Box<dyn TargetStore>,
        metric: Box<dyn DistanceMetric>,
        options: SyncOptions,
    ) -> Self {
        let scheduler = RefreshScheduler::new(options.coalesce_window());
        Self {
            options,
            metric,
            store,
            source: None,
            subscription: None,
            signal: ChangeSignal::new(),
            seen_generation: 0,
            scheduler,
            identity: IdentityMap::new(),
            ready: ReadyCell::new(),
            state: ControllerState::Uninitialized,
        }
    }

    /// Aktueller Zustand.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Ready-Zelle: `None` bis das initiale Laden abgeschlossen ist.
    pub fn ready(&self) -> Option<&Result<(), SplineSyncError>> {
        self.ready.get()
    }

    /// Identity-Mapping des letzten erfolgreichen Zyklus (read-only).
    pub fn identity_map(&self) -> &IdentityMap {
        &self.identity
    }

    /// Weist die Linien-Quelle zu und stößt das initiale Laden an.
    ///
    /// Eine bereits zugewiesene, *andere* Quelle kann nicht ersetzt werden
    /// (`Configuration`-Fehler). Dieselbe Quelle erneut zuzuweisen ist ein
    /// No-op — außer aus `Failed`, dann wird das Laden wiederholt.
    pub fn attach(&mut self, source: Arc<dyn LineSource>) -> Result<(), SplineSyncError> {
        if let Some(existing) = &self.source {
            if !Arc::ptr_eq(existing, &source) {
                return Err(SplineSyncError::configuration(
                    "Quelle kann nach der Zuweisung nicht mehr ersetzt werden",
                ));
            }
            if self.state != ControllerState::Failed {
                return Ok(());
            }
        }

        self.source = Some(Arc::clone(&source));
        self.state = ControllerState::Loading;
        log::info!("Lade Linien-Quelle");

        let info = match source.load() {
            Ok(info) => info,
            Err(e) => {
                log::warn!("Laden der Quelle fehlgeschlagen: {}", e);
                self.state = ControllerState::Failed;
                return Err(e);
            }
        };

        if info.geometry_kind != GeometryKind::Polyline {
            let error = SplineSyncError::validation(format!(
                "Quelle muss Polyline-Geometrie liefern, hat aber {:?}",
                info.geometry_kind
            ));
            // Validierungsfehler besiegeln die Ready-Zelle endgültig
            self.ready.reject(error.clone());
            self.state = ControllerState::Failed;
            return Err(error);
        }

        if self.subscription.is_none() {
            self.subscription = Some(source.subscribe(self.signal.clone()));
        }
        self.ready.fulfill();
        self.state = ControllerState::Ready;

        self.refresh()
    }

    /// Meldet eine externe Änderung der Quelle.
    ///
    /// Bursts kollabieren über das Koaleszierungsfenster zu einem Lauf;
    /// während eines laufenden Refresh gesetzte Signale führen zu genau
    /// einem nachlaufenden Refresh.
    pub fn notify_changed(&self) {
        self.signal.raise();
    }

    /// Treibt Debouncing und fällige Refreshes.
    ///
    /// Gibt `true` zurück, wenn ein Refresh ausgeführt wurde. Fehler des
    /// Refreshs werden geloggt und zurückgegeben; das Identity-Mapping
    /// bleibt dann unangetastet.
    pub fn tick(&mut self, now: Instant) -> Result<bool, SplineSyncError> {
        let generation = self.signal.generation();
        if generation != self.seen_generation {
            self.seen_generation = generation;
            self.scheduler.signal(now);
        }

        if self.state != ControllerState::Ready || !self.scheduler.take_due(now) {
            return Ok(false);
        }

        self.refresh().map(|_| true)
    }

    /// Stößt einen Refresh sofort an, am Debouncer vorbei.
    pub fn trigger_refresh(&mut self) -> Result<(), SplineSyncError> {
        if !self.ready.is_ready() {
            return Err(SplineSyncError::configuration(
                "Quelle ist nicht geladen, Refresh nicht möglich",
            ));
        }
        self.refresh()
    }

    /// Quell-Record zu einer Derived-ID (Rückwärts-Suche über das Mapping,
    /// dann Abfrage der Quelle).
    pub fn source_record_for(&self, derived_id: u64) -> Result<LineRecord, SplineSyncError> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| SplineSyncError::configuration("Keine Quelle zugewiesen"))?;
        let source_id = self
            .identity
            .source_id_for(derived_id)
            .ok_or(SplineSyncError::DerivedNotFound(derived_id))?;
        source.query_by_id(source_id)
    }

    /// Ein vollständiger Refresh-Zyklus.
    ///
    /// Läuft synchron bis zum Ende durch; die I/O-Aufrufe (`query_all`,
    /// `apply_edits`) sind die einzigen Suspensionspunkte und gelten fuer
    /// die Zustandsmaschine als atomar.
    fn refresh(&mut self) -> Result<(), SplineSyncError> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| SplineSyncError::configuration("Keine Quelle zugewiesen"))?;

        self.state = ControllerState::Refreshing;
        // Generation vor der Abfrage festhalten: Änderungen während des
        // Laufs bleiben fuer den nächsten Tick sichtbar.
        let generation_at_start = self.signal.generation();

        let result = self.run_refresh(source.as_ref());

        self.seen_generation = generation_at_start;
        self.scheduler.reset();
        self.state = ControllerState::Ready;

        if let Err(e) = &result {
            log::warn!("Refresh fehlgeschlagen: {}", e);
        }
        result
    }

    fn run_refresh(&mut self, source: &dyn LineSource) -> Result<(), SplineSyncError> {
        let records = source.query_all()?;
        let derived: Vec<DerivedRecord> = records
            .iter()
            .map(|record| self.derive_record(record))
            .collect();

        let batch = reconcile(&self.identity, derived);
        log::info!(
            "Edit-Batch: {} neu, {} aktualisiert, {} gelöscht",
            batch.adds.len(),
            batch.updates.len(),
            batch.deletes.len()
        );

        let outcome = self.store.apply_edits(&batch)?;
        // Mapping von Grund auf neu — alte Einträge sammeln sich nie an
        self.identity = IdentityMap::from_apply(&batch, &outcome)?;
        Ok(())
    }

    /// Leitet einen einzelnen Record ab.
    ///
    /// Unter [`MIN_SPLINE_POINTS`] Punkten wird die Original-Geometrie
    /// durchgereicht. Schlägt die Spline-Konstruktion fehl, fällt nur
    /// dieser Record auf die Durchreichung zurück — ein fehlerhafter
    /// Record bricht nie den gesamten Batch ab.
    fn derive_record(&self, record: &LineRecord) -> DerivedRecord {
        let geometry = if record.geometry.len() >= MIN_SPLINE_POINTS {
            match Spline::new(&record.geometry, self.metric.as_ref()) {
                Ok(spline) => spline.sample_path(self.options.samples_per_span),
                Err(e) => {
                    log::warn!(
                        "Spline fuer Record {} fehlgeschlagen, Geometrie wird durchgereicht: {}",
                        record.id,
                        e
                    );
                    record.geometry.clone()
                }
            }
        } else {
            record.geometry.clone()
        };

        DerivedRecord::new(record.id, geometry, record.attributes.clone())
    }
}
