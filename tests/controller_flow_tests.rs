//! Integrationstests für den SyncController gegen In-Memory-Kollaborateure.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use polyspline::{
    ApplyOutcome, ChangeSignal, ControllerState, DerivedRecord, EditBatch, GeometryKind,
    LineRecord, LineSource, Polyline, SourceInfo, SplineSyncError, SubscriptionId, SyncController,
    SyncOptions, TargetStore, LINE_OBJECT_ID_FIELD,
};

// ── In-Memory-Doubles ───────────────────────────────────────────────

#[derive(Default)]
struct SourceState {
    records: Vec<LineRecord>,
    geometry_kind: Option<GeometryKind>,
    fail_load: bool,
    raise_on_query: bool,
    signals: Vec<(SubscriptionId, ChangeSignal)>,
    next_subscription: u64,
}

/// Linien-Quelle im Speicher; Mutationen heben registrierte Signale an.
struct MemoryLineSource {
    state: Mutex<SourceState>,
}

impl MemoryLineSource {
    fn new(records: Vec<LineRecord>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SourceState {
                records,
                geometry_kind: Some(GeometryKind::Polyline),
                ..SourceState::default()
            }),
        })
    }

    fn with_geometry_kind(kind: GeometryKind) -> Arc<Self> {
        let source = Self::new(Vec::new());
        source.state.lock().unwrap().geometry_kind = Some(kind);
        source
    }

    fn set_fail_load(&self, fail: bool) {
        self.state.lock().unwrap().fail_load = fail;
    }

    fn set_raise_on_query(&self) {
        self.state.lock().unwrap().raise_on_query = true;
    }

    /// Ersetzt den Record-Bestand und meldet die Änderung wie ein Edit.
    fn set_records(&self, records: Vec<LineRecord>) {
        let signals: Vec<ChangeSignal> = {
            let mut state = self.state.lock().unwrap();
            state.records = records;
            state.signals.iter().map(|(_, s)| s.clone()).collect()
        };
        for signal in signals {
            signal.raise();
        }
    }
}

impl LineSource for MemoryLineSource {
    fn load(&self) -> Result<SourceInfo, SplineSyncError> {
        let state = self.state.lock().unwrap();
        if state.fail_load {
            return Err(SplineSyncError::load("Quelle nicht erreichbar"));
        }
        Ok(SourceInfo {
            geometry_kind: state.geometry_kind.unwrap_or(GeometryKind::Polyline),
        })
    }

    fn query_all(&self) -> Result<Vec<LineRecord>, SplineSyncError> {
        let (records, signals) = {
            let mut state = self.state.lock().unwrap();
            let signals: Vec<ChangeSignal> = if state.raise_on_query {
                state.raise_on_query = false;
                state.signals.iter().map(|(_, s)| s.clone()).collect()
            } else {
                Vec::new()
            };
            (state.records.clone(), signals)
        };
        // Simuliert ein Edit, das während der Abfrage eintrifft
        for signal in signals {
            signal.raise();
        }
        Ok(records)
    }

    fn query_by_id(&self, id: u64) -> Result<LineRecord, SplineSyncError> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(SplineSyncError::SourceNotFound(id))
    }

    fn subscribe(&self, signal: ChangeSignal) -> SubscriptionId {
        let mut state = self.state.lock().unwrap();
        state.next_subscription += 1;
        let id = SubscriptionId(state.next_subscription);
        state.signals.push((id, signal));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.state
            .lock()
            .unwrap()
            .signals
            .retain(|(sid, _)| *sid != id);
    }
}

#[derive(Default)]
struct StoreState {
    next_id: u64,
    records: HashMap<u64, DerivedRecord>,
    applied: Vec<EditBatch>,
    fail_next: bool,
}

/// Ziel-Store im Speicher; protokolliert jeden angewendeten Batch.
struct MemoryTargetStore {
    state: Arc<Mutex<StoreState>>,
}

impl TargetStore for MemoryTargetStore {
    fn apply_edits(&self, batch: &EditBatch) -> Result<ApplyOutcome, SplineSyncError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next {
            state.fail_next = false;
            return Err(SplineSyncError::sync("Store lehnt Batch ab"));
        }

        for derived_id in &batch.deletes {
            state.records.remove(derived_id);
        }
        for (derived_id, record) in &batch.updates {
            state.records.insert(*derived_id, record.clone());
        }
        let mut assigned_ids = Vec::with_capacity(batch.adds.len());
        for record in &batch.adds {
            state.next_id += 1;
            let id = state.next_id;
            state.records.insert(id, record.clone());
            assigned_ids.push(id);
        }

        state.applied.push(batch.clone());
        Ok(ApplyOutcome { assigned_ids })
    }
}

// ── Aufbau-Helfer ───────────────────────────────────────────────────

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn test_options() -> SyncOptions {
    SyncOptions {
        samples_per_span: 8,
        coalesce_window_ms: 25,
    }
}

fn make_controller() -> (SyncController, Arc<Mutex<StoreState>>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let store_state = Arc::new(Mutex::new(StoreState::default()));
    let store = MemoryTargetStore {
        state: Arc::clone(&store_state),
    };
    let controller = SyncController::new(
        Box::new(store),
        Box::new(polyspline::PlanarDistance),
        test_options(),
    );
    (controller, store_state)
}

fn line(id: u64, coords: &[(f64, f64)]) -> LineRecord {
    LineRecord::new(id, Polyline::from_xy(coords))
}

/// Drei Records: A/B mit Spline-fähiger Geometrie, C als Zweipunkt-Strecke.
fn default_records() -> Vec<LineRecord> {
    vec![
        line(10, &[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)]),
        line(20, &[(0.0, 10.0), (4.0, 14.0), (8.0, 10.0), (12.0, 14.0)]),
        line(30, &[(0.0, 20.0), (10.0, 20.0)]),
    ]
}

fn applied_count(store: &Arc<Mutex<StoreState>>) -> usize {
    store.lock().unwrap().applied.len()
}

// ── Attach & initiales Laden ────────────────────────────────────────

#[test]
fn test_attach_performs_initial_sync() {
    let (mut controller, store) = make_controller();
    let source = MemoryLineSource::new(default_records());

    controller
        .attach(source.clone())
        .expect("Attach sollte gelingen");

    assert_eq!(controller.state(), ControllerState::Ready);
    assert!(matches!(controller.ready(), Some(Ok(()))));

    let state = store.lock().unwrap();
    assert_eq!(state.applied.len(), 1);
    assert_eq!(state.applied[0].adds.len(), 3);
    assert!(state.applied[0].updates.is_empty());
    assert!(state.applied[0].deletes.is_empty());
    assert_eq!(state.records.len(), 3);
    drop(state);

    assert_eq!(controller.identity_map().len(), 3);
}

#[test]
fn test_attach_same_source_is_noop() {
    let (mut controller, store) = make_controller();
    let source = MemoryLineSource::new(default_records());

    controller.attach(source.clone()).expect("Attach erwartet");
    controller
        .attach(source.clone())
        .expect("Zweites Attach derselben Quelle ist ein No-op");

    // Kein zweiter Initial-Refresh
    assert_eq!(applied_count(&store), 1);
}

#[test]
fn test_attach_different_source_is_rejected() {
    let (mut controller, _store) = make_controller();
    let first = MemoryLineSource::new(default_records());
    let second = MemoryLineSource::new(Vec::new());

    controller.attach(first).expect("Attach erwartet");
    let err = controller.attach(second).expect_err("Fehler erwartet");

    assert!(matches!(err, SplineSyncError::Configuration(_)));
    assert_eq!(controller.state(), ControllerState::Ready);
}

#[test]
fn test_attach_load_failure_allows_retry_with_same_source() {
    let (mut controller, store) = make_controller();
    let source = MemoryLineSource::new(default_records());
    source.set_fail_load(true);

    let err = controller
        .attach(source.clone())
        .expect_err("Ladefehler erwartet");
    assert!(matches!(err, SplineSyncError::Load(_)));
    assert_eq!(controller.state(), ControllerState::Failed);
    // Ladefehler besiegeln die Ready-Zelle nicht
    assert!(controller.ready().is_none());

    source.set_fail_load(false);
    controller
        .attach(source.clone())
        .expect("Retry derselben Quelle erwartet");
    assert_eq!(controller.state(), ControllerState::Ready);
    assert!(matches!(controller.ready(), Some(Ok(()))));
    assert_eq!(applied_count(&store), 1);
}

#[test]
fn test_attach_rejects_wrong_geometry_kind() {
    let (mut controller, store) = make_controller();
    let source = MemoryLineSource::with_geometry_kind(GeometryKind::Point);

    let err = controller.attach(source).expect_err("Fehler erwartet");

    assert!(matches!(err, SplineSyncError::Validation(_)));
    assert_eq!(controller.state(), ControllerState::Failed);
    assert!(matches!(controller.ready(), Some(Err(SplineSyncError::Validation(_)))));
    assert_eq!(applied_count(&store), 0);
}

// ── Ableitung ───────────────────────────────────────────────────────

#[test]
fn test_derived_geometry_is_sampled_spline() {
    let (mut controller, store) = make_controller();
    let source = MemoryLineSource::new(default_records());
    controller.attach(source).expect("Attach erwartet");

    let state = store.lock().unwrap();
    let by_source: HashMap<u64, &DerivedRecord> = state
        .records
        .values()
        .map(|r| (r.source_id, r))
        .collect();

    // 3 Stützpunkte, 8 Samples je Segment → 2*8 + 1 Punkte
    assert_eq!(by_source[&10].geometry.len(), 17);
    // 4 Stützpunkte → 3*8 + 1
    assert_eq!(by_source[&20].geometry.len(), 25);
    // Zweipunkt-Strecke wird unverändert durchgereicht
    assert_eq!(by_source[&30].geometry.len(), 2);

    // Quell-ID wird als Attribut mitgeführt
    assert_eq!(
        by_source[&10].attributes[LINE_OBJECT_ID_FIELD],
        serde_json::Value::from(10)
    );
}

#[test]
fn test_bad_record_falls_back_without_aborting_batch() {
    let (mut controller, store) = make_controller();
    let bad = LineRecord::new(
        77,
        Polyline::new(vec![
            glam::DVec3::ZERO,
            glam::DVec3::new(f64::NAN, 1.0, 0.0),
            glam::DVec3::new(2.0, 0.0, 0.0),
        ]),
    );
    let source = MemoryLineSource::new(vec![
        line(10, &[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)]),
        bad,
    ]);

    controller.attach(source).expect("Attach erwartet");

    let state = store.lock().unwrap();
    assert_eq!(state.records.len(), 2);
    let fallback = state
        .records
        .values()
        .find(|r| r.source_id == 77)
        .expect("Record 77 erwartet");
    // Durchreichung der Original-Geometrie statt Abbruch
    assert_eq!(fallback.geometry.len(), 3);
    assert!(fallback.geometry.points()[1].x.is_nan());
}

// ── Reconciliation über Refreshes ───────────────────────────────────

#[test]
fn test_refresh_reconciles_adds_updates_deletes() {
    let (mut controller, store) = make_controller();
    let source = MemoryLineSource::new(default_records());
    controller.attach(source.clone()).expect("Attach erwartet");

    let id_a = controller.identity_map().derived_id_for(10).expect("ID erwartet");
    let id_b = controller.identity_map().derived_id_for(20).expect("ID erwartet");
    let id_c = controller.identity_map().derived_id_for(30).expect("ID erwartet");

    // C verschwindet, D kommt hinzu
    source.set_records(vec![
        line(10, &[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)]),
        line(20, &[(0.0, 10.0), (4.0, 14.0), (8.0, 10.0), (12.0, 14.0)]),
        line(40, &[(0.0, 30.0), (5.0, 35.0), (10.0, 30.0)]),
    ]);
    controller.trigger_refresh().expect("Refresh erwartet");

    let state = store.lock().unwrap();
    let batch = state.applied.last().expect("Batch erwartet");
    assert_eq!(batch.adds.len(), 1);
    assert_eq!(batch.adds[0].source_id, 40);
    assert_eq!(
        batch.updates.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
        vec![id_a, id_b]
    );
    assert_eq!(batch.deletes, vec![id_c]);
    drop(state);

    // IDs bleiben über den Refresh hinweg stabil, das Mapping ist vollständig neu
    assert_eq!(controller.identity_map().len(), 3);
    assert_eq!(controller.identity_map().derived_id_for(10), Some(id_a));
    assert_eq!(controller.identity_map().derived_id_for(20), Some(id_b));
    assert_eq!(controller.identity_map().derived_id_for(30), None);
}

#[test]
fn test_second_refresh_with_unchanged_source_is_update_only() {
    let (mut controller, store) = make_controller();
    let source = MemoryLineSource::new(default_records());
    controller.attach(source).expect("Attach erwartet");

    controller.trigger_refresh().expect("Refresh erwartet");

    let state = store.lock().unwrap();
    let batch = state.applied.last().expect("Batch erwartet");
    assert!(batch.adds.is_empty());
    assert!(batch.deletes.is_empty());
    assert_eq!(batch.updates.len(), 3);
}

#[test]
fn test_store_failure_keeps_identity_map_untouched() {
    let (mut controller, store) = make_controller();
    let source = MemoryLineSource::new(default_records());
    controller.attach(source.clone()).expect("Attach erwartet");

    let map_before: Vec<(u64, u64)> = controller.identity_map().iter().collect();

    source.set_records(vec![line(40, &[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)])]);
    store.lock().unwrap().fail_next = true;

    let err = controller.trigger_refresh().expect_err("Sync-Fehler erwartet");
    assert!(matches!(err, SplineSyncError::Sync(_)));

    // Letzter bekannter guter Zustand bleibt erhalten
    let map_after: Vec<(u64, u64)> = controller.identity_map().iter().collect();
    assert_eq!(map_after, map_before);
    assert_eq!(controller.state(), ControllerState::Ready);

    // Der nächste Refresh holt denselben Diff sauber nach
    controller.trigger_refresh().expect("Retry erwartet");
    assert_eq!(controller.identity_map().len(), 1);
    assert!(controller.identity_map().derived_id_for(40).is_some());
}

// ── Debouncing & Koaleszierung ──────────────────────────────────────

#[test]
fn test_notification_burst_collapses_to_one_refresh() {
    let (mut controller, store) = make_controller();
    let source = MemoryLineSource::new(default_records());
    controller.attach(source).expect("Attach erwartet");
    assert_eq!(applied_count(&store), 1);

    // 5 Signale innerhalb von 10ms, dazwischen Ticks
    let t0 = Instant::now();
    for offset in [0u64, 2, 4, 7, 10] {
        controller.notify_changed();
        let ran = controller.tick(t0 + ms(offset)).expect("Tick erwartet");
        assert!(!ran, "Innerhalb des Fensters darf kein Refresh laufen");
    }

    assert!(controller.tick(t0 + ms(50)).expect("Tick erwartet"));
    assert_eq!(applied_count(&store), 2);

    // Keine weiteren Läufe ohne neue Signale
    assert!(!controller.tick(t0 + ms(100)).expect("Tick erwartet"));
    assert_eq!(applied_count(&store), 2);
}

#[test]
fn test_change_during_refresh_runs_one_trailing_refresh() {
    let (mut controller, store) = make_controller();
    let source = MemoryLineSource::new(default_records());
    controller.attach(source.clone()).expect("Attach erwartet");
    assert_eq!(applied_count(&store), 1);

    // Das nächste query_all hebt das Signal mitten im Refresh an
    source.set_raise_on_query();
    controller.trigger_refresh().expect("Refresh erwartet");
    assert_eq!(applied_count(&store), 2);

    // Genau ein nachlaufender Refresh, nicht mehr
    let t0 = Instant::now();
    assert!(!controller.tick(t0).expect("Tick erwartet"));
    assert!(controller.tick(t0 + ms(50)).expect("Tick erwartet"));
    assert_eq!(applied_count(&store), 3);
    assert!(!controller.tick(t0 + ms(100)).expect("Tick erwartet"));
    assert_eq!(applied_count(&store), 3);
}

#[test]
fn test_source_edit_triggers_refresh_via_subscription() {
    let (mut controller, store) = make_controller();
    let source = MemoryLineSource::new(default_records());
    controller.attach(source.clone()).expect("Attach erwartet");

    // set_records meldet sich über das abonnierte Signal
    source.set_records(vec![line(10, &[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)])]);

    let t0 = Instant::now();
    let _ = controller.tick(t0).expect("Tick erwartet");
    assert!(controller.tick(t0 + ms(50)).expect("Tick erwartet"));

    assert_eq!(applied_count(&store), 2);
    assert_eq!(controller.identity_map().len(), 1);
    assert_eq!(store.lock().unwrap().records.len(), 1);
}

// ── Lookups ─────────────────────────────────────────────────────────

#[test]
fn test_source_record_lookup_by_derived_id() {
    let (mut controller, _store) = make_controller();
    let source = MemoryLineSource::new(default_records());
    controller.attach(source).expect("Attach erwartet");

    let derived_id = controller
        .identity_map()
        .derived_id_for(20)
        .expect("ID erwartet");
    let record = controller
        .source_record_for(derived_id)
        .expect("Record erwartet");
    assert_eq!(record.id, 20);

    let err = controller.source_record_for(9999).expect_err("Fehler erwartet");
    assert!(matches!(err, SplineSyncError::DerivedNotFound(9999)));
}

#[test]
fn test_trigger_refresh_requires_loaded_source() {
    let (mut controller, _store) = make_controller();

    let err = controller.trigger_refresh().expect_err("Fehler erwartet");
    assert!(matches!(err, SplineSyncError::Configuration(_)));
}
