//! polyspline — Spline-Ableitung und inkrementelle Synchronisation.
//!
//! Leitet aus groben Linienzügen glatte, Arc-Length-parametrisierte
//! Hermite-Kurven ab und hält die abgeleiteten Records über minimale
//! Add/Update/Delete-Batches synchron zu einer veränderlichen Quelle.
//! Quelle und Ziel-Store werden nur über schmale Traits konsumiert.

pub mod core;
pub mod error;
pub mod geometry;
pub mod shared;
pub mod sync;

pub use core::{
    AttributeMap, DerivedRecord, GeometryKind, LineRecord, Polyline, LINE_OBJECT_ID_FIELD,
};
pub use error::SplineSyncError;
pub use geometry::{
    DistanceMetric, HaversineDistance, PlanarDistance, Spline, DEFAULT_SAMPLES_PER_SPAN,
    MIN_SPLINE_POINTS, TENSION,
};
pub use shared::SyncOptions;
pub use sync::{
    reconcile, ApplyOutcome, ChangeSignal, ControllerState, EditBatch, IdentityMap, LineSource,
    ReadyCell, RefreshScheduler, SourceInfo, SubscriptionId, SyncController, TargetStore,
};
