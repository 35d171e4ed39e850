//! Inkrementelle Synchronisation: Reconciliation, Debouncing, Controller
//! und die Trait-Schnittstellen zu Quelle und Ziel-Store.

pub mod controller;
pub mod interfaces;
pub mod ready;
pub mod reconcile;
pub mod scheduler;

pub use controller::{ControllerState, SyncController};
pub use interfaces::{
    ApplyOutcome, ChangeSignal, LineSource, SourceInfo, SubscriptionId, TargetStore,
};
pub use ready::ReadyCell;
pub use reconcile::{reconcile, EditBatch, IdentityMap};
pub use scheduler::{RefreshScheduler, DEFAULT_COALESCE_WINDOW_MS};
