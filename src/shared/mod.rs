//! Layer-übergreifende Bausteine: Laufzeit-Optionen.

pub mod options;

pub use options::SyncOptions;
