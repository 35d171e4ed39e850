//! Core-Domänentypen: Polyline-Geometrie, Quell- und abgeleitete Records.

pub mod polyline;
pub mod record;

pub use polyline::{GeometryKind, Polyline};
pub use record::{AttributeMap, DerivedRecord, LineRecord, LINE_OBJECT_ID_FIELD};
