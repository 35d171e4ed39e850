//! Reine Geometrie-Funktionen: Distanz-Metriken und Spline-Engine.
//!
//! Layer-neutral: kann von `sync` und von Host-Code importiert werden,
//! ohne Zirkel-Abhängigkeiten zu erzeugen.

pub mod distance;
pub mod spline;

pub use distance::{DistanceMetric, HaversineDistance, PlanarDistance, EARTH_RADIUS_M};
pub use spline::{Spline, DEFAULT_SAMPLES_PER_SPAN, MIN_SPLINE_POINTS, TENSION};
