//! Polyline-Geometrie: geordnete Punktfolge in einem Referenzrahmen.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::SplineSyncError;

/// Geometrie-Typ einer Quelle. Die Synchronisation akzeptiert nur `Polyline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    /// Linienzug (einziger unterstützter Quell-Typ)
    Polyline,
    /// Einzelpunkt
    Point,
    /// Fläche
    Polygon,
}

/// Geordnete Punktfolge (x, y, z) eines Linien-Records.
///
/// Punkte sind unveränderlich; eine Polyline wird als Ganzes ersetzt,
/// nie in-place mutiert.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<DVec3>,
}

impl Polyline {
    /// Erstellt eine Polyline aus einer Punktliste (Länge ≥ 0 erlaubt).
    pub fn new(points: Vec<DVec3>) -> Self {
        Self { points }
    }

    /// Bequem-Konstruktor aus (x, y)-Paaren mit z = 0.
    pub fn from_xy(coords: &[(f64, f64)]) -> Self {
        Self {
            points: coords
                .iter()
                .map(|&(x, y)| DVec3::new(x, y, 0.0))
                .collect(),
        }
    }

    /// Alle Punkte (read-only).
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    /// Anzahl der Punkte.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Gibt `true` zurück, wenn die Polyline keine Punkte enthält.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Erster Punkt (falls vorhanden).
    pub fn first(&self) -> Option<DVec3> {
        self.points.first().copied()
    }

    /// Letzter Punkt (falls vorhanden).
    pub fn last(&self) -> Option<DVec3> {
        self.points.last().copied()
    }

    /// Prüft, dass alle Koordinaten endlich sind.
    ///
    /// Nicht-endliche Werte (NaN, ±∞) würden sich durch die Arc-Length-Tabelle
    /// in jede interpolierte Position fortpflanzen.
    pub fn ensure_finite(&self) -> Result<(), SplineSyncError> {
        for (index, point) in self.points.iter().enumerate() {
            if !point.is_finite() {
                return Err(SplineSyncError::validation(format!(
                    "Punkt {} ist nicht endlich: {:?}",
                    index, point
                )));
            }
        }
        Ok(())
    }
}

impl From<Vec<DVec3>> for Polyline {
    fn from(points: Vec<DVec3>) -> Self {
        Self::new(points)
    }
}
