//! Distanz-Metriken fuer die Arc-Length-Parametrisierung.

use glam::DVec3;

/// Mittlerer Erdradius in Metern (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Skalare Distanz zwischen zwei Punkten im Referenzrahmen der Quelle.
///
/// Die z-Koordinate geht nicht in die Distanz ein — sie dient nur der
/// Interpolation. Distanzen parametrisieren die Kurve, Höhen werden
/// koordinatenweise mitgeblendet.
pub trait DistanceMetric {
    /// Distanz zwischen `a` und `b` (Einheit metrik-abhängig, typisch Meter).
    fn distance(&self, a: DVec3, b: DVec3) -> f64;
}

/// Euklidische Distanz in der xy-Ebene (projizierte Referenzrahmen).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarDistance;

impl DistanceMetric for PlanarDistance {
    fn distance(&self, a: DVec3, b: DVec3) -> f64 {
        a.truncate().distance(b.truncate())
    }
}

/// Großkreis-Distanz in Metern fuer geografische Rahmen (x = Länge, y = Breite
/// in Grad), berechnet über die Haversine-Formel.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineDistance;

impl DistanceMetric for HaversineDistance {
    fn distance(&self, a: DVec3, b: DVec3) -> f64 {
        let lat1 = a.y.to_radians();
        let lat2 = b.y.to_radians();
        let dlat = (b.y - a.y).to_radians();
        let dlon = (b.x - a.x).to_radians();

        let h = (dlat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon * 0.5).sin().powi(2);
        2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
    }
}
