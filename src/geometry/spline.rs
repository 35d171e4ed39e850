//! Arc-Length-parametrisierte Hermite-Spline über einer Punktfolge.
//!
//! Die Kurve wird über die kumulierte Distanz zwischen den Stützpunkten
//! parametrisiert, damit Interpolations-Anteile physischer Distanz
//! entsprechen statt Punkt-Indizes. Tangenten entstehen aus den
//! Nachbar-Differenzen jedes Punktes und werden über [`TENSION`] gedämpft.

use glam::DVec3;

use crate::core::Polyline;
use crate::error::SplineSyncError;
use crate::geometry::DistanceMetric;

/// Dämpfung der Tangenten-Magnitude (Kurven-Straffheit). Fester Wert,
/// bewusst nicht konfigurierbar.
pub const TENSION: f64 = 0.9;

/// Standard-Anzahl Samples je Original-Segment beim Abtasten des Pfads.
pub const DEFAULT_SAMPLES_PER_SPAN: usize = 50;

/// Mindest-Punktzahl, ab der die Spline-Maschinerie greift.
/// Darunter wird die Geometrie unverändert durchgereicht.
pub const MIN_SPLINE_POINTS: usize = 3;

/// Unveränderliche Spline über einer Punktfolge.
///
/// Wird je Refresh-Zyklus pro Quell-Record neu aufgebaut und nach der
/// Berechnung des Edit-Beitrags verworfen; inkrementelle Mutation gibt
/// es nicht.
///
/// Verhalten nach Punktzahl:
/// - 0 oder 1 Punkte: degeneriert, Eingabe wird durchgereicht
/// - genau 2 Punkte: exakte Strecke p0–p1, keine Krümmung
/// - ≥ 3 Punkte: volle Hermite-Interpolation
#[derive(Debug, Clone)]
pub struct Spline {
    points: Vec<DVec3>,
    /// Kumulierte Distanz bis Punkt i (xs[0] = 0, monoton steigend)
    xs: Vec<f64>,
    /// Distanz zwischen Punkt i und i+1 (Länge = len(xs) - 1)
    dxs: Vec<f64>,
    /// Tangente je Punkt: Differenz Vor- zu Rück-Nachbar
    tangents: Vec<DVec3>,
    /// Distanz zwischen den beiden Nachbarn von Punkt i
    tangent_distances: Vec<f64>,
}

impl Spline {
    /// Baut die Arc-Length-Tabelle und das Tangentenfeld auf.
    ///
    /// Unter [`MIN_SPLINE_POINTS`] Punkten bleibt das Tangentenfeld leer —
    /// Tangenten- und Hermite-Maschinerie werden nie angefasst.
    pub fn new(geometry: &Polyline, metric: &dyn DistanceMetric) -> Result<Self, SplineSyncError> {
        geometry.ensure_finite()?;
        let points = geometry.points().to_vec();
        let n = points.len();

        let mut xs = Vec::with_capacity(n);
        let mut dxs = Vec::with_capacity(n.saturating_sub(1));
        if n > 0 {
            xs.push(0.0);
        }
        for i in 1..n {
            let distance = metric.distance(points[i - 1], points[i]);
            dxs.push(distance);
            xs.push(distance + xs[i - 1]);
        }

        // Endpunkte nutzen sich selbst als fehlenden Nachbarn; dort entsteht
        // eine verkürzte bzw. Null-Tangente.
        let mut tangents = Vec::new();
        let mut tangent_distances = Vec::new();
        if n >= MIN_SPLINE_POINTS {
            tangents.reserve(n);
            tangent_distances.reserve(n);
            for i in 0..n {
                let prev = if i == 0 { 0 } else { i - 1 };
                let next = if i == n - 1 { i } else { i + 1 };
                tangents.push(points[next] - points[prev]);
                tangent_distances.push(metric.distance(points[prev], points[next]));
            }
        }

        Ok(Self {
            points,
            xs,
            dxs,
            tangents,
            tangent_distances,
        })
    }

    /// Anzahl der Stützpunkte.
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Gesamtlänge des Linienzugs in Metrik-Einheiten (0 bei < 2 Punkten).
    pub fn total_length(&self) -> f64 {
        match self.points.len() {
            0 | 1 => 0.0,
            _ => self.xs.last().copied().unwrap_or(0.0),
        }
    }

    /// Interpoliert die Position beim globalen Anteil `t ∈ [0, 1]`.
    ///
    /// `t` wird auf die absolute Bogenlänge abgebildet, d.h. `t = 0.5`
    /// liegt bei der halben Gesamtdistanz, nicht beim mittleren Index.
    pub fn interpolate(&self, t: f64) -> DVec3 {
        let t = t.clamp(0.0, 1.0);
        match self.points.len() {
            0 => DVec3::ZERO,
            1 => self.points[0],
            // Zwei Punkte: exakte Strecke, keine Krümmungs-Artefakte
            2 => self.points[0].lerp(self.points[1], t),
            _ => {
                let start = self.xs[0];
                let end = self.xs[self.xs.len() - 1];
                self.interpolate_absolute(start + (end - start) * t)
            }
        }
    }

    /// Tastet den Pfad mit `samples_per_span` Samples je Original-Segment ab.
    ///
    /// Anders als [`Spline::interpolate`] wird hier segmentweise statt global
    /// abgetastet: Segmentgrenzen landen exakt auf den Original-Stützpunkten,
    /// unabhängig davon wie ungleich die Segmentlängen sind.
    pub fn sample_path(&self, samples_per_span: usize) -> Polyline {
        if self.points.len() < MIN_SPLINE_POINTS {
            // Degeneriert bzw. Strecke: Eingabe unverändert durchreichen
            return Polyline::new(self.points.clone());
        }

        let samples = samples_per_span.max(1);
        let n = self.xs.len();
        let mut path = Vec::with_capacity((n - 1) * samples + 1);

        path.push(self.interpolate_absolute(self.xs[0]));
        for i in 1..n {
            for j in 1..=samples {
                let fraction = j as f64 / samples as f64;
                let x_abs = self.xs[i - 1] + (self.xs[i] - self.xs[i - 1]) * fraction;
                path.push(self.interpolate_absolute(x_abs));
            }
        }

        Polyline::new(path)
    }

    /// Interpoliert bei absoluter Bogenlänge `x_abs` (nur ≥ 3 Punkte).
    fn interpolate_absolute(&self, x_abs: f64) -> DVec3 {
        let xs = &self.xs;
        let mut i = 0;
        while i < xs.len() - 2 && x_abs > xs[i + 1] {
            i += 1;
        }

        let dx = self.dxs[i];
        // Null-Längen-Segment (doppelte Stützpunkte): lokalen Parameter auf
        // den Segment-Anfang setzen statt durch 0 zu teilen.
        let s = if dx > f64::EPSILON {
            (x_abs - xs[i]) / dx
        } else {
            0.0
        };

        let ta1 = Self::tangent_scale(dx, self.tangent_distances[i]);
        let ta2 = Self::tangent_scale(dx, self.tangent_distances[i + 1]);

        Self::hermite(
            s,
            self.points[i],
            self.points[i + 1],
            self.tangents[i],
            self.tangents[i + 1],
            ta1,
            ta2,
        )
    }

    /// Tangenten-Skalierung `dx / tangent_distance * TENSION`.
    ///
    /// Zusammenfallende Nachbarpunkte liefern eine Nachbar-Distanz von 0;
    /// deren Tangenten-Beitrag wird auf 0 gesetzt statt NaN zu erzeugen.
    fn tangent_scale(dx: f64, tangent_distance: f64) -> f64 {
        if tangent_distance > f64::EPSILON {
            dx / tangent_distance * TENSION
        } else {
            0.0
        }
    }

    /// Kubische Hermite-Basis (vgl. <https://www.cubic.org/docs/hermite.htm>).
    fn hermite(s: f64, p1: DVec3, p2: DVec3, t1: DVec3, t2: DVec3, ta1: f64, ta2: f64) -> DVec3 {
        let s2 = s * s;
        let s3 = s2 * s;
        let h1 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h2 = -2.0 * s3 + 3.0 * s2;
        let h3 = s3 - 2.0 * s2 + s;
        let h4 = s3 - s2;

        h1 * p1 + h2 * p2 + h3 * ta1 * t1 + h4 * ta2 * t2
    }
}
