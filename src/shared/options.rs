//! Zentrale Konfiguration der Spline-Synchronisation.
//!
//! `SyncOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::DEFAULT_SAMPLES_PER_SPAN;
use crate::sync::DEFAULT_COALESCE_WINDOW_MS;

/// Alle zur Laufzeit änderbaren Optionen der Synchronisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Samples je Original-Segment beim Abtasten des Spline-Pfads
    pub samples_per_span: usize,
    /// Koaleszierungsfenster des Refresh-Debouncers in Millisekunden
    pub coalesce_window_ms: u64,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            samples_per_span: DEFAULT_SAMPLES_PER_SPAN,
            coalesce_window_ms: DEFAULT_COALESCE_WINDOW_MS,
        }
    }
}

impl SyncOptions {
    /// Koaleszierungsfenster als `Duration`.
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_window_ms)
    }

    /// Lädt Optionen aus einer TOML-Datei.
    ///
    /// Fehlende oder fehlerhafte Dateien liefern die Standardwerte;
    /// Parse-Fehler werden nur geloggt, nie propagiert.
    pub fn load_from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(options) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    options
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert die Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &Path) -> io::Result<()> {
        let content = toml::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }
}
