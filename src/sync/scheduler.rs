//! Trailing-Edge-Debouncer fuer Refresh-Läufe.

use std::time::{Duration, Instant};

/// Standard-Koaleszierungsfenster in Millisekunden.
pub const DEFAULT_COALESCE_WINDOW_MS: u64 = 25;

/// Expliziter Scheduler-Baustein: Mindestintervall plus Dirty-Flag.
///
/// Signale innerhalb des Fensters kollabieren zu genau einem fälligen Lauf,
/// sobald das Fenster ruhig war (Trailing-Edge). Der Scheduler liest nie
/// selbst die Uhr — Zeitpunkte kommen immer vom Aufrufer, wodurch Tests
/// die Zeit deterministisch treiben können.
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    window: Duration,
    dirty: bool,
    last_signal: Option<Instant>,
}

impl RefreshScheduler {
    /// Erstellt einen Scheduler mit dem angegebenen Koaleszierungsfenster.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            dirty: false,
            last_signal: None,
        }
    }

    /// Vermerkt ein Änderungssignal zum Zeitpunkt `now`.
    ///
    /// Jedes weitere Signal schiebt das Fälligkeitsfenster nach hinten;
    /// ein Burst ergibt trotzdem nur einen Lauf.
    pub fn signal(&mut self, now: Instant) {
        self.dirty = true;
        self.last_signal = Some(now);
    }

    /// Gibt `true` zurück, wenn ein Lauf aussteht (fällig oder nicht).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Prüft, ob ein Lauf fällig ist, und konsumiert ihn.
    ///
    /// Fällig heißt: Dirty-Flag gesetzt und seit dem letzten Signal ist
    /// mindestens das Fenster vergangen.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if !self.dirty {
            return false;
        }
        let quiet = self
            .last_signal
            .is_none_or(|at| now.duration_since(at) >= self.window);
        if quiet {
            self.dirty = false;
        }
        quiet
    }

    /// Setzt Flag und Zeitstempel zurück (nach einem explizit ausgelösten
    /// Lauf sind zuvor gesammelte Signale abgegolten).
    pub fn reset(&mut self) {
        self.dirty = false;
        self.last_signal = None;
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_COALESCE_WINDOW_MS))
    }
}
