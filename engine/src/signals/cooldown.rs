// Per-instrument emission gate.
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    Allowed,
    /// Another emission happened too recently; `remaining` until the gate opens.
    Blocked { remaining: Duration },
}

impl Reservation {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Reservation::Allowed)
    }
}

/// Last emission time per instrument id.
///
/// The check and the update happen under one lock, so two reservations for
/// the same instrument can never both succeed inside one interval.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    last_emission: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        // The map stays consistent even if a holder panicked.
        self.last_emission.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn try_reserve(&self, instrument: &str, now: DateTime<Utc>, min_interval: Duration) -> Reservation {
        let mut entries = self.entries();
        if let Some(last) = entries.get(instrument) {
            let elapsed = now.signed_duration_since(*last);
            // A negative elapsed time (clock went backwards) stays blocked.
            let elapsed = elapsed.to_std().unwrap_or(Duration::ZERO);
            if elapsed < min_interval {
                return Reservation::Blocked {
                    remaining: min_interval - elapsed,
                };
            }
        }
        entries.insert(instrument.to_string(), now);
        Reservation::Allowed
    }

    /// Restores a known emission time, keeping whichever is more recent.
    pub fn seed(&self, instrument: &str, at: DateTime<Utc>) {
        let mut entries = self.entries();
        let slot = entries.entry(instrument.to_string()).or_insert(at);
        if at > *slot {
            *slot = at;
        }
    }

    pub fn last_emission(&self, instrument: &str) -> Option<DateTime<Utc>> {
        self.entries().get(instrument).copied()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
