use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::{Admission, ThrottleKey};

/// Admissions between sweeps of expired keys.
const PRUNE_INTERVAL: usize = 64;

/// Admits at most one alert per [`ThrottleKey`] per cooldown window.
///
/// Not synchronized on its own; the owning session serializes access so that
/// the check and the timestamp update happen as one step.
///
/// A key whose window has lapsed decides exactly like a missing key, so
/// lapsed keys are swept out periodically and the map only holds keys
/// admitted within the last window.
#[derive(Debug, Clone)]
pub struct AlertThrottle {
    window: Duration,
    last_admitted: HashMap<ThrottleKey, DateTime<Utc>>,
    admits_since_prune: usize,
}

impl AlertThrottle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_admitted: HashMap::new(),
            admits_since_prune: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn try_admit(&mut self, key: ThrottleKey, now: DateTime<Utc>) -> Admission {
        let admit = match self.last_admitted.get(&key) {
            None => true,
            // A negative gap (clock stepped back) fails `to_std` and suppresses,
            // so stored timestamps only ever move forward.
            Some(last) => (now - *last)
                .to_std()
                .map(|elapsed| elapsed >= self.window)
                .unwrap_or(false),
        };

        if admit {
            self.last_admitted.insert(key, now);
            self.admits_since_prune += 1;
            if self.admits_since_prune >= PRUNE_INTERVAL {
                self.prune(now);
            }
            Admission::Admitted
        } else {
            Admission::Suppressed
        }
    }

    /// Drop every key whose window has lapsed at `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.last_admitted.retain(|_, last| {
            (now - *last)
                .to_std()
                .map(|elapsed| elapsed < window)
                .unwrap_or(true)
        });
        self.admits_since_prune = 0;
    }

    pub fn last_admitted(&self, key: &ThrottleKey) -> Option<DateTime<Utc>> {
        self.last_admitted.get(key).copied()
    }

    pub fn tracked_keys(&self) -> usize {
        self.last_admitted.len()
    }

    pub fn clear(&mut self) {
        self.last_admitted.clear();
        self.admits_since_prune = 0;
    }
}
