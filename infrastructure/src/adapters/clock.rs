//! Clock adapters

use chrono::{DateTime, TimeDelta, Utc};
use staged_application::Clock;
use std::sync::Mutex;

/// Wall-clock time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to, for simulations
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move forward by `delta`, returning the new time
    pub fn advance(&self, delta: TimeDelta) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(mut now) => {
                *now = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
                *now
            }
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn set(&self, time: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = time;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
