//! Fixed-zone timestamp rendering and the clock seam used for tests.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z %Z";

/// Source of the current instant.
///
/// Production code uses [`SystemClock`]; tests freeze time with a
/// [`ManualClock`].
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    instant: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Mutex::new(instant),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self
            .instant
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = instant;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut instant = self.instant.lock().unwrap_or_else(PoisonError::into_inner);
        *instant = *instant + delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Renders instants as `"<date> <time> <offset> <zone-abbrev>"` in one
/// fixed target zone, e.g. `2016-01-22 15:46:22 +1100 AEDT`.
#[derive(Debug, Clone, Copy)]
pub struct TimestampFormatter {
    zone: Tz,
}

impl TimestampFormatter {
    #[must_use]
    pub const fn new(zone: Tz) -> Self {
        Self { zone }
    }

    /// A formatter for the host's zone, falling back to UTC when the host
    /// zone cannot be resolved.
    #[must_use]
    pub fn host() -> Self {
        let zone = iana_time_zone::get_timezone()
            .ok()
            .and_then(|name| name.parse().ok())
            .unwrap_or(Tz::UTC);
        Self::new(zone)
    }

    #[must_use]
    pub fn format(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.zone)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}

impl Default for TimestampFormatter {
    fn default() -> Self {
        Self::host()
    }
}
