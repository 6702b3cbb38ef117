use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonline_logger::{Clock, Logger, ManualClock, MemorySink};

/// A clock frozen at the canonical test instant, Sydney summer time.
pub const FROZEN_INSTANT: &str = "2016-01-22T15:46:22+11:00";

pub fn frozen_clock() -> Arc<ManualClock> {
    let instant = DateTime::parse_from_rfc3339(FROZEN_INSTANT)
        .unwrap()
        .with_timezone(&Utc);
    Arc::new(ManualClock::new(instant))
}

/// A logger with deterministic timestamps and an observable sink.
pub fn frozen_logger() -> (Logger, MemorySink, Arc<ManualClock>) {
    let sink = MemorySink::default();
    let clock = frozen_clock();
    let logger = Logger::new(sink.clone())
        .timezone(chrono_tz::Australia::Sydney)
        .clock(Arc::clone(&clock) as Arc<dyn Clock>);
    (logger, sink, clock)
}
