//! Wall-clock access for timestamps written to storage.
//!
//! Timestamps are ISO-8601 UTC strings with millisecond precision
//! (`2024-05-01T09:30:00.000Z`), matching previously stored records.

use chrono::{DateTime, SecondsFormat, Utc};

/// Source of "now" for login and backup timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn now_iso(&self) -> String {
        format_timestamp(self.now())
    }
}

/// System clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
