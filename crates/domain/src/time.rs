//! Clock helpers shared by the scheduler and execution bookkeeping.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Wall-clock instant in UTC. Execution times, task status records and cron
/// fire times all use it.
pub type Timestamp = DateTime<Utc>;

/// Current wall-clock time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Wall-clock distance from `from` to `to`, saturating at zero when `to`
/// lies in the past.
#[must_use]
pub fn delay_until(from: Timestamp, to: Timestamp) -> Duration {
    (to - from).to_std().unwrap_or(Duration::ZERO)
}
