//! Wall-clock abstraction and calendar-day boundaries.
//!
//! # Responsibility
//! - Provide "now" to deadline classification through an injectable seam.
//! - Convert calendar dates to start-of-day / end-of-day instants.
//!
//! # Invariants
//! - End of day is `23:59:59.999` local to the configured offset.
//! - Day boundaries are computed in one fixed UTC offset; no DST shifts.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use std::sync::Mutex;

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<FixedOffset> {
        (**self).now()
    }
}

/// System time projected into one fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Settable clock for hosts and tests that pin time.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the pinned instant.
    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Returns `00:00:00.000` on `date` in `offset`.
///
/// `None` when the instant falls outside the representable range.
pub fn start_of_day(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    local_instant(date.and_time(NaiveTime::MIN), offset)
}

/// Returns `23:59:59.999` on `date` in `offset`.
///
/// `None` when the instant falls outside the representable range.
pub fn end_of_day(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .and_then(|local| local_instant(local, offset))
}

fn local_instant(local: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let utc = local.checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))?;
    Some(DateTime::from_naive_utc_and_offset(utc, offset))
}
