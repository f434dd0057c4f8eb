//! Time-bound task model and due-date derivation.
//!
//! # Responsibility
//! - Name the ids of the container chain that dates a task
//!   (task -> task group -> period -> cohort anchor).
//! - Derive one absolute due date per period and classify it.
//!
//! # Invariants
//! - Period numbers start at 1; period `n` ends on the last day of week `n`
//!   counted from the cohort start date.
//! - All tasks in one period share one due date.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a task.
pub type TaskId = Uuid;
/// Stable identifier of a period (program week).
pub type PeriodId = Uuid;
/// Stable identifier of a cohort, the batch scope of a deadline cache.
pub type CohortId = Uuid;

/// Length of one period in days.
pub const PERIOD_LENGTH_DAYS: u64 = 7;

/// Due-date classification of one task at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    Expired,
    ExpiringSoon,
    Open,
}

impl DeadlineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::ExpiringSoon => "expiring_soon",
            Self::Open => "open",
        }
    }
}

/// Returns the calendar due date of period `number` anchored at `anchor`.
///
/// Returns `None` for period `0` or when the date overflows the calendar.
pub fn period_due_date(anchor: NaiveDate, number: u32) -> Option<NaiveDate> {
    let offset_days = u64::from(number)
        .checked_mul(PERIOD_LENGTH_DAYS)?
        .checked_sub(1)?;
    anchor.checked_add_days(Days::new(offset_days))
}
