//! Request-scoped task deadline classification.
//!
//! # Responsibility
//! - Load every due date of one cohort with a single bulk fetch.
//! - Answer expired / expiring-soon queries from memory afterwards.
//!
//! # Invariants
//! - The bulk fetch runs at most once per cache instance, including under
//!   concurrent first queries and after a failed fetch.
//! - Due instants are end of day (`23:59:59.999`) in the offset the clock
//!   reported at population; window edges use that same offset.
//! - "Today" is read from the clock at query time, not at population time.

use crate::clock::{end_of_day, start_of_day, Clock, SystemClock};
use crate::model::task::{CohortId, DeadlineStatus, TaskId};
use crate::repo::task_repo::TaskDueDateSource;
use crate::repo::{RepoError, RepoResult};
use crate::service::{EligibilityError, EligibilityResult, ScopeMismatch};
use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use log::{error, info};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Default look-ahead for `is_expiring_soon`, in days.
pub const DEFAULT_EXPIRING_WINDOW_DAYS: u32 = 8;

/// Populated mapping plus the offset its day boundaries were computed in.
struct DueInstants {
    offset: FixedOffset,
    by_task: HashMap<TaskId, DateTime<FixedOffset>>,
}

impl DueInstants {
    fn build(dates: HashMap<TaskId, NaiveDate>, offset: FixedOffset) -> RepoResult<Self> {
        let by_task = dates
            .into_iter()
            .map(|(task_id, date)| {
                end_of_day(date, offset)
                    .map(|due_at| (task_id, due_at))
                    .ok_or_else(|| {
                        RepoError::InvalidData(format!(
                            "due date {date} of task {task_id} has no end-of-day instant at offset {offset}"
                        ))
                    })
            })
            .collect::<RepoResult<HashMap<_, _>>>()?;
        Ok(Self { offset, by_task })
    }
}

enum CacheState {
    Uninitialized,
    Populated(Arc<DueInstants>),
    Failed(Arc<RepoError>),
}

/// One classified task, as returned by [`DeadlineCache::report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineEntry {
    pub task_id: TaskId,
    pub due_at: DateTime<FixedOffset>,
    pub status: DeadlineStatus,
}

/// Due-date cache bound to one cohort.
pub struct DeadlineCache<S, C = SystemClock> {
    cohort_id: CohortId,
    source: S,
    clock: C,
    expiring_window_days: u32,
    state: Mutex<CacheState>,
    fetch_count: AtomicUsize,
}

impl<S: TaskDueDateSource> DeadlineCache<S, SystemClock> {
    /// Creates an empty cache on the UTC system clock.
    pub fn new(cohort_id: CohortId, source: S) -> Self {
        Self::with_clock(cohort_id, source, SystemClock::utc())
    }
}

impl<S: TaskDueDateSource, C: Clock> DeadlineCache<S, C> {
    /// Creates an empty cache; nothing is fetched until the first query.
    pub fn with_clock(cohort_id: CohortId, source: S, clock: C) -> Self {
        Self {
            cohort_id,
            source,
            clock,
            expiring_window_days: DEFAULT_EXPIRING_WINDOW_DAYS,
            state: Mutex::new(CacheState::Uninitialized),
            fetch_count: AtomicUsize::new(0),
        }
    }

    pub fn with_expiring_window_days(mut self, days: u32) -> Self {
        self.expiring_window_days = days;
        self
    }

    /// Number of bulk fetches issued so far; never exceeds one.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn is_populated(&self) -> bool {
        matches!(*self.lock_state(), CacheState::Populated(_))
    }

    /// Populates the cache if that has not been attempted yet.
    ///
    /// Idempotent: later calls return the remembered outcome.
    pub fn prepare(&self) -> EligibilityResult<()> {
        self.due_instants().map(|_| ())
    }

    /// Returns the end-of-day due instant of `task_id`.
    ///
    /// # Errors
    /// - `ScopeMismatch::TaskNotInCohort` when the task is outside this cohort.
    /// - `StoreUnavailable` when the bulk fetch failed.
    pub fn due_date(&self, task_id: TaskId) -> EligibilityResult<DateTime<FixedOffset>> {
        let due_instants = self.due_instants()?;
        self.lookup(&due_instants, task_id)
    }

    /// True when the due instant lies strictly before now.
    pub fn is_expired(&self, task_id: TaskId) -> EligibilityResult<bool> {
        let due_at = self.due_date(task_id)?;
        Ok(due_at < self.clock.now())
    }

    /// True when the due instant lies within
    /// `[start of today, end of today + window]`.
    pub fn is_expiring_soon(&self, task_id: TaskId) -> EligibilityResult<bool> {
        let due_instants = self.due_instants()?;
        let due_at = self.lookup(&due_instants, task_id)?;
        Ok(self.within_window(due_at, self.clock.now(), due_instants.offset))
    }

    /// Classifies one task against a single reading of the clock.
    pub fn status(&self, task_id: TaskId) -> EligibilityResult<DeadlineStatus> {
        let due_instants = self.due_instants()?;
        let due_at = self.lookup(&due_instants, task_id)?;
        Ok(self.classify(due_at, self.clock.now(), due_instants.offset))
    }

    /// Classifies every task in scope, ordered by due instant then id.
    pub fn report(&self) -> EligibilityResult<Vec<DeadlineEntry>> {
        let due_instants = self.due_instants()?;
        let now = self.clock.now();
        let mut entries: Vec<DeadlineEntry> = due_instants
            .by_task
            .iter()
            .map(|(task_id, due_at)| DeadlineEntry {
                task_id: *task_id,
                due_at: *due_at,
                status: self.classify(*due_at, now, due_instants.offset),
            })
            .collect();
        entries.sort_by(|a, b| a.due_at.cmp(&b.due_at).then(a.task_id.cmp(&b.task_id)));
        Ok(entries)
    }

    fn lookup(
        &self,
        due_instants: &DueInstants,
        task_id: TaskId,
    ) -> EligibilityResult<DateTime<FixedOffset>> {
        due_instants.by_task.get(&task_id).copied().ok_or_else(|| {
            ScopeMismatch::TaskNotInCohort {
                task_id,
                cohort_id: self.cohort_id,
            }
            .into()
        })
    }

    fn classify(
        &self,
        due_at: DateTime<FixedOffset>,
        now: DateTime<FixedOffset>,
        offset: FixedOffset,
    ) -> DeadlineStatus {
        if due_at < now {
            DeadlineStatus::Expired
        } else if self.within_window(due_at, now, offset) {
            DeadlineStatus::ExpiringSoon
        } else {
            DeadlineStatus::Open
        }
    }

    /// Unrepresentable window edges leave that side of the window open.
    fn within_window(
        &self,
        due_at: DateTime<FixedOffset>,
        now: DateTime<FixedOffset>,
        offset: FixedOffset,
    ) -> bool {
        let today = now.with_timezone(&offset).date_naive();
        let after_start = start_of_day(today, offset).map_or(true, |start| start <= due_at);
        let before_end = today
            .checked_add_days(Days::new(u64::from(self.expiring_window_days)))
            .and_then(|last_day| end_of_day(last_day, offset))
            .map_or(true, |end| due_at <= end);
        after_start && before_end
    }

    fn due_instants(&self) -> EligibilityResult<Arc<DueInstants>> {
        // Held across the fetch so racing first queries wait for one fetch.
        let mut state = self.lock_state();
        match &*state {
            CacheState::Populated(due_instants) => return Ok(Arc::clone(due_instants)),
            CacheState::Failed(err) => {
                return Err(EligibilityError::StoreUnavailable(Arc::clone(err)))
            }
            CacheState::Uninitialized => {}
        }

        let started_at = Instant::now();
        let offset = *self.clock.now().offset();
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        let populated = self
            .source
            .due_dates(self.cohort_id)
            .and_then(|dates| DueInstants::build(dates, offset));

        match populated {
            Ok(due_instants) => {
                let due_instants = Arc::new(due_instants);
                info!(
                    "event=deadline_prepare module=service status=ok tasks={} duration_ms={}",
                    due_instants.by_task.len(),
                    started_at.elapsed().as_millis()
                );
                *state = CacheState::Populated(Arc::clone(&due_instants));
                Ok(due_instants)
            }
            Err(err) => {
                error!(
                    "event=deadline_prepare module=service status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                let err = Arc::new(err);
                *state = CacheState::Failed(Arc::clone(&err));
                Err(EligibilityError::StoreUnavailable(err))
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
