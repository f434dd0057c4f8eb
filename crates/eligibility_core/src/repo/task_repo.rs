//! Bulk due-date source for task batches.
//!
//! # Responsibility
//! - Resolve every task of one cohort to its calendar due date in a single
//!   statement.
//!
//! # Invariants
//! - One query per call, regardless of task count.
//! - Each period's due date is derived once and shared by its tasks.

use crate::model::task::{period_due_date, CohortId, PeriodId, TaskId};
use crate::repo::{parse_uuid_column, RepoError, RepoResult};
use chrono::NaiveDate;
use log::debug;
use rusqlite::{params, Connection};
use std::collections::HashMap;

const COHORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Bulk read contract for task due dates within one batch scope.
pub trait TaskDueDateSource {
    fn due_dates(&self, cohort_id: CohortId) -> RepoResult<HashMap<TaskId, NaiveDate>>;
}

impl<S: TaskDueDateSource + ?Sized> TaskDueDateSource for &S {
    fn due_dates(&self, cohort_id: CohortId) -> RepoResult<HashMap<TaskId, NaiveDate>> {
        (**self).due_dates(cohort_id)
    }
}

/// SQLite-backed due-date source walking task -> group -> period -> cohort.
pub struct SqliteTaskDueDateSource<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskDueDateSource<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskDueDateSource for SqliteTaskDueDateSource<'_> {
    fn due_dates(&self, cohort_id: CohortId) -> RepoResult<HashMap<TaskId, NaiveDate>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                t.uuid AS task_uuid,
                p.uuid AS period_uuid,
                p.number AS period_number,
                c.start_date
             FROM tasks t
             JOIN task_groups g ON g.uuid = t.task_group_uuid
             JOIN periods p ON p.uuid = g.period_uuid
             JOIN cohorts c ON c.uuid = p.cohort_uuid
             WHERE p.cohort_uuid = ?1;",
        )?;

        let mut rows = stmt.query(params![cohort_id.to_string()])?;
        let mut period_dates: HashMap<PeriodId, NaiveDate> = HashMap::new();
        let mut due_dates = HashMap::new();

        while let Some(row) = rows.next()? {
            let task_text: String = row.get("task_uuid")?;
            let period_text: String = row.get("period_uuid")?;
            let task_id = parse_uuid_column(&task_text, "tasks.uuid")?;
            let period_id = parse_uuid_column(&period_text, "periods.uuid")?;

            let due = match period_dates.get(&period_id).copied() {
                Some(date) => date,
                None => {
                    let number: i64 = row.get("period_number")?;
                    let start_text: String = row.get("start_date")?;
                    let date = derive_period_date(&start_text, number)?;
                    period_dates.insert(period_id, date);
                    date
                }
            };
            due_dates.insert(task_id, due);
        }

        debug!(
            "event=due_dates_fetch module=repo status=ok tasks={} periods={}",
            due_dates.len(),
            period_dates.len()
        );
        Ok(due_dates)
    }
}

fn derive_period_date(start_text: &str, number: i64) -> RepoResult<NaiveDate> {
    let anchor = NaiveDate::parse_from_str(start_text, COHORT_DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{start_text}` in cohorts.start_date"
        ))
    })?;
    u32::try_from(number)
        .ok()
        .and_then(|number| period_due_date(anchor, number))
        .ok_or_else(|| {
            RepoError::InvalidData(format!("invalid period number `{number}` in periods.number"))
        })
}
