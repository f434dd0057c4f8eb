use chrono::{Duration, FixedOffset, NaiveDate, Timelike};
use eligibility_core::clock::{end_of_day, start_of_day};
use eligibility_core::db::open_db_in_memory;
use eligibility_core::{
    CohortId, DeadlineCache, DeadlineStatus, EligibilityConfig, EligibilityError, FixedClock,
    RepoError, RepoResult, SqliteTaskDueDateSource, TaskDueDateSource, TaskId,
};
use rusqlite::{params, Connection};
use std::cell::Cell;
use std::collections::HashMap;
use uuid::Uuid;

struct CountingSource<S> {
    inner: S,
    calls: Cell<usize>,
}

impl<S: TaskDueDateSource> TaskDueDateSource for CountingSource<S> {
    fn due_dates(&self, cohort_id: CohortId) -> RepoResult<HashMap<TaskId, NaiveDate>> {
        self.calls.set(self.calls.get() + 1);
        self.inner.due_dates(cohort_id)
    }
}

fn counting(conn: &Connection) -> CountingSource<SqliteTaskDueDateSource<'_>> {
    CountingSource {
        inner: SqliteTaskDueDateSource::new(conn),
        calls: Cell::new(0),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

/// Cohort starting 2026-10-05 with `tasks_per_period` tasks in periods 1..=3.
struct Cohort {
    id: CohortId,
    tasks_by_period: Vec<Vec<TaskId>>,
}

fn seed_cohort(conn: &Connection, start_date: &str, tasks_per_period: usize) -> Cohort {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO cohorts (uuid, name, start_date) VALUES (?1, 'cohort', ?2);",
        params![id.to_string(), start_date],
    )
    .unwrap();

    let tasks_by_period: Vec<Vec<TaskId>> = (1..=3u32)
        .map(|number| {
            let period = Uuid::new_v4();
            conn.execute(
                "INSERT INTO periods (uuid, cohort_uuid, number) VALUES (?1, ?2, ?3);",
                params![period.to_string(), id.to_string(), number],
            )
            .unwrap();
            let group = Uuid::new_v4();
            conn.execute(
                "INSERT INTO task_groups (uuid, period_uuid) VALUES (?1, ?2);",
                params![group.to_string(), period.to_string()],
            )
            .unwrap();
            (0..tasks_per_period)
                .map(|_| {
                    let task = Uuid::new_v4();
                    conn.execute(
                        "INSERT INTO tasks (uuid, task_group_uuid, title) VALUES (?1, ?2, 'task');",
                        params![task.to_string(), group.to_string()],
                    )
                    .unwrap();
                    task
                })
                .collect::<Vec<_>>()
        })
        .collect();

    Cohort {
        id,
        tasks_by_period,
    }
}

#[test]
fn due_dates_follow_period_chain_to_end_of_day() {
    let conn = open_db_in_memory().unwrap();
    let cohort = seed_cohort(&conn, "2026-10-05", 2);
    let clock = FixedClock::new(start_of_day(date(2026, 10, 16), utc()).unwrap());
    let cache = DeadlineCache::with_clock(cohort.id, SqliteTaskDueDateSource::new(&conn), &clock);

    let expected = [date(2026, 10, 11), date(2026, 10, 18), date(2026, 10, 25)];
    for (tasks, due) in cohort.tasks_by_period.iter().zip(expected) {
        for task in tasks {
            assert_eq!(cache.due_date(*task).unwrap(), end_of_day(due, utc()).unwrap());
        }
    }
}

#[test]
fn many_queries_issue_one_bulk_fetch() {
    let conn = open_db_in_memory().unwrap();
    let cohort = seed_cohort(&conn, "2026-10-05", 10);
    let source = counting(&conn);
    let clock = FixedClock::new(start_of_day(date(2026, 10, 16), utc()).unwrap());
    let cache = DeadlineCache::with_clock(cohort.id, &source, &clock);

    for task in cohort.tasks_by_period.iter().flatten() {
        cache.is_expired(*task).unwrap();
        cache.is_expiring_soon(*task).unwrap();
    }

    assert_eq!(source.calls.get(), 1);
    assert_eq!(cache.fetch_count(), 1);
}

#[test]
fn statuses_on_reference_day() {
    let conn = open_db_in_memory().unwrap();
    let cohort = seed_cohort(&conn, "2026-10-05", 1);
    let clock = FixedClock::new(start_of_day(date(2026, 10, 16), utc()).unwrap() + Duration::hours(9));
    let cache = DeadlineCache::with_clock(cohort.id, SqliteTaskDueDateSource::new(&conn), &clock);

    let statuses: Vec<DeadlineStatus> = cohort
        .tasks_by_period
        .iter()
        .map(|tasks| cache.status(tasks[0]).unwrap())
        .collect();

    // Due 10-11 (past), 10-18 (within 8 days), 10-25 (nine days out).
    assert_eq!(
        statuses,
        vec![
            DeadlineStatus::Expired,
            DeadlineStatus::ExpiringSoon,
            DeadlineStatus::Open,
        ]
    );
}

#[test]
fn task_from_another_cohort_is_scope_mismatch() {
    let conn = open_db_in_memory().unwrap();
    let mine = seed_cohort(&conn, "2026-10-05", 1);
    let other = seed_cohort(&conn, "2026-09-01", 1);
    let cache = DeadlineCache::with_clock(
        mine.id,
        SqliteTaskDueDateSource::new(&conn),
        FixedClock::new(start_of_day(date(2026, 10, 16), utc()).unwrap()),
    );

    let err = cache.is_expired(other.tasks_by_period[0][0]).unwrap_err();
    assert!(err.is_scope_mismatch());
    assert!(err.to_string().contains(&mine.id.to_string()));
}

#[test]
fn corrupt_anchor_surfaces_store_unavailable_once() {
    let conn = open_db_in_memory().unwrap();
    let cohort = seed_cohort(&conn, "not-a-date", 1);
    let source = counting(&conn);
    let cache = DeadlineCache::with_clock(
        cohort.id,
        &source,
        FixedClock::new(start_of_day(date(2026, 10, 16), utc()).unwrap()),
    );

    for _ in 0..2 {
        match cache.prepare().unwrap_err() {
            EligibilityError::StoreUnavailable(err) => {
                assert!(matches!(err.as_ref(), RepoError::InvalidData(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(source.calls.get(), 1);
}

#[test]
fn configured_offset_moves_day_boundaries() {
    let config = EligibilityConfig::from_json_str(r#"{ "utc_offset_minutes": 330 }"#).unwrap();
    let offset = config.utc_offset().unwrap();
    let conn = open_db_in_memory().unwrap();
    let cohort = seed_cohort(&conn, "2026-10-05", 1);
    let clock = FixedClock::new(start_of_day(date(2026, 10, 16), offset).unwrap());
    let cache = DeadlineCache::with_clock(cohort.id, SqliteTaskDueDateSource::new(&conn), &clock)
        .with_expiring_window_days(config.expiring_window_days);

    let due = cache.due_date(cohort.tasks_by_period[0][0]).unwrap();
    assert_eq!(*due.offset(), offset);
    assert_eq!(due.date_naive(), date(2026, 10, 11));
    assert_eq!((due.hour(), due.minute()), (23, 59));
}
