//! Database query functions for the `schedules` and `schedule_tasks` tables.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Schedule, ScheduleSummary};

/// Header fields written when a schedule is first created.
#[derive(Debug, Clone)]
pub struct NewSchedule<'a> {
    pub owner_id: Uuid,
    pub date: NaiveDate,
    pub day_of_week: &'a str,
    pub total_committed_hours: f64,
    pub total_available_hours: f64,
    pub notes: &'a str,
}

/// Fetch the schedule for `(owner, date)`, creating it from `new` if absent.
///
/// Returns the row and whether it was created. An existing schedule's
/// header is left untouched.
pub async fn get_or_create_schedule(
    conn: &mut PgConnection,
    new: &NewSchedule<'_>,
) -> Result<(Schedule, bool)> {
    let inserted = sqlx::query_as::<_, Schedule>(
        "INSERT INTO schedules \
             (owner_id, date, day_of_week, total_committed_hours, total_available_hours, notes) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT ON CONSTRAINT schedules_owner_date_key DO NOTHING \
         RETURNING *",
    )
    .bind(new.owner_id)
    .bind(new.date)
    .bind(new.day_of_week)
    .bind(new.total_committed_hours)
    .bind(new.total_available_hours)
    .bind(new.notes)
    .fetch_optional(&mut *conn)
    .await
    .context("failed to insert schedule")?;

    if let Some(schedule) = inserted {
        return Ok((schedule, true));
    }

    let existing = sqlx::query_as::<_, Schedule>(
        "SELECT * FROM schedules WHERE owner_id = $1 AND date = $2",
    )
    .bind(new.owner_id)
    .bind(new.date)
    .fetch_one(&mut *conn)
    .await
    .context("failed to fetch existing schedule")?;

    Ok((existing, false))
}

/// Remove every task link of a schedule. Tasks themselves are kept.
pub async fn clear_task_links(conn: &mut PgConnection, schedule_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM schedule_tasks WHERE schedule_id = $1")
        .bind(schedule_id)
        .execute(&mut *conn)
        .await
        .context("failed to clear schedule task links")?;

    Ok(result.rows_affected())
}

/// Link a task to a schedule at `position`.
///
/// Returns `false` if the task was already linked.
pub async fn link_task(
    conn: &mut PgConnection,
    schedule_id: Uuid,
    task_id: Uuid,
    position: i32,
) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO schedule_tasks (schedule_id, task_id, position) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (schedule_id, task_id) DO NOTHING",
    )
    .bind(schedule_id)
    .bind(task_id)
    .bind(position)
    .execute(&mut *conn)
    .await
    .context("failed to link task to schedule")?;

    Ok(result.rows_affected() == 1)
}

/// Overwrite the adaptive list fields of a schedule.
pub async fn update_adaptive_fields(
    conn: &mut PgConnection,
    schedule_id: Uuid,
    updated_commitments: &[String],
    updated_goals: &[String],
    user_behaviour_patterns: &[String],
) -> Result<Schedule> {
    let schedule = sqlx::query_as::<_, Schedule>(
        "UPDATE schedules \
         SET updated_commitments = $2, updated_goals = $3, user_behaviour_patterns = $4, \
             updated_at = now() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(schedule_id)
    .bind(updated_commitments)
    .bind(updated_goals)
    .bind(user_behaviour_patterns)
    .fetch_optional(&mut *conn)
    .await
    .context("failed to update schedule adaptive fields")?;

    schedule.with_context(|| format!("schedule {schedule_id} not found"))
}

/// Fetch the schedule for `(owner, date)`.
pub async fn get_schedule_for_date(
    pool: &PgPool,
    owner_id: Uuid,
    date: NaiveDate,
) -> Result<Option<Schedule>> {
    let schedule = sqlx::query_as::<_, Schedule>(
        "SELECT * FROM schedules WHERE owner_id = $1 AND date = $2",
    )
    .bind(owner_id)
    .bind(date)
    .fetch_optional(pool)
    .await
    .context("failed to fetch schedule")?;

    Ok(schedule)
}

/// List an owner's schedules, newest date first.
pub async fn list_schedules(pool: &PgPool, owner_id: Uuid, limit: i64) -> Result<Vec<Schedule>> {
    let schedules = sqlx::query_as::<_, Schedule>(
        "SELECT * FROM schedules WHERE owner_id = $1 ORDER BY date DESC LIMIT $2",
    )
    .bind(owner_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list schedules")?;

    Ok(schedules)
}

/// Task and high-priority counts for the schedule on `(owner, date)`.
pub async fn schedule_summary(
    pool: &PgPool,
    owner_id: Uuid,
    date: NaiveDate,
) -> Result<Option<ScheduleSummary>> {
    let summary = sqlx::query_as::<_, ScheduleSummary>(
        "SELECT s.date, \
                COUNT(t.id) AS task_count, \
                COUNT(t.id) FILTER (WHERE t.priority IN ('Highest', 'Urgent', 'High')) \
                    AS high_priority_count, \
                s.total_available_hours \
         FROM schedules s \
         LEFT JOIN schedule_tasks st ON st.schedule_id = s.id \
         LEFT JOIN tasks t ON t.id = st.task_id \
         WHERE s.owner_id = $1 AND s.date = $2 \
         GROUP BY s.id",
    )
    .bind(owner_id)
    .bind(date)
    .fetch_optional(pool)
    .await
    .context("failed to summarize schedule")?;

    Ok(summary)
}
