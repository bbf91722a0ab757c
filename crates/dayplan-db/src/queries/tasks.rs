//! Database query functions for the `tasks` table.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Priority, Task};

/// Descriptive fields written when a task is first created.
#[derive(Debug, Clone)]
pub struct NewTask<'a> {
    pub owner_id: Uuid,
    pub task_name: &'a str,
    pub description: &'a str,
    pub estimated_duration_minutes: i32,
    pub priority: Priority,
    pub related_goal: Option<&'a str>,
    pub suggested_time: Option<NaiveTime>,
    pub is_flexible: bool,
}

/// Fetch the owner's task named `new.task_name`, creating it if absent.
///
/// Returns the row and whether it was created. An existing task keeps its
/// description, priority, feedback and rating.
pub async fn get_or_create_task(
    conn: &mut PgConnection,
    new: &NewTask<'_>,
) -> Result<(Task, bool)> {
    let inserted = sqlx::query_as::<_, Task>(
        "INSERT INTO tasks \
             (owner_id, task_name, description, estimated_duration_minutes, priority, \
              related_goal, suggested_time, is_flexible) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT ON CONSTRAINT tasks_owner_name_key DO NOTHING \
         RETURNING *",
    )
    .bind(new.owner_id)
    .bind(new.task_name)
    .bind(new.description)
    .bind(new.estimated_duration_minutes)
    .bind(new.priority)
    .bind(new.related_goal)
    .bind(new.suggested_time)
    .bind(new.is_flexible)
    .fetch_optional(&mut *conn)
    .await
    .with_context(|| format!("failed to insert task {:?}", new.task_name))?;

    if let Some(task) = inserted {
        return Ok((task, true));
    }

    let existing =
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE owner_id = $1 AND task_name = $2")
            .bind(new.owner_id)
            .bind(new.task_name)
            .fetch_one(&mut *conn)
            .await
            .with_context(|| format!("failed to fetch existing task {:?}", new.task_name))?;

    Ok((existing, false))
}

/// Fetch a single task by ID.
pub async fn get_task(pool: &PgPool, id: Uuid) -> Result<Option<Task>> {
    let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch task")?;

    Ok(task)
}

/// Tasks linked to a schedule, in planning order.
pub async fn list_tasks_for_schedule(pool: &PgPool, schedule_id: Uuid) -> Result<Vec<Task>> {
    let tasks = sqlx::query_as::<_, Task>(
        "SELECT t.* FROM tasks t \
         JOIN schedule_tasks st ON st.task_id = t.id \
         WHERE st.schedule_id = $1 \
         ORDER BY st.position ASC",
    )
    .bind(schedule_id)
    .fetch_all(pool)
    .await
    .context("failed to list tasks for schedule")?;

    Ok(tasks)
}

/// Set completion, feedback text and rating on a task owned by `owner_id`.
///
/// Returns `None` when no such task belongs to the owner. `rating` must
/// already be within 1..=5; the CHECK constraint rejects anything else.
pub async fn update_feedback(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
    completed: bool,
    feedback: &str,
    rating: Option<i16>,
) -> Result<Option<Task>> {
    let task = sqlx::query_as::<_, Task>(
        "UPDATE tasks SET completed = $3, feedback = $4, rating = $5 \
         WHERE id = $1 AND owner_id = $2 \
         RETURNING *",
    )
    .bind(id)
    .bind(owner_id)
    .bind(completed)
    .bind(feedback)
    .bind(rating)
    .fetch_optional(pool)
    .await
    .context("failed to update task feedback")?;

    Ok(task)
}

/// Tasks on the owner's schedule for `date` that carry feedback or a rating.
pub async fn list_feedback_for_date(
    pool: &PgPool,
    owner_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<Task>> {
    let tasks = sqlx::query_as::<_, Task>(
        "SELECT t.* FROM tasks t \
         JOIN schedule_tasks st ON st.task_id = t.id \
         JOIN schedules s ON s.id = st.schedule_id \
         WHERE s.owner_id = $1 AND s.date = $2 \
           AND (t.feedback <> '' OR t.rating IS NOT NULL) \
         ORDER BY st.position ASC",
    )
    .bind(owner_id)
    .bind(date)
    .fetch_all(pool)
    .await
    .context("failed to list task feedback")?;

    Ok(tasks)
}
