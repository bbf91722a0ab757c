//! Reading materialized schedules back and recording task feedback.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use dayplan_db::models::{Schedule, ScheduleSummary, Task};
use dayplan_db::queries::{schedules, tasks};

use crate::error::FeedbackError;

/// A schedule with its tasks in planning order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleWithTasks {
    pub schedule: Schedule,
    pub tasks: Vec<Task>,
}

/// Fetch the owner's schedule for `date` with its linked tasks.
pub async fn get_schedule_with_tasks(
    pool: &PgPool,
    owner: Uuid,
    date: NaiveDate,
) -> Result<Option<ScheduleWithTasks>> {
    let Some(schedule) = schedules::get_schedule_for_date(pool, owner, date).await? else {
        return Ok(None);
    };
    let tasks = tasks::list_tasks_for_schedule(pool, schedule.id).await?;
    Ok(Some(ScheduleWithTasks { schedule, tasks }))
}

/// Task and high-priority counts for the owner's schedule on `date`.
pub async fn schedule_summary(
    pool: &PgPool,
    owner: Uuid,
    date: NaiveDate,
) -> Result<Option<ScheduleSummary>> {
    schedules::schedule_summary(pool, owner, date).await
}

/// Completion, free-text feedback and an optional 1-5 rating for a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFeedback {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub rating: Option<i16>,
}

/// Record feedback on a task owned by `owner`.
pub async fn record_task_feedback(
    pool: &PgPool,
    task_id: Uuid,
    owner: Uuid,
    input: &TaskFeedback,
) -> Result<Task, FeedbackError> {
    if let Some(rating) = input.rating {
        if !(1..=5).contains(&rating) {
            return Err(FeedbackError::InvalidRating(rating));
        }
    }

    let task = tasks::update_feedback(
        pool,
        task_id,
        owner,
        input.completed,
        input.feedback.trim(),
        input.rating,
    )
    .await?
    .ok_or(FeedbackError::TaskNotFound(task_id))?;

    info!(
        owner = %owner,
        task_id = %task.id,
        completed = task.completed,
        rating = ?task.rating,
        "task feedback recorded"
    );
    Ok(task)
}
