//! Plan materialization: reconcile a validated [`DailyPlan`] into the
//! relational schedule/task model.
//!
//! - The schedule for `(owner, date)` is created once; a later plan for the
//!   same day keeps the existing header.
//! - Task links are cleared and re-added in plan order, so re-running the
//!   same plan leaves the same links.
//! - Tasks are reused by name per owner, so feedback and ratings survive
//!   re-planning.
//! - Adaptive lists are always overwritten with the plan's values.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use dayplan_db::models::Schedule;
use dayplan_db::queries::schedules::{self, NewSchedule};
use dayplan_db::queries::tasks::{self, NewTask};

use super::schema::DailyPlan;
use crate::error::PlanError;

/// Parse a plan's `date` field: `YYYY-MM-DD`, or the date part of an
/// RFC 3339 / naive ISO datetime.
pub fn parse_plan_date(raw: &str) -> Result<NaiveDate, PlanError> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }
    Err(PlanError::PlanDateInvalid(raw.to_owned()))
}

/// Parse a suggested time in 12-hour ("7:30 PM") or 24-hour ("19:30") form.
///
/// Anything else yields `None`; an unparseable time never fails a plan.
pub fn parse_suggested_time(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(&trimmed.to_ascii_uppercase(), "%I:%M %p")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .ok()
}

/// Materialize `plan` for `owner` in its own transaction.
pub async fn materialize(
    pool: &PgPool,
    owner: Uuid,
    plan: &DailyPlan,
) -> Result<Schedule, PlanError> {
    let mut tx = pool
        .begin()
        .await
        .context("failed to begin materialization transaction")?;
    let schedule = materialize_in(&mut *tx, owner, plan).await?;
    tx.commit()
        .await
        .context("failed to commit materialized schedule")?;
    Ok(schedule)
}

/// Materialize `plan` for `owner` inside the caller's transaction.
///
/// On error the caller must roll back; nothing here is partial on its own.
pub async fn materialize_in(
    conn: &mut PgConnection,
    owner: Uuid,
    plan: &DailyPlan,
) -> Result<Schedule, PlanError> {
    let date = parse_plan_date(&plan.date)?;

    let day_of_week = date.format("%A").to_string();
    if !plan.day_of_week.trim().eq_ignore_ascii_case(&day_of_week) {
        warn!(
            owner = %owner,
            %date,
            plan_day = %plan.day_of_week,
            derived = %day_of_week,
            "plan day_of_week disagrees with date; using derived value"
        );
    }

    let (schedule, created) = schedules::get_or_create_schedule(
        conn,
        &NewSchedule {
            owner_id: owner,
            date,
            day_of_week: &day_of_week,
            total_committed_hours: plan.total_committed_hours,
            total_available_hours: plan.total_available_hours,
            notes: &plan.notes,
        },
    )
    .await?;

    let cleared = schedules::clear_task_links(conn, schedule.id).await?;
    debug!(schedule_id = %schedule.id, created, cleared, "schedule ready for relinking");

    let mut position: i32 = 0;
    for task in &plan.tasks {
        let (row, _) = tasks::get_or_create_task(
            conn,
            &NewTask {
                owner_id: owner,
                task_name: task.task_name.trim(),
                description: &task.description,
                estimated_duration_minutes: task.estimated_duration_minutes,
                priority: task.priority,
                related_goal: task
                    .related_goal
                    .as_deref()
                    .map(str::trim)
                    .filter(|g| !g.is_empty()),
                suggested_time: task.suggested_time.as_deref().and_then(parse_suggested_time),
                is_flexible: task.is_flexible,
            },
        )
        .await?;

        if schedules::link_task(conn, schedule.id, row.id, position).await? {
            position += 1;
        } else {
            debug!(task = %row.task_name, "duplicate task name in plan; linked once");
        }
    }

    let schedule = schedules::update_adaptive_fields(
        conn,
        schedule.id,
        &plan.updated_commitments,
        &plan.updated_goals,
        &plan.user_behaviour_patterns,
    )
    .await?;

    info!(
        owner = %owner,
        schedule_id = %schedule.id,
        %date,
        tasks = position,
        "plan materialized"
    );
    Ok(schedule)
}
