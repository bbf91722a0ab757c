//! CLI handlers for `dayplan schedule` and `dayplan task` subcommands.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use dayplan_core::plan::{self, ScheduleWithTasks, TaskFeedback};
use dayplan_db::queries::schedules;

use crate::plan_cmds::today;
use crate::{ScheduleCommands, TaskCommands};

pub async fn run_schedule_command(
    command: ScheduleCommands,
    pool: &PgPool,
    owner: Uuid,
) -> Result<()> {
    match command {
        ScheduleCommands::Show { date } => {
            let date = match date {
                Some(raw) => parse_date(&raw)?,
                None => today(),
            };
            cmd_show(pool, owner, date).await
        }
        ScheduleCommands::List { limit } => cmd_list(pool, owner, limit).await,
    }
}

pub async fn run_task_command(command: TaskCommands, pool: &PgPool, owner: Uuid) -> Result<()> {
    match command {
        TaskCommands::Feedback {
            task_id,
            completed,
            feedback,
            rating,
        } => {
            let id = Uuid::parse_str(&task_id)
                .with_context(|| format!("invalid task ID: {task_id}"))?;
            let input = TaskFeedback {
                completed,
                feedback,
                rating,
            };
            let task = plan::record_task_feedback(pool, id, owner, &input).await?;
            println!(
                "Task \"{}\" marked {}.",
                task.task_name,
                if task.completed { "complete" } else { "incomplete" }
            );
            Ok(())
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date {raw:?}; expected YYYY-MM-DD"))
}

async fn cmd_show(pool: &PgPool, owner: Uuid, date: NaiveDate) -> Result<()> {
    let Some(found) = plan::get_schedule_with_tasks(pool, owner, date).await? else {
        println!("No schedule for {date}. Run `dayplan plan` to create one.");
        return Ok(());
    };
    let summary = plan::schedule_summary(pool, owner, date).await?;
    let high = summary.map(|s| s.high_priority_count).unwrap_or_default();
    print!("{}", render_schedule(&found, high));
    Ok(())
}

async fn cmd_list(pool: &PgPool, owner: Uuid, limit: i64) -> Result<()> {
    let rows = schedules::list_schedules(pool, owner, limit).await?;
    if rows.is_empty() {
        println!("No schedules.");
        return Ok(());
    }

    println!("{:<12} {:<10} {:>9} {:>9}", "DATE", "DAY", "COMMITTED", "AVAILABLE");
    for s in &rows {
        println!(
            "{:<12} {:<10} {:>8.1}h {:>8.1}h",
            s.date.to_string(),
            s.day_of_week,
            s.total_committed_hours,
            s.total_available_hours
        );
    }
    Ok(())
}

fn render_schedule(found: &ScheduleWithTasks, high_priority: i64) -> String {
    let s = &found.schedule;
    let mut out = format!("Schedule for {} ({})\n", s.date, s.day_of_week);
    out.push_str(&format!(
        "  Committed: {:.1}h  Available: {:.1}h  Tasks: {} ({} high priority)\n",
        s.total_committed_hours,
        s.total_available_hours,
        found.tasks.len(),
        high_priority
    ));
    if !s.notes.is_empty() {
        out.push_str(&format!("  Notes: {}\n", s.notes));
    }
    out.push('\n');

    for task in &found.tasks {
        let mark = if task.completed { "x" } else { " " };
        let time = task
            .suggested_time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string());
        out.push_str(&format!(
            "  [{mark}] {time}  {:<8} {}  ({})\n",
            task.priority.to_string(),
            task.task_name,
            task.id
        ));
        if let Some(rating) = task.rating {
            out.push_str(&format!("        rated {rating}/5"));
            if !task.feedback.is_empty() {
                out.push_str(&format!(": {}", task.feedback));
            }
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, Utc};

    use dayplan_db::models::{Priority, Schedule, Task};

    use super::*;

    fn schedule() -> Schedule {
        Schedule {
            id: Uuid::nil(),
            owner_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            day_of_week: "Monday".into(),
            total_committed_hours: 1.5,
            total_available_hours: 8.0,
            notes: "steady".into(),
            updated_commitments: vec![],
            updated_goals: vec![],
            user_behaviour_patterns: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn task(name: &str, completed: bool, rating: Option<i16>) -> Task {
        Task {
            id: Uuid::nil(),
            owner_id: Uuid::nil(),
            task_name: name.into(),
            description: String::new(),
            estimated_duration_minutes: 30,
            priority: Priority::High,
            related_goal: None,
            suggested_time: NaiveTime::from_hms_opt(9, 0, 0),
            is_flexible: true,
            completed,
            feedback: "went fine".into(),
            rating,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn dates_must_be_iso() {
        assert_eq!(
            parse_date(" 2025-03-10 ").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert!(parse_date("03/10/2025").is_err());
    }

    #[test]
    fn render_marks_completed_tasks_and_ratings() {
        let found = ScheduleWithTasks {
            schedule: schedule(),
            tasks: vec![task("Write report", true, Some(4)), task("Email", false, None)],
        };
        let text = render_schedule(&found, 2);
        assert!(text.starts_with("Schedule for 2025-03-10 (Monday)"));
        assert!(text.contains("Tasks: 2 (2 high priority)"));
        assert!(text.contains("[x] 09:00"));
        assert!(text.contains("[ ] 09:00"));
        assert!(text.contains("rated 4/5: went fine"));
        assert_eq!(text.matches("rated").count(), 1);
    }
}
