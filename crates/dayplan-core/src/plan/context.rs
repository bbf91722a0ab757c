//! Read-only context gathered before building a daily plan prompt.

use anyhow::Result;
use chrono::{Days, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use dayplan_db::models::{ProfileKind, RequestKind, Task};
use dayplan_db::queries::{cache_entries, profiles, tasks};

/// How many of the newest inputs and patterns feed a prompt.
pub const CONTEXT_LIMIT: i64 = 10;

/// Everything a daily plan prompt is built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanContext {
    /// Newest first.
    pub goal_inputs: Vec<String>,
    pub commitment_inputs: Vec<String>,
    pub goal_profile: Vec<String>,
    pub commitment_profile: Vec<String>,
    pub behaviour_patterns: Vec<String>,
    /// Feedback left on the previous day's tasks, in planning order.
    pub previous_feedback: Vec<TaskFeedbackNote>,
}

/// Feedback an owner left on one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFeedbackNote {
    pub task_name: String,
    pub completed: bool,
    pub feedback: String,
    pub rating: Option<i16>,
}

impl From<Task> for TaskFeedbackNote {
    fn from(task: Task) -> Self {
        Self {
            task_name: task.task_name,
            completed: task.completed,
            feedback: task.feedback,
            rating: task.rating,
        }
    }
}

impl PlanContext {
    /// Collect the owner's context for planning `date`.
    pub async fn gather(pool: &PgPool, owner: Uuid, date: NaiveDate) -> Result<Self> {
        let goal_inputs = raw_inputs(pool, owner, RequestKind::Goal).await?;
        let commitment_inputs = raw_inputs(pool, owner, RequestKind::Commitment).await?;

        let goal_profile = profiles::get_profile(pool, owner, ProfileKind::Goals)
            .await?
            .map(|p| p.items)
            .unwrap_or_default();
        let commitment_profile = profiles::get_profile(pool, owner, ProfileKind::Commitments)
            .await?
            .map(|p| p.items)
            .unwrap_or_default();

        let behaviour_patterns =
            profiles::list_recent_behaviour_patterns(pool, owner, CONTEXT_LIMIT)
                .await?
                .into_iter()
                .map(|p| p.pattern_text)
                .collect();

        let previous_feedback = match date.checked_sub_days(Days::new(1)) {
            Some(yesterday) => tasks::list_feedback_for_date(pool, owner, yesterday)
                .await?
                .into_iter()
                .map(TaskFeedbackNote::from)
                .collect(),
            None => Vec::new(),
        };

        Ok(Self {
            goal_inputs,
            commitment_inputs,
            goal_profile,
            commitment_profile,
            behaviour_patterns,
            previous_feedback,
        })
    }
}

async fn raw_inputs(pool: &PgPool, owner: Uuid, kind: RequestKind) -> Result<Vec<String>> {
    let entries = cache_entries::list_for_owner(pool, owner, Some(kind), CONTEXT_LIMIT).await?;
    Ok(entries.into_iter().map(|e| e.raw_content).collect())
}

/// Newest goal and commitment input, used by onboarding.
pub async fn latest_inputs(pool: &PgPool, owner: Uuid) -> Result<(Option<String>, Option<String>)> {
    let goals = cache_entries::latest_for_owner(pool, owner, RequestKind::Goal)
        .await?
        .map(|e| e.raw_content);
    let commitments = cache_entries::latest_for_owner(pool, owner, RequestKind::Commitment)
        .await?
        .map(|e| e.raw_content);
    Ok((goals, commitments))
}
