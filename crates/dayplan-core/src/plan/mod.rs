//! Daily plans: wire schema, prompt building, materialization, onboarding
//! bootstrap and schedule reads.

pub mod context;
pub mod materialize;
pub mod onboarding;
pub mod prompts;
pub mod schedule;
pub mod schema;

pub use context::{PlanContext, TaskFeedbackNote};
pub use materialize::{materialize, materialize_in, parse_plan_date, parse_suggested_time};
pub use onboarding::{ONBOARDING_SOURCE, bootstrap_profiles};
pub use prompts::{build_daily_plan_prompt, build_onboarding_prompt};
pub use schedule::{
    ScheduleWithTasks, TaskFeedback, get_schedule_with_tasks, record_task_feedback,
    schedule_summary,
};
pub use schema::{DailyPlan, DailyTask, InvalidPlan, daily_plan_schema};
