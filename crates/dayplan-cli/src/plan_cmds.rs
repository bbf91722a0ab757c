//! CLI handlers for `dayplan plan` and `dayplan onboard`.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, NaiveDateTime};
use sqlx::PgPool;
use uuid::Uuid;

use dayplan_core::gateway::{FixtureGenerator, GeminiConfig, GeminiGenerator, GenerationGateway};
use dayplan_core::orchestrator::{OnboardRequest, PlanOutcome, PlanRequest, Planner};

/// Flags of `dayplan plan`.
#[derive(Debug, Default)]
pub struct PlanOptions {
    pub reschedule: bool,
    pub override_text: Option<String>,
    pub as_of: Option<String>,
    pub fixture: bool,
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse `--as-of`, defaulting to the local clock.
pub fn parse_as_of(raw: Option<&str>) -> Result<NaiveDateTime> {
    let Some(raw) = raw else {
        return Ok(Local::now().naive_local());
    };
    let raw = raw.trim();
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(Local::now().time()));
    }
    bail!("invalid --as-of {raw:?}; expected YYYY-MM-DDTHH:MM or YYYY-MM-DD")
}

/// Gemini from `config`, or the sample fixture for `fixture_date` when set.
pub fn build_gateway(
    config: &GeminiConfig,
    fixture_date: Option<NaiveDate>,
) -> Result<GenerationGateway> {
    if let Some(date) = fixture_date {
        return Ok(GenerationGateway::new(Arc::new(FixtureGenerator::sample(date))));
    }
    let generator = GeminiGenerator::new(config.clone()).context("failed to set up Gemini")?;
    Ok(GenerationGateway::new(Arc::new(generator)))
}

pub async fn run_plan(
    pool: &PgPool,
    gemini: &GeminiConfig,
    owner: Uuid,
    options: PlanOptions,
) -> Result<()> {
    let as_of = parse_as_of(options.as_of.as_deref())?;
    let gateway = build_gateway(gemini, options.fixture.then_some(as_of.date()))?;
    let planner = Planner::new(pool.clone(), gateway);

    let mut request = PlanRequest::new(owner, as_of);
    if options.reschedule || options.override_text.is_some() {
        request = request.reschedule(options.override_text);
    }

    let outcome = planner.daily_plan(&request).await?;
    print!("{}", render_outcome(&outcome));
    Ok(())
}

pub async fn run_onboard(
    pool: &PgPool,
    gemini: &GeminiConfig,
    owner: Uuid,
    as_of: Option<String>,
    fixture: bool,
) -> Result<()> {
    let as_of = parse_as_of(as_of.as_deref())?;
    let gateway = build_gateway(gemini, fixture.then_some(as_of.date()))?;
    let planner = Planner::new(pool.clone(), gateway);

    let outcome = planner.onboard(&OnboardRequest { owner, as_of }).await?;
    print!("{}", render_outcome(&outcome));
    Ok(())
}

fn render_outcome(outcome: &PlanOutcome) -> String {
    let plan = &outcome.plan;
    let mut out = format!(
        "Plan for {} ({}) [{}]\n",
        plan.date, plan.day_of_week, outcome.source
    );
    out.push_str(&format!(
        "  Committed: {:.1}h  Available: {:.1}h\n",
        plan.total_committed_hours, plan.total_available_hours
    ));
    if !plan.notes.is_empty() {
        out.push_str(&format!("  Notes: {}\n", plan.notes));
    }
    out.push('\n');

    if plan.tasks.is_empty() {
        out.push_str("  (no tasks)\n");
    }
    for task in &plan.tasks {
        let time = task.suggested_time.as_deref().unwrap_or("anytime");
        out.push_str(&format!(
            "  {time:>8}  {:<8} {} ({}m)\n",
            task.priority.to_string(),
            task.task_name,
            task.estimated_duration_minutes
        ));
        if let Some(goal) = &task.related_goal {
            out.push_str(&format!("            goal: {goal}\n"));
        }
    }
    out
}
