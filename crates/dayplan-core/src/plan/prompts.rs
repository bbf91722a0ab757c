//! Prompt builders for daily plans and onboarding.
//!
//! Every clock-dependent line sits in the header block ahead of the first
//! blank line, in a form [`crate::fingerprint::normalize_header`]
//! recognises, so cached prompts survive the passage of time within a day.
//! User-supplied text only appears after the header.

use std::fmt::Write as _;

use chrono::{NaiveDateTime, Timelike};

use super::context::{PlanContext, TaskFeedbackNote};

const PRIORITY_RULES: &str = "Use only these priorities: \"Highest\", \"Urgent\", \"High\", \"Medium\", \"Low\".";

fn hours_left_today(as_of: NaiveDateTime) -> f64 {
    24.0 - f64::from(as_of.hour()) - f64::from(as_of.minute()) / 60.0
}

fn push_section(out: &mut String, title: &str, items: &[String], empty: &str) {
    let _ = writeln!(out, "\n## {title}");
    if items.is_empty() {
        let _ = writeln!(out, "{empty}");
    }
    for item in items {
        let _ = writeln!(out, "- {}", item.trim());
    }
}

fn feedback_line(note: &TaskFeedbackNote) -> String {
    let mut line = format!(
        "- {}: {}",
        note.task_name,
        if note.completed { "completed" } else { "not completed" }
    );
    if let Some(rating) = note.rating {
        let _ = write!(line, ", rated {rating}/5");
    }
    if !note.feedback.trim().is_empty() {
        let _ = write!(line, ", \"{}\"", note.feedback.trim());
    }
    line
}

/// Build the prompt for planning the day of `as_of`.
///
/// A non-blank `override_text` is embedded verbatim ahead of every other
/// task source and marked as taking precedence.
pub fn build_daily_plan_prompt(
    context: &PlanContext,
    as_of: NaiveDateTime,
    override_text: Option<&str>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# DAILY PLAN");
    let _ = writeln!(
        out,
        "Date to plan for: {} ({})",
        as_of.format("%Y-%m-%d"),
        as_of.format("%A")
    );
    let _ = writeln!(out, "Current time: {}", as_of.format("%I:%M %p"));
    let _ = writeln!(out, "Remaining hours today: {:.1}", hours_left_today(as_of));

    if let Some(text) = override_text.map(str::trim).filter(|t| !t.is_empty()) {
        let _ = writeln!(out, "\n## OVERRIDE (highest priority, schedule every item)");
        let _ = writeln!(out, "{text}");
    }

    push_section(&mut out, "GOALS", &context.goal_inputs, "No goals recorded yet.");
    push_section(
        &mut out,
        "REFINED GOALS",
        &context.goal_profile,
        "No refined goals yet.",
    );
    push_section(
        &mut out,
        "COMMITMENTS",
        &context.commitment_inputs,
        "No commitments recorded yet.",
    );
    push_section(
        &mut out,
        "REFINED COMMITMENTS",
        &context.commitment_profile,
        "No refined commitments yet.",
    );
    push_section(
        &mut out,
        "BEHAVIOUR PATTERNS",
        &context.behaviour_patterns,
        "No behaviour patterns detected yet.",
    );

    let feedback: Vec<String> = context.previous_feedback.iter().map(feedback_line).collect();
    let _ = writeln!(out, "\n## PREVIOUS DAY'S TASK FEEDBACK");
    if feedback.is_empty() {
        let _ = writeln!(out, "No task feedback provided yet.");
    }
    for line in &feedback {
        let _ = writeln!(out, "{line}");
    }

    let _ = writeln!(out, "\n## RULES");
    let _ = writeln!(out, "{PRIORITY_RULES}");
    let _ = writeln!(
        out,
        "Keep low-rated tasks simpler, carry missed tasks forward gently, and fit the plan \
         within the remaining hours."
    );
    let _ = writeln!(
        out,
        "Return a single JSON object matching the DailyPlan schema."
    );
    out
}

/// Build the first-time onboarding prompt from the newest goal and
/// commitment input.
pub fn build_onboarding_prompt(
    goals: Option<&str>,
    commitments: Option<&str>,
    as_of: NaiveDateTime,
) -> String {
    // The planning window runs until 3 AM the next day.
    let available = hours_left_today(as_of) + 3.0;
    let goals = goals
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .unwrap_or("No specific goals provided. Help the user identify priorities.");
    let commitments = commitments
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("No fixed commitments provided. Assume a flexible schedule.");

    let mut out = String::new();
    let _ = writeln!(out, "# ONBOARDING PLAN");
    let _ = writeln!(
        out,
        "Current time: {} ({})",
        as_of.format("%I:%M %p"),
        as_of.format("%A")
    );
    let _ = writeln!(out, "Date: {}", as_of.format("%Y-%m-%d"));
    let _ = writeln!(out, "Total available hours: ~{available:.1}");
    let _ = writeln!(out, "\n## GOALS\n{goals}");
    let _ = writeln!(out, "\n## COMMITMENTS\n{commitments}");
    let _ = writeln!(out, "\n## RULES");
    let _ = writeln!(out, "{PRIORITY_RULES}");
    let _ = writeln!(
        out,
        "Refine the goals into updated_goals, the commitments into updated_commitments, \
         and record observed habits in user_behaviour_patterns."
    );
    let _ = writeln!(
        out,
        "Return a single JSON object matching the DailyPlan schema."
    );
    out
}
