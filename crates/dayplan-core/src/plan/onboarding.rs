//! Profile bootstrap from a freshly generated onboarding plan.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::PgConnection;
use tracing::info;
use uuid::Uuid;

use dayplan_db::models::ProfileKind;
use dayplan_db::queries::profiles;

use super::schema::DailyPlan;

/// `source` recorded on profiles written by onboarding.
pub const ONBOARDING_SOURCE: &str = "onboarding_refined";

/// Seed the owner's goal and commitment profiles and behaviour patterns
/// from `plan`.
///
/// An empty goal or commitment list leaves that profile untouched. Patterns
/// are stored as a single newline-joined row dated `date`; an
/// empty pattern list adds nothing.
pub async fn bootstrap_profiles(
    conn: &mut PgConnection,
    owner: Uuid,
    plan: &DailyPlan,
    date: NaiveDate,
) -> Result<()> {
    for (kind, items) in [
        (ProfileKind::Goals, &plan.updated_goals),
        (ProfileKind::Commitments, &plan.updated_commitments),
    ] {
        if !items.is_empty() {
            profiles::upsert_profile(conn, owner, kind, items, ONBOARDING_SOURCE).await?;
        }
    }

    let patterns: Vec<&str> = plan
        .user_behaviour_patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if !patterns.is_empty() {
        profiles::insert_behaviour_pattern(conn, owner, &patterns.join("\n"), Some(date)).await?;
    }

    info!(
        owner = %owner,
        goals = plan.updated_goals.len(),
        commitments = plan.updated_commitments.len(),
        patterns = patterns.len(),
        "profiles bootstrapped from onboarding"
    );
    Ok(())
}
