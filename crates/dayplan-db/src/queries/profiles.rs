//! Database query functions for the `profiles` and `behaviour_patterns` tables.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{BehaviourPattern, Profile, ProfileKind};

/// Replace the owner's profile list of `kind`, creating the row if needed.
pub async fn upsert_profile(
    conn: &mut PgConnection,
    owner_id: Uuid,
    kind: ProfileKind,
    items: &[String],
    source: &str,
) -> Result<Profile> {
    let profile = sqlx::query_as::<_, Profile>(
        "INSERT INTO profiles (owner_id, kind, items, source) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT ON CONSTRAINT profiles_owner_kind_key \
         DO UPDATE SET items = EXCLUDED.items, source = EXCLUDED.source, updated_at = now() \
         RETURNING *",
    )
    .bind(owner_id)
    .bind(kind)
    .bind(items)
    .bind(source)
    .fetch_one(&mut *conn)
    .await
    .with_context(|| format!("failed to upsert {kind} profile"))?;

    Ok(profile)
}

/// Fetch the owner's profile of `kind`.
pub async fn get_profile(
    pool: &PgPool,
    owner_id: Uuid,
    kind: ProfileKind,
) -> Result<Option<Profile>> {
    let profile =
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE owner_id = $1 AND kind = $2")
            .bind(owner_id)
            .bind(kind)
            .fetch_optional(pool)
            .await
            .with_context(|| format!("failed to fetch {kind} profile"))?;

    Ok(profile)
}

/// Append a behaviour pattern observation.
pub async fn insert_behaviour_pattern(
    conn: &mut PgConnection,
    owner_id: Uuid,
    pattern_text: &str,
    date: Option<NaiveDate>,
) -> Result<BehaviourPattern> {
    let pattern = sqlx::query_as::<_, BehaviourPattern>(
        "INSERT INTO behaviour_patterns (owner_id, pattern_text, date) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(owner_id)
    .bind(pattern_text)
    .bind(date)
    .fetch_one(&mut *conn)
    .await
    .context("failed to insert behaviour pattern")?;

    Ok(pattern)
}

/// Newest behaviour patterns for the owner.
pub async fn list_recent_behaviour_patterns(
    pool: &PgPool,
    owner_id: Uuid,
    limit: i64,
) -> Result<Vec<BehaviourPattern>> {
    let patterns = sqlx::query_as::<_, BehaviourPattern>(
        "SELECT * FROM behaviour_patterns \
         WHERE owner_id = $1 \
         ORDER BY created_at DESC \
         LIMIT $2",
    )
    .bind(owner_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list behaviour patterns")?;

    Ok(patterns)
}
