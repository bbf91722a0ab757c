//! Database query functions for the `cache_entries` table.
//!
//! Functions that take `&mut PgConnection` are meant to run inside the
//! caller's transaction; the rest read through the pool.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{CacheEntry, RequestKind};

/// Name of the scoped uniqueness constraint on `(owner_id, fingerprint, request_kind)`.
pub const UNIQUE_CONSTRAINT: &str = "cache_entries_owner_fingerprint_kind_key";

/// Insert a pending entry unless one already exists for the same
/// `(owner, fingerprint, kind)`.
///
/// Returns `None` when the key is taken. A concurrent uncommitted insert of
/// the same key blocks this statement until that transaction finishes.
pub async fn insert_if_absent(
    conn: &mut PgConnection,
    owner_id: Option<Uuid>,
    kind: RequestKind,
    raw_content: &str,
    fingerprint: &str,
    is_synthetic: bool,
) -> Result<Option<CacheEntry>> {
    let entry = sqlx::query_as::<_, CacheEntry>(
        "INSERT INTO cache_entries (owner_id, request_kind, raw_content, fingerprint, is_synthetic) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT ON CONSTRAINT cache_entries_owner_fingerprint_kind_key DO NOTHING \
         RETURNING *",
    )
    .bind(owner_id)
    .bind(kind)
    .bind(raw_content)
    .bind(fingerprint)
    .bind(is_synthetic)
    .fetch_optional(&mut *conn)
    .await
    .context("failed to insert cache entry")?;

    Ok(entry)
}

/// Count a hit against the entry with the given key and return it.
pub async fn increment_use_count(
    conn: &mut PgConnection,
    owner_id: Option<Uuid>,
    kind: RequestKind,
    fingerprint: &str,
) -> Result<CacheEntry> {
    let entry = sqlx::query_as::<_, CacheEntry>(
        "UPDATE cache_entries SET use_count = use_count + 1, last_used_at = now() \
         WHERE owner_id IS NOT DISTINCT FROM $1 AND fingerprint = $2 AND request_kind = $3 \
         RETURNING *",
    )
    .bind(owner_id)
    .bind(fingerprint)
    .bind(kind)
    .fetch_optional(&mut *conn)
    .await
    .context("failed to increment cache entry use count")?;

    entry.with_context(|| format!("cache entry {fingerprint} ({kind}) vanished after conflict"))
}

/// Count a hit against an entry served without a lookup.
pub async fn record_hit(pool: &PgPool, id: Uuid) -> Result<CacheEntry> {
    let entry = sqlx::query_as::<_, CacheEntry>(
        "UPDATE cache_entries SET use_count = use_count + 1, last_used_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to record cache hit")?;

    entry.with_context(|| format!("cache entry {id} not found"))
}

/// Store the response for a pending entry.
///
/// Returns `None` if the entry does not exist or is already resolved; a
/// resolved response is never overwritten.
pub async fn resolve(
    conn: &mut PgConnection,
    id: Uuid,
    response: &serde_json::Value,
) -> Result<Option<CacheEntry>> {
    let entry = sqlx::query_as::<_, CacheEntry>(
        "UPDATE cache_entries SET response = $2, resolved_at = now() \
         WHERE id = $1 AND response IS NULL \
         RETURNING *",
    )
    .bind(id)
    .bind(response)
    .fetch_optional(&mut *conn)
    .await
    .context("failed to resolve cache entry")?;

    Ok(entry)
}

/// Fetch a single entry by ID.
pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<CacheEntry>> {
    let entry = sqlx::query_as::<_, CacheEntry>("SELECT * FROM cache_entries WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch cache entry")?;

    Ok(entry)
}

/// Most recently resolved entry of `kind` for `owner` whose response
/// carries a plan date equal to `date`.
pub async fn latest_resolved_for_date(
    pool: &PgPool,
    owner_id: Uuid,
    kind: RequestKind,
    date: NaiveDate,
) -> Result<Option<CacheEntry>> {
    let entry = sqlx::query_as::<_, CacheEntry>(
        "SELECT * FROM cache_entries \
         WHERE owner_id = $1 AND request_kind = $2 AND response IS NOT NULL \
           AND left(response->>'date', 10) = $3 \
         ORDER BY resolved_at DESC, created_at DESC \
         LIMIT 1",
    )
    .bind(owner_id)
    .bind(kind)
    .bind(date.format("%Y-%m-%d").to_string())
    .fetch_optional(pool)
    .await
    .context("failed to look up cached plan for date")?;

    Ok(entry)
}

/// Most recently used entry of `kind` for `owner`, resolved or not.
///
/// A repeated capture bumps `last_used_at`, so re-entering older input makes
/// it the latest again.
pub async fn latest_for_owner(
    pool: &PgPool,
    owner_id: Uuid,
    kind: RequestKind,
) -> Result<Option<CacheEntry>> {
    let entry = sqlx::query_as::<_, CacheEntry>(
        "SELECT * FROM cache_entries \
         WHERE owner_id = $1 AND request_kind = $2 \
         ORDER BY last_used_at DESC, created_at DESC \
         LIMIT 1",
    )
    .bind(owner_id)
    .bind(kind)
    .fetch_optional(pool)
    .await
    .context("failed to fetch latest cache entry")?;

    Ok(entry)
}

/// Newest entries for `owner`, optionally restricted to one kind.
pub async fn list_for_owner(
    pool: &PgPool,
    owner_id: Uuid,
    kind: Option<RequestKind>,
    limit: i64,
) -> Result<Vec<CacheEntry>> {
    let entries = sqlx::query_as::<_, CacheEntry>(
        "SELECT * FROM cache_entries \
         WHERE owner_id = $1 AND ($2::text IS NULL OR request_kind = $2) \
         ORDER BY created_at DESC \
         LIMIT $3",
    )
    .bind(owner_id)
    .bind(kind)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to list cache entries")?;

    Ok(entries)
}
