//! Owner-scoped prompt cache over the `cache_entries` table.
//!
//! Lookups are atomic: the first caller for a key inserts a pending entry
//! and every later caller counts a hit against it. Callers run these inside
//! their own transaction, so a pending entry only becomes visible to others
//! together with its response.

use anyhow::Result;
use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

use dayplan_db::models::{CacheEntry, RequestKind};
use dayplan_db::queries::cache_entries;

use crate::error::CaptureError;
use crate::fingerprint::fingerprint_content;

/// A cache lookup key plus what to store on a miss.
#[derive(Debug, Clone)]
pub struct CacheRequest<'a> {
    /// `None` for global entries.
    pub owner: Option<Uuid>,
    pub kind: RequestKind,
    /// Raw, un-normalized content. Stored verbatim.
    pub content: &'a str,
    pub scope: Option<&'a str>,
    /// Normalize clock-dependent fragments before fingerprinting.
    pub ignore_time: bool,
    /// Mark a newly created entry as produced by a fixture generator.
    pub synthetic: bool,
}

impl CacheRequest<'_> {
    pub fn fingerprint(&self) -> String {
        fingerprint_content(self.scope, self.kind, self.content, self.ignore_time)
    }
}

/// Fetch the entry for `request`, creating a pending one on a miss.
///
/// Returns the entry and whether it was created. A hit increments
/// `use_count`. Losing an insert race is a hit, never an error.
pub async fn get_or_create(
    conn: &mut PgConnection,
    request: &CacheRequest<'_>,
) -> Result<(CacheEntry, bool)> {
    let fingerprint = request.fingerprint();

    if let Some(entry) = cache_entries::insert_if_absent(
        conn,
        request.owner,
        request.kind,
        request.content,
        &fingerprint,
        request.synthetic,
    )
    .await?
    {
        debug!(entry_id = %entry.id, kind = %request.kind, %fingerprint, "cache miss");
        return Ok((entry, true));
    }

    let entry =
        cache_entries::increment_use_count(conn, request.owner, request.kind, &fingerprint).await?;
    debug!(
        entry_id = %entry.id,
        kind = %request.kind,
        %fingerprint,
        use_count = entry.use_count,
        "cache hit"
    );
    Ok((entry, false))
}

/// Store free-text user input as a cache entry.
///
/// Input is keyed on its exact text with no scope, so repeating it counts a
/// hit instead of adding a row.
pub async fn capture_input(
    conn: &mut PgConnection,
    owner: Uuid,
    kind: RequestKind,
    text: &str,
) -> Result<(CacheEntry, bool), CaptureError> {
    if !kind.is_user_input() {
        return Err(CaptureError::NotUserInput(kind));
    }
    let text = text.trim();
    if text.is_empty() {
        return Err(CaptureError::Blank);
    }

    let request = CacheRequest {
        owner: Some(owner),
        kind,
        content: text,
        scope: None,
        ignore_time: false,
        synthetic: false,
    };
    Ok(get_or_create(conn, &request).await?)
}
