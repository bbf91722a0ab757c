//! Plan orchestrator: serves a day's plan from cache when possible and
//! otherwise builds a prompt, generates at most once per fingerprint, and
//! materializes the result.
//!
//! Cache lookup, generation, resolution and materialization share one
//! transaction. A failure anywhere rolls all of it back, so no pending
//! entry or half-written schedule is left behind. A concurrent request for
//! the same fingerprint blocks on the uncommitted cache key and then sees
//! the resolved response.

use std::fmt;

use anyhow::Context;
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use dayplan_db::models::{CacheEntry, RequestKind};
use dayplan_db::queries::cache_entries;

use crate::cache::{self, CacheRequest};
use crate::error::{CaptureError, PlanError};
use crate::gateway::GenerationGateway;
use crate::plan::{
    DailyPlan, PlanContext, bootstrap_profiles, build_daily_plan_prompt, build_onboarding_prompt,
    context, materialize_in, parse_plan_date,
};

/// A request for the plan of the day containing `as_of`.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub owner: Uuid,
    /// The caller's "now". The plan date is `as_of.date()`.
    pub as_of: NaiveDateTime,
    /// Regenerate even if a plan for the day is cached.
    pub reschedule: bool,
    /// Override text for a reschedule. `None` falls back to the owner's
    /// latest captured override; blank text means "no override".
    pub override_content: Option<String>,
}

impl PlanRequest {
    pub fn new(owner: Uuid, as_of: NaiveDateTime) -> Self {
        Self {
            owner,
            as_of,
            reschedule: false,
            override_content: None,
        }
    }

    pub fn reschedule(mut self, override_content: Option<String>) -> Self {
        self.reschedule = true;
        self.override_content = override_content;
        self
    }
}

/// A first-time onboarding request.
#[derive(Debug, Clone)]
pub struct OnboardRequest {
    pub owner: Uuid,
    pub as_of: NaiveDateTime,
}

/// Where a returned plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    /// The day's resolved plan, served without building a prompt.
    Cached,
    /// The prompt's fingerprint was already resolved; re-materialized.
    CacheHit,
    /// Freshly generated.
    Generated,
}

impl fmt::Display for PlanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cached => "cached",
            Self::CacheHit => "cache_hit",
            Self::Generated => "generated",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub plan: DailyPlan,
    pub source: PlanSource,
    pub cache_entry_id: Uuid,
}

/// Drives daily-plan and onboarding requests.
#[derive(Debug, Clone)]
pub struct Planner {
    pool: PgPool,
    gateway: GenerationGateway,
}

impl Planner {
    pub fn new(pool: PgPool, gateway: GenerationGateway) -> Self {
        Self { pool, gateway }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn gateway(&self) -> &GenerationGateway {
        &self.gateway
    }

    /// Produce the plan for `request.as_of.date()`.
    pub async fn daily_plan(&self, request: &PlanRequest) -> Result<PlanOutcome, PlanError> {
        let owner = request.owner;
        let date = request.as_of.date();

        let cached = cache_entries::latest_resolved_for_date(
            &self.pool,
            owner,
            RequestKind::Summary,
            date,
        )
        .await?;

        let (override_text, capture_override) = if request.reschedule {
            self.pick_override(request).await?
        } else {
            (None, false)
        };

        if override_text.is_none() {
            if let Some(entry) = cached {
                return self.serve_cached(owner, entry).await;
            }
        }

        let context = PlanContext::gather(&self.pool, owner, date).await?;
        let prompt = build_daily_plan_prompt(&context, request.as_of, override_text.as_deref());
        let scope = format!("day:{}", date.format("%Y-%m-%d"));
        let cache_request = CacheRequest {
            owner: Some(owner),
            kind: RequestKind::Summary,
            content: &prompt,
            scope: Some(&scope),
            ignore_time: true,
            synthetic: self.gateway.is_synthetic(),
        };

        let captured = if capture_override {
            override_text.as_deref()
        } else {
            None
        };
        self.run(owner, &cache_request, captured, false).await
    }

    /// Produce the onboarding plan from the owner's newest goal and
    /// commitment input. Profiles are seeded only when the plan is freshly
    /// generated.
    pub async fn onboard(&self, request: &OnboardRequest) -> Result<PlanOutcome, PlanError> {
        let owner = request.owner;
        let (goals, commitments) = context::latest_inputs(&self.pool, owner).await?;
        let prompt =
            build_onboarding_prompt(goals.as_deref(), commitments.as_deref(), request.as_of);
        let cache_request = CacheRequest {
            owner: Some(owner),
            kind: RequestKind::Onboarding,
            content: &prompt,
            scope: None,
            ignore_time: true,
            synthetic: self.gateway.is_synthetic(),
        };
        self.run(owner, &cache_request, None, true).await
    }

    /// Store free-text goal, commitment or override input for `owner`.
    pub async fn capture_input(
        &self,
        owner: Uuid,
        kind: RequestKind,
        text: &str,
    ) -> Result<(CacheEntry, bool), CaptureError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("failed to acquire connection")?;
        cache::capture_input(&mut conn, owner, kind, text).await
    }

    /// Decide the override for a reschedule. Returns the text and whether it
    /// is new input that should be captured.
    async fn pick_override(
        &self,
        request: &PlanRequest,
    ) -> Result<(Option<String>, bool), PlanError> {
        match request.override_content.as_deref().map(str::trim) {
            Some("") => Ok((None, false)),
            Some(text) => Ok((Some(text.to_owned()), true)),
            None => {
                let latest =
                    cache_entries::latest_for_owner(&self.pool, request.owner, RequestKind::Override)
                        .await?;
                let text = latest
                    .map(|e| e.raw_content.trim().to_owned())
                    .filter(|t| !t.is_empty());
                Ok((text, false))
            }
        }
    }

    async fn serve_cached(&self, owner: Uuid, entry: CacheEntry) -> Result<PlanOutcome, PlanError> {
        let plan = stored_plan(&entry)?;
        let entry = cache_entries::record_hit(&self.pool, entry.id).await?;
        info!(
            owner = %owner,
            entry_id = %entry.id,
            use_count = entry.use_count,
            source = %PlanSource::Cached,
            "serving cached plan"
        );
        Ok(PlanOutcome {
            plan,
            source: PlanSource::Cached,
            cache_entry_id: entry.id,
        })
    }

    async fn run(
        &self,
        owner: Uuid,
        request: &CacheRequest<'_>,
        captured_override: Option<&str>,
        bootstrap: bool,
    ) -> Result<PlanOutcome, PlanError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin plan transaction")?;

        if let Some(text) = captured_override {
            cache::capture_input(&mut *tx, owner, RequestKind::Override, text)
                .await
                .map_err(|e| PlanError::Storage(e.into()))?;
        }

        let (entry, created) = cache::get_or_create(&mut *tx, request).await?;

        let (plan, source) = if entry.is_resolved() {
            (stored_plan(&entry)?, PlanSource::CacheHit)
        } else {
            if !created {
                info!(owner = %owner, entry_id = %entry.id, "pending cache entry; generating");
            }
            self.gateway.ensure_available()?;
            let plan = self.gateway.generate_plan(request.content).await?;
            let response = serde_json::to_value(&plan).context("failed to encode plan")?;
            cache_entries::resolve(&mut *tx, entry.id, &response)
                .await?
                .with_context(|| format!("cache entry {} is already resolved", entry.id))?;

            if bootstrap {
                let date = parse_plan_date(&plan.date)?;
                bootstrap_profiles(&mut *tx, owner, &plan, date).await?;
            }
            (plan, PlanSource::Generated)
        };

        materialize_in(&mut *tx, owner, &plan).await?;
        tx.commit().await.context("failed to commit plan")?;

        info!(
            owner = %owner,
            kind = %request.kind,
            entry_id = %entry.id,
            %source,
            generator = self.gateway.generator_name(),
            "plan ready"
        );
        Ok(PlanOutcome {
            plan,
            source,
            cache_entry_id: entry.id,
        })
    }
}

/// Decode a resolved entry's response.
fn stored_plan(entry: &CacheEntry) -> Result<DailyPlan, PlanError> {
    let Some(response) = entry.response.as_ref() else {
        return Err(PlanError::Storage(anyhow::anyhow!(
            "cache entry {} has no response",
            entry.id
        )));
    };
    serde_json::from_value(response.clone()).map_err(|e| PlanError::GenerationValidation {
        raw: response.to_string(),
        reason: format!("cached response is not a plan: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use serde_json::json;

    use super::*;

    fn entry(response: Option<serde_json::Value>) -> CacheEntry {
        CacheEntry {
            id: Uuid::new_v4(),
            owner_id: Some(Uuid::new_v4()),
            request_kind: RequestKind::Summary,
            raw_content: "prompt".into(),
            fingerprint: "0".repeat(64),
            response,
            use_count: 0,
            is_synthetic: false,
            created_at: Utc::now(),
            resolved_at: None,
            last_used_at: Utc::now(),
        }
    }

    #[test]
    fn stored_plan_decodes_resolved_response() {
        let plan = stored_plan(&entry(Some(json!({
            "date": "2025-03-10",
            "day_of_week": "Monday",
            "tasks": []
        }))))
        .unwrap();
        assert_eq!(plan.date, "2025-03-10");
    }

    #[test]
    fn stored_plan_rejects_pending_and_corrupt_entries() {
        assert!(matches!(stored_plan(&entry(None)), Err(PlanError::Storage(_))));
        assert!(matches!(
            stored_plan(&entry(Some(json!({"tasks": "nope"})))),
            Err(PlanError::GenerationValidation { .. })
        ));
    }

    #[test]
    fn reschedule_builder_sets_override() {
        let as_of = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let req = PlanRequest::new(Uuid::nil(), as_of).reschedule(Some("dentist".into()));
        assert!(req.reschedule);
        assert_eq!(req.override_content.as_deref(), Some("dentist"));
    }

    #[test]
    fn plan_source_serializes_snake_case() {
        assert_eq!(serde_json::to_value(PlanSource::CacheHit).unwrap(), json!("cache_hit"));
        assert_eq!(PlanSource::Generated.to_string(), "generated");
    }
}
