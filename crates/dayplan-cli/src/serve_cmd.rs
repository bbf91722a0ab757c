use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use dayplan_core::error::{CaptureError, FeedbackError, PlanError};
use dayplan_core::gateway::GenerationGateway;
use dayplan_core::orchestrator::{OnboardRequest, PlanOutcome, PlanRequest, Planner};
use dayplan_core::plan::{self, ScheduleWithTasks, TaskFeedback};
use dayplan_db::models::{CacheEntry, RequestKind, ScheduleSummary, Task};
use dayplan_db::queries::cache_entries;

use crate::plan_cmds::parse_as_of;

/// Header carrying the authenticated owner, set by the fronting proxy.
pub const USER_HEADER: &str = "x-dayplan-user";

/// Response header naming where a plan came from: `generated`, `cached` or
/// `cache_hit`.
pub const SOURCE_HEADER: &str = "x-dayplan-source";

/// Response header carrying the ID of the cache entry behind a plan.
pub const CACHE_ENTRY_HEADER: &str = "x-dayplan-cache-entry";

const DEFAULT_PROMPT_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::GenerationUnavailable(_) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            PlanError::GenerationValidation { .. } => {
                Self::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
            PlanError::PlanDateInvalid(_) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            PlanError::Storage(e) => Self::internal(e),
        }
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Storage(e) => Self::internal(e),
            other => Self::bad_request(other.to_string()),
        }
    }
}

impl From<FeedbackError> for AppError {
    fn from(err: FeedbackError) -> Self {
        match err {
            FeedbackError::InvalidRating(_) => Self::bad_request(err.to_string()),
            FeedbackError::TaskNotFound(_) => Self::not_found(err.to_string()),
            FeedbackError::Storage(e) => Self::internal(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Owner extraction
// ---------------------------------------------------------------------------

/// The requesting owner, read from [`USER_HEADER`].
pub struct Owner(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let unauthorized = || AppError::new(StatusCode::UNAUTHORIZED, "missing or invalid user");
        let value = parts.headers.get(USER_HEADER).ok_or_else(unauthorized)?;
        let raw = value.to_str().map_err(|_| unauthorized())?;
        let id = Uuid::parse_str(raw.trim()).map_err(|_| unauthorized())?;
        Ok(Self(id))
    }
}

// ---------------------------------------------------------------------------
// Request and response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct DailyPlanQuery {
    #[serde(default)]
    pub reschedule: bool,
    #[serde(default, rename = "override")]
    pub override_text: Option<String>,
    #[serde(default)]
    pub as_of: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OnboardQuery {
    #[serde(default)]
    pub as_of: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CaptureBody {
    pub kind: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub entry: CacheEntry,
    pub created: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct PromptListQuery {
    pub kind: Option<String>,
    pub limit: Option<i64>,
}

/// A plan body with its provenance moved into response headers.
#[derive(Debug)]
pub struct PlanResponse(pub PlanOutcome);

impl IntoResponse for PlanResponse {
    fn into_response(self) -> Response {
        let PlanOutcome {
            plan,
            source,
            cache_entry_id,
        } = self.0;
        let headers = [
            (SOURCE_HEADER, source.to_string()),
            (CACHE_ENTRY_HEADER, cache_entry_id.to_string()),
        ];
        (headers, Json(plan)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    #[serde(flatten)]
    pub schedule: ScheduleWithTasks,
    pub summary: Option<ScheduleSummary>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(planner: Planner) -> Router {
    Router::new()
        .route("/api/daily-plan", get(daily_plan))
        .route("/api/onboard", get(onboard))
        .route("/api/prompts", post(capture_prompt).get(list_prompts))
        .route("/api/schedules/{date}", get(get_schedule))
        .route("/api/tasks/{id}/feedback", post(task_feedback))
        .layer(CorsLayer::permissive())
        .with_state(planner)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(pool: PgPool, gateway: GenerationGateway, bind: &str, port: u16) -> Result<()> {
    let generator = gateway.generator_name().to_owned();
    let app = build_router(Planner::new(pool, gateway));
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!(%generator, "dayplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("dayplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn daily_plan(
    State(planner): State<Planner>,
    Owner(owner): Owner,
    Query(query): Query<DailyPlanQuery>,
) -> Result<PlanResponse, AppError> {
    let as_of =
        parse_as_of(query.as_of.as_deref()).map_err(|e| AppError::bad_request(e.to_string()))?;
    let mut request = PlanRequest::new(owner, as_of);
    if query.reschedule || query.override_text.is_some() {
        request = request.reschedule(query.override_text);
    }
    Ok(PlanResponse(planner.daily_plan(&request).await?))
}

async fn onboard(
    State(planner): State<Planner>,
    Owner(owner): Owner,
    Query(query): Query<OnboardQuery>,
) -> Result<PlanResponse, AppError> {
    let as_of =
        parse_as_of(query.as_of.as_deref()).map_err(|e| AppError::bad_request(e.to_string()))?;
    Ok(PlanResponse(planner.onboard(&OnboardRequest { owner, as_of }).await?))
}

async fn capture_prompt(
    State(planner): State<Planner>,
    Owner(owner): Owner,
    Json(body): Json<CaptureBody>,
) -> Result<(StatusCode, Json<CaptureResponse>), AppError> {
    let kind = body
        .kind
        .parse::<RequestKind>()
        .map_err(|e| AppError::bad_request(e.to_string()))?;
    let (entry, created) = planner.capture_input(owner, kind, &body.text).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(CaptureResponse { entry, created })))
}

async fn list_prompts(
    State(planner): State<Planner>,
    Owner(owner): Owner,
    Query(query): Query<PromptListQuery>,
) -> Result<Json<Vec<CacheEntry>>, AppError> {
    let kind = query
        .kind
        .as_deref()
        .map(str::parse::<RequestKind>)
        .transpose()
        .map_err(|e| AppError::bad_request(e.to_string()))?;
    let limit = query.limit.unwrap_or(DEFAULT_PROMPT_LIMIT).clamp(1, 500);
    let entries = cache_entries::list_for_owner(planner.pool(), owner, kind, limit)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(entries))
}

async fn get_schedule(
    State(planner): State<Planner>,
    Owner(owner): Owner,
    Path(date): Path<String>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("invalid date: {date}")))?;

    let schedule = plan::get_schedule_with_tasks(planner.pool(), owner, date)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("no schedule for {date}")))?;
    let summary = plan::schedule_summary(planner.pool(), owner, date)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(ScheduleResponse { schedule, summary }))
}

async fn task_feedback(
    State(planner): State<Planner>,
    Owner(owner): Owner,
    Path(id): Path<String>,
    Json(body): Json<TaskFeedback>,
) -> Result<Json<Task>, AppError> {
    let task_id =
        Uuid::parse_str(&id).map_err(|_| AppError::bad_request(format!("invalid task ID: {id}")))?;
    let task = plan::record_task_feedback(planner.pool(), task_id, owner, &body).await?;
    Ok(Json(task))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
