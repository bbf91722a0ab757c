use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What a cache entry's content represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Free-text goal input from the user.
    Goal,
    /// Free-text commitment input from the user.
    Commitment,
    /// A daily plan prompt and its generated plan.
    Summary,
    /// The first-time onboarding prompt and its generated plan.
    Onboarding,
    /// Free text that forces a reschedule.
    Override,
    Other,
}

impl RequestKind {
    /// Kinds a user may capture directly as input.
    pub const USER_INPUTS: [RequestKind; 4] = [
        RequestKind::Goal,
        RequestKind::Commitment,
        RequestKind::Override,
        RequestKind::Other,
    ];

    /// Whether this kind is free-text user input rather than a generation request.
    pub fn is_user_input(self) -> bool {
        Self::USER_INPUTS.contains(&self)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Goal => "goal",
            Self::Commitment => "commitment",
            Self::Summary => "summary",
            Self::Onboarding => "onboarding",
            Self::Override => "override",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

impl FromStr for RequestKind {
    type Err = RequestKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "goal" => Ok(Self::Goal),
            "commitment" => Ok(Self::Commitment),
            "summary" => Ok(Self::Summary),
            "onboarding" => Ok(Self::Onboarding),
            "override" => Ok(Self::Override),
            "other" => Ok(Self::Other),
            other => Err(RequestKindParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`RequestKind`] string.
#[derive(Debug, Clone)]
pub struct RequestKindParseError(pub String);

impl fmt::Display for RequestKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid request kind: {:?}", self.0)
    }
}

impl std::error::Error for RequestKindParseError {}

// ---------------------------------------------------------------------------

/// Task priority. A closed set: anything else fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum Priority {
    Highest,
    Urgent,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Priorities counted as "high" in schedule summaries.
    pub fn is_high(self) -> bool {
        matches!(self, Self::Highest | Self::Urgent | Self::High)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Highest => "Highest",
            Self::Urgent => "Urgent",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = PriorityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Highest" => Ok(Self::Highest),
            "Urgent" => Ok(Self::Urgent),
            "High" => Ok(Self::High),
            "Medium" => Ok(Self::Medium),
            "Low" => Ok(Self::Low),
            other => Err(PriorityParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Priority`] string.
#[derive(Debug, Clone)]
pub struct PriorityParseError(pub String);

impl fmt::Display for PriorityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid priority: {:?} (expected Highest, Urgent, High, Medium, or Low)",
            self.0
        )
    }
}

impl std::error::Error for PriorityParseError {}

// ---------------------------------------------------------------------------

/// Which refined profile list a [`Profile`] row holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Goals,
    Commitments,
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Goals => "goals",
            Self::Commitments => "commitments",
        };
        f.write_str(s)
    }
}

impl FromStr for ProfileKind {
    type Err = ProfileKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "goals" => Ok(Self::Goals),
            "commitments" => Ok(Self::Commitments),
            other => Err(ProfileKindParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ProfileKind`] string.
#[derive(Debug, Clone)]
pub struct ProfileKindParseError(pub String);

impl fmt::Display for ProfileKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid profile kind: {:?}", self.0)
    }
}

impl std::error::Error for ProfileKindParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A fingerprinted prompt and, once generated, its structured response.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CacheEntry {
    pub id: Uuid,
    /// `None` for global/system entries.
    pub owner_id: Option<Uuid>,
    pub request_kind: RequestKind,
    pub raw_content: String,
    pub fingerprint: String,
    /// `None` while the entry is pending.
    pub response: Option<serde_json::Value>,
    pub use_count: i32,
    pub is_synthetic: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Bumped on every hit or repeated capture.
    pub last_used_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether generation has produced a response for this entry.
    pub fn is_resolved(&self) -> bool {
        self.response.is_some()
    }
}

/// A materialized plan for one owner and calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub date: NaiveDate,
    pub day_of_week: String,
    pub total_committed_hours: f64,
    pub total_available_hours: f64,
    pub notes: String,
    pub updated_commitments: Vec<String>,
    pub updated_goals: Vec<String>,
    pub user_behaviour_patterns: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate view of one schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ScheduleSummary {
    pub date: NaiveDate,
    pub task_count: i64,
    /// Tasks at `Highest`, `Urgent` or `High` priority.
    pub high_priority_count: i64,
    pub total_available_hours: f64,
}

/// A persisted task, shared by name across an owner's schedules.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub task_name: String,
    pub description: String,
    pub estimated_duration_minutes: i32,
    pub priority: Priority,
    pub related_goal: Option<String>,
    pub suggested_time: Option<NaiveTime>,
    pub is_flexible: bool,
    pub completed: bool,
    pub feedback: String,
    /// 1-5 when set by the owner.
    pub rating: Option<i16>,
    pub created_at: DateTime<Utc>,
}

/// A refined goal or commitment list for an owner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: ProfileKind,
    pub items: Vec<String>,
    pub source: String,
    pub updated_at: DateTime<Utc>,
}

/// An observed behaviour pattern for an owner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BehaviourPattern {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub pattern_text: String,
    pub date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
