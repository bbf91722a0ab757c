//! Typed errors at the planning boundary.

use uuid::Uuid;

use dayplan_db::models::RequestKind;

use crate::gateway::GenerationError;

/// Failure of a plan request, onboarding request, or materialization.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The generator could not be reached or refused the request.
    #[error("plan generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// The generator answered, but not with a valid plan.
    #[error("generated plan failed validation: {reason}")]
    GenerationValidation { raw: String, reason: String },

    /// The plan's `date` field is not a calendar date.
    #[error("plan date {0:?} is not a valid date")]
    PlanDateInvalid(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<GenerationError> for PlanError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Unavailable(message) => Self::GenerationUnavailable(message),
            GenerationError::Validation { raw, reason } => {
                Self::GenerationValidation { raw, reason }
            }
        }
    }
}

/// Failure to store free-text user input.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("input text is empty")]
    Blank,

    #[error("{0} entries are generated, not captured")]
    NotUserInput(RequestKind),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Failure to record feedback on a task.
#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("rating {0} is outside 1..=5")]
    InvalidRating(i16),

    #[error("task {0} not found")]
    TaskNotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
