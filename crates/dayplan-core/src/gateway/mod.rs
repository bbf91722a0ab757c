//! Generation gateway: wraps a [`Generator`] with schema-constrained output
//! and plan validation. Fails closed; never retries.

pub mod fixture;
pub mod gemini;
pub mod trait_def;

use std::sync::Arc;

use tracing::{info, warn};

pub use fixture::FixtureGenerator;
pub use gemini::{GeminiConfig, GeminiGenerator};
pub use trait_def::Generator;

use crate::plan::{DailyPlan, daily_plan_schema};

/// Failure reported by a generator or by plan validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    #[error("invalid generator response: {reason}")]
    Validation { raw: String, reason: String },
}

/// The planner's handle on a generator.
#[derive(Clone)]
pub struct GenerationGateway {
    generator: Arc<dyn Generator>,
}

impl GenerationGateway {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub fn is_synthetic(&self) -> bool {
        self.generator.is_synthetic()
    }

    pub fn ensure_available(&self) -> Result<(), GenerationError> {
        self.generator.ensure_available()
    }

    /// Generate and validate a plan for `prompt`.
    pub async fn generate_plan(&self, prompt: &str) -> Result<DailyPlan, GenerationError> {
        let raw = self
            .generator
            .generate(prompt, &daily_plan_schema())
            .await?;

        match DailyPlan::from_json(&raw) {
            Ok(plan) => {
                info!(
                    generator = self.generator.name(),
                    date = %plan.date,
                    tasks = plan.tasks.len(),
                    "plan generated"
                );
                Ok(plan)
            }
            Err(reason) => {
                warn!(generator = self.generator.name(), %reason, "generated plan rejected");
                Err(GenerationError::Validation { raw, reason })
            }
        }
    }
}

impl std::fmt::Debug for GenerationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationGateway")
            .field("generator", &self.generator.name())
            .finish()
    }
}
