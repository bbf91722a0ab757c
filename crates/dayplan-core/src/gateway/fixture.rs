//! Canned-output generator for demos and offline use.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Value, json};

use super::{GenerationError, Generator};

/// Returns the same JSON document for every prompt.
///
/// Synthetic: cache entries it resolves carry `is_synthetic = true`.
#[derive(Debug, Clone)]
pub struct FixtureGenerator {
    response: String,
}

impl FixtureGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }

    /// A small but complete plan for `date`.
    pub fn sample(date: NaiveDate) -> Self {
        let plan = json!({
            "date": date.format("%Y-%m-%d").to_string(),
            "day_of_week": date.format("%A").to_string(),
            "tasks": [
                {
                    "task_name": "Morning review",
                    "description": "Skim today's commitments and pick one focus task.",
                    "estimated_duration_minutes": 15,
                    "priority": "High",
                    "related_goal": null,
                    "suggested_time": "8:30 AM",
                    "is_flexible": false
                },
                {
                    "task_name": "Deep work block",
                    "description": "Work on the focus task without interruptions.",
                    "estimated_duration_minutes": 90,
                    "priority": "Urgent",
                    "related_goal": "Make steady progress on the main project",
                    "suggested_time": "09:00",
                    "is_flexible": true
                },
                {
                    "task_name": "Walk",
                    "description": "A short walk away from screens.",
                    "estimated_duration_minutes": 20,
                    "priority": "Medium",
                    "related_goal": "Stay healthy",
                    "suggested_time": null,
                    "is_flexible": true
                }
            ],
            "total_committed_hours": 2.1,
            "total_available_hours": 8.0,
            "notes": "Sample plan from the fixture generator.",
            "updated_commitments": [],
            "updated_goals": ["Make steady progress on the main project", "Stay healthy"],
            "user_behaviour_patterns": []
        });
        Self::new(plan.to_string())
    }
}

#[async_trait]
impl Generator for FixtureGenerator {
    fn name(&self) -> &str {
        "fixture"
    }

    fn is_synthetic(&self) -> bool {
        true
    }

    async fn generate(&self, _prompt: &str, _schema: &Value) -> Result<String, GenerationError> {
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::DailyPlan;

    #[tokio::test]
    async fn sample_is_a_valid_plan_for_the_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let generator = FixtureGenerator::sample(date);
        assert!(generator.is_synthetic());

        let raw = generator.generate("anything", &Value::Null).await.unwrap();
        let plan = DailyPlan::from_json(&raw).expect("sample validates");
        assert_eq!(plan.date, "2025-03-10");
        assert_eq!(plan.day_of_week, "Monday");
        assert_eq!(plan.tasks.len(), 3);
    }
}
