//! The `DailyPlan` wire contract exchanged with the generator.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use dayplan_db::models::Priority;

/// A generated plan for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPlan {
    /// ISO-8601 date, optionally with a time part.
    pub date: String,
    pub day_of_week: String,
    #[serde(default)]
    pub tasks: Vec<DailyTask>,
    #[serde(default)]
    pub total_committed_hours: f64,
    #[serde(default)]
    pub total_available_hours: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub updated_commitments: Vec<String>,
    #[serde(default)]
    pub updated_goals: Vec<String>,
    #[serde(default)]
    pub user_behaviour_patterns: Vec<String>,
}

/// One task in a [`DailyPlan`], in planning order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTask {
    pub task_name: String,
    pub description: String,
    pub estimated_duration_minutes: i32,
    pub priority: Priority,
    #[serde(default)]
    pub related_goal: Option<String>,
    /// "7:30 PM" or "19:30".
    #[serde(default)]
    pub suggested_time: Option<String>,
    #[serde(default = "default_flexible")]
    pub is_flexible: bool,
}

fn default_flexible() -> bool {
    true
}

/// Semantic checks beyond what deserialization enforces.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidPlan {
    #[error("task #{index} has an empty task_name")]
    EmptyTaskName { index: usize },

    #[error("task {task:?} has negative estimated_duration_minutes ({minutes})")]
    NegativeDuration { task: String, minutes: i32 },

    #[error("{field} is negative ({value})")]
    NegativeHours { field: &'static str, value: f64 },
}

impl DailyPlan {
    /// Parse and validate generator output.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let plan: DailyPlan = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        plan.validate().map_err(|e| e.to_string())?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<(), InvalidPlan> {
        for (field, value) in [
            ("total_committed_hours", self.total_committed_hours),
            ("total_available_hours", self.total_available_hours),
        ] {
            if value < 0.0 {
                return Err(InvalidPlan::NegativeHours { field, value });
            }
        }

        for (index, task) in self.tasks.iter().enumerate() {
            if task.task_name.trim().is_empty() {
                return Err(InvalidPlan::EmptyTaskName { index });
            }
            if task.estimated_duration_minutes < 0 {
                return Err(InvalidPlan::NegativeDuration {
                    task: task.task_name.clone(),
                    minutes: task.estimated_duration_minutes,
                });
            }
        }
        Ok(())
    }
}

/// Response schema passed to the generator, in the OpenAPI subset Gemini
/// accepts for `response_schema`.
pub fn daily_plan_schema() -> Value {
    let string_list = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "date": { "type": "STRING", "description": "ISO-8601 date (YYYY-MM-DD)" },
            "day_of_week": { "type": "STRING" },
            "tasks": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "task_name": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "estimated_duration_minutes": { "type": "INTEGER" },
                        "priority": {
                            "type": "STRING",
                            "enum": ["Highest", "Urgent", "High", "Medium", "Low"]
                        },
                        "related_goal": { "type": "STRING", "nullable": true },
                        "suggested_time": { "type": "STRING", "nullable": true },
                        "is_flexible": { "type": "BOOLEAN" }
                    },
                    "required": ["task_name", "description", "estimated_duration_minutes", "priority"]
                }
            },
            "total_committed_hours": { "type": "NUMBER" },
            "total_available_hours": { "type": "NUMBER" },
            "notes": { "type": "STRING" },
            "updated_commitments": string_list,
            "updated_goals": string_list,
            "user_behaviour_patterns": string_list
        },
        "required": ["date", "day_of_week"]
    })
}
