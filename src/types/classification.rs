//! Classification output and its audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The context blocks a prompt was built from, kept for audit/export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationContext {
    pub project_info: String,
    pub task_history: String,
    pub timestamp: DateTime<Utc>,
}

/// The prompt plus its context, attached to persisted tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskContext {
    pub prompt: String,
    pub context: ClassificationContext,
}

/// A validated, repaired classification of one capture.
///
/// `confidence` is within `[0, 1]`, `category` and `explanation` are never
/// empty, and `project_id` names a project from the catalog the result was
/// resolved against (or [`DEFAULT_PROJECT_ID`](crate::types::DEFAULT_PROJECT_ID)
/// when that catalog was empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub category: String,
    pub confidence: f64,
    pub explanation: String,
    pub project_id: String,
    pub prompt: String,
    pub context: ClassificationContext,
}

impl ClassificationResult {
    /// Audit record for the task built from this result.
    pub fn task_context(&self) -> TaskContext {
        TaskContext {
            prompt: self.prompt.clone(),
            context: self.context.clone(),
        }
    }
}

/// Clamp a model-reported confidence into `[0, 1]`. `NaN` becomes `0`.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
