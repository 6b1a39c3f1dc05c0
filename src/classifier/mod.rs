//! Task classification: prompt building, output repair, project resolution.
//!
//! [`TaskClassifier::classify`] turns a frame description into a
//! [`ClassificationResult`] that is always usable: malformed model output
//! is repaired with defaults and project references are resolved against
//! the real catalog. Only gateway and network failures are returned as
//! errors.

mod prompt;
mod resolve;

pub use prompt::{TASK_CATEGORIES, build_project_info, build_prompt, build_task_history};
pub use resolve::{default_project_id, resolve_default_project, resolve_project_id};

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::Result;
use crate::providers::parse::FALLBACK_TASK;
use crate::traits::ClassificationGateway;
use crate::types::{ClassificationContext, ClassificationResult, Project, Task, clamp_confidence};

/// Recent-history lines included in the prompt by default.
pub const DEFAULT_HISTORY_LINES: usize = 5;

/// Explanation stored when the model gave none.
const MISSING_EXPLANATION: &str = "No explanation provided";

/// The keys a classification object must carry, all truthy.
const REQUIRED_KEYS: [&str; 4] = ["task", "confidence", "description", "project"];

/// Builds classification prompts and resolves the model's answer.
pub struct TaskClassifier {
    gateway: Arc<dyn ClassificationGateway>,
    categories: Vec<String>,
    history_lines: usize,
}

impl TaskClassifier {
    /// Classifier with the built-in category list.
    pub fn new(gateway: Arc<dyn ClassificationGateway>) -> Self {
        Self {
            gateway,
            categories: TASK_CATEGORIES.iter().map(|c| (*c).to_string()).collect(),
            history_lines: DEFAULT_HISTORY_LINES,
        }
    }

    /// Replace the allowed category set. An empty list keeps the built-in one.
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        if !categories.is_empty() {
            self.categories = categories;
        }
        self
    }

    pub fn with_history_lines(mut self, lines: usize) -> Self {
        self.history_lines = lines;
        self
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn gateway(&self) -> &Arc<dyn ClassificationGateway> {
        &self.gateway
    }

    /// Classify a frame description against the project catalog.
    ///
    /// `recent_tasks` is the context window (newest first) used for the
    /// per-project history and the recent-task block.
    #[instrument(skip_all, fields(projects = catalog.len(), recent = recent_tasks.len()))]
    pub async fn classify(
        &self,
        description: &str,
        catalog: &[Project],
        recent_tasks: &[Task],
    ) -> Result<ClassificationResult> {
        let project_info = build_project_info(catalog, recent_tasks);
        let task_history = build_task_history(recent_tasks, self.history_lines);
        let prompt = build_prompt(description, &self.categories, &project_info, &task_history);
        debug!(prompt_len = prompt.len(), "classification prompt built");

        let raw = self.gateway.classify_text(&prompt).await?;
        let empty = Map::new();
        let object = match raw.as_object() {
            Some(object) => object,
            None => {
                warn!(response = %raw, "classification response is not an object");
                &empty
            }
        };

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !object.get(*key).is_some_and(is_truthy))
            .collect();

        let project_id = if missing.is_empty() {
            let candidate = object.get("project").map(value_text).unwrap_or_default();
            resolve_project_id(catalog, &candidate)
        } else {
            warn!(missing = ?missing, response = %raw, "invalid classification response format");
            default_project_id(catalog)
        };

        let category = object
            .get("task")
            .map(value_text)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_TASK.to_string());
        let explanation = object
            .get("description")
            .map(value_text)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| MISSING_EXPLANATION.to_string());
        let confidence = clamp_confidence(object.get("confidence").and_then(number).unwrap_or(0.0));

        Ok(ClassificationResult {
            category,
            confidence,
            explanation,
            project_id,
            prompt,
            context: ClassificationContext {
                project_info,
                task_history,
                timestamp: Utc::now(),
            },
        })
    }
}

/// JavaScript-style truthiness: empty strings, zero, `false` and `null` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Confidence as a number; numeric strings are accepted.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
        assert!(is_truthy(&json!(0.1)));
        assert!(is_truthy(&json!("p1")));
    }

    #[test]
    fn numeric_strings_parse() {
        assert_eq!(number(&json!("0.8")), Some(0.8));
        assert_eq!(number(&json!(1)), Some(1.0));
        assert_eq!(number(&json!("high")), None);
    }
}
