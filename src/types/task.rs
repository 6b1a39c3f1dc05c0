//! Timeline entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classification::TaskContext;

/// Category stored on tasks produced by a failed capture cycle.
pub const ERROR_CATEGORY: &str = "Error";

/// Name stored on tasks produced by a failed capture cycle.
pub const FAILED_TASK_NAME: &str = "Task Detection Failed";

/// One entry in the task log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub uuid: String,
    pub name: String,
    pub category: String,
    /// Project id.
    pub project: String,
    pub confidence: f64,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Whole minutes between start and end.
    pub duration: i64,
    pub billable: bool,
    pub timestamp: DateTime<Utc>,
    /// Thumbnail, base64 encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<TaskContext>,
}

impl Task {
    /// A user-entered task. Manual entries are always fully confident.
    pub fn manual(
        name: impl Into<String>,
        project: impl Into<String>,
        category: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid: new_task_id(),
            name: name.into(),
            category: category.into(),
            project: project.into(),
            confidence: 1.0,
            description: String::new(),
            start_time,
            end_time,
            duration: duration_minutes(start_time, end_time),
            billable: false,
            timestamp: Utc::now(),
            screenshot: None,
            context: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_billable(mut self, billable: bool) -> Self {
        self.billable = billable;
        self
    }

    /// Whether this entry records a failed capture cycle.
    pub fn is_failure(&self) -> bool {
        self.category == ERROR_CATEGORY
    }
}

/// Fresh task identifier.
pub fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Minutes between two instants, rounded to the nearest minute.
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let secs = (end - start).num_seconds();
    (secs as f64 / 60.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn duration_rounds_to_nearest_minute() {
        let start = Utc::now();
        assert_eq!(duration_minutes(start, start + Duration::seconds(29)), 0);
        assert_eq!(duration_minutes(start, start + Duration::seconds(90)), 2);
        assert_eq!(duration_minutes(start, start + Duration::minutes(5)), 5);
    }

    #[test]
    fn manual_task_is_confident() {
        let start = Utc::now();
        let task = Task::manual("Review", "p1", "Research", start, start + Duration::minutes(30));
        assert_eq!(task.confidence, 1.0);
        assert_eq!(task.duration, 30);
        assert!(!task.is_failure());
    }
}
