use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::Task;

/// Time totals over a set of tasks, in minutes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSummary {
    pub total_minutes: i64,
    pub billable_minutes: i64,
    /// Minutes per project id.
    pub by_project: BTreeMap<String, i64>,
}

impl TimeSummary {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut summary = Self::default();
        for task in tasks {
            summary.total_minutes += task.duration;
            if task.billable {
                summary.billable_minutes += task.duration;
            }
            *summary.by_project.entry(task.project.clone()).or_default() += task.duration;
        }
        summary
    }

    pub fn total_hours(&self) -> f64 {
        hours(self.total_minutes)
    }

    pub fn billable_hours(&self) -> f64 {
        hours(self.billable_minutes)
    }

    /// Hours per project id, rounded like [`hours`].
    pub fn project_hours(&self) -> impl Iterator<Item = (&str, f64)> {
        self.by_project
            .iter()
            .map(|(project, minutes)| (project.as_str(), hours(*minutes)))
    }
}

/// Minutes as hours, rounded to one decimal.
pub fn hours(minutes: i64) -> f64 {
    (minutes as f64 / 60.0 * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn task(project: &str, minutes: i64, billable: bool) -> Task {
        let start = Utc::now();
        Task::manual("Work", project, "Research", start, start + Duration::minutes(minutes))
            .with_billable(billable)
    }

    #[test]
    fn totals_by_project() {
        let tasks = vec![task("p1", 30, true), task("p2", 45, false), task("p1", 15, true)];
        let summary = TimeSummary::from_tasks(&tasks);
        assert_eq!(summary.total_minutes, 90);
        assert_eq!(summary.billable_minutes, 45);
        assert_eq!(summary.by_project["p1"], 45);
        assert_eq!(summary.total_hours(), 1.5);
        assert_eq!(summary.billable_hours(), 0.8);
    }

    #[test]
    fn hours_round_to_one_decimal() {
        assert_eq!(hours(0), 0.0);
        assert_eq!(hours(5), 0.1);
        assert_eq!(hours(100), 1.7);
    }
}
