use chrono::Utc;
use tracing::info;

use crate::store::TaskStore;
use crate::types::{Task, duration_minutes, new_task_id};
use crate::{Result, TaskshotError};

/// Merge two or more tasks into one.
///
/// The merged task spans the earliest start to the latest end and takes
/// name, project, category and billable flag from the earliest task.
/// Non-empty descriptions are joined by newlines in start order. A merge
/// is a user decision, so confidence is 1.0.
pub fn merge_tasks(tasks: &[Task]) -> Result<Task> {
    if tasks.len() < 2 {
        return Err(TaskshotError::InvalidInput(
            "at least two tasks are required to merge".to_string(),
        ));
    }
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by_key(|t| t.start_time);

    let first = ordered[0];
    let start_time = first.start_time;
    let end_time = ordered
        .iter()
        .map(|t| t.end_time)
        .max()
        .unwrap_or(first.end_time);
    let description = ordered
        .iter()
        .map(|t| t.description.as_str())
        .filter(|d| !d.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Task {
        uuid: new_task_id(),
        name: first.name.clone(),
        category: first.category.clone(),
        project: first.project.clone(),
        confidence: 1.0,
        description,
        start_time,
        end_time,
        duration: duration_minutes(start_time, end_time),
        billable: first.billable,
        timestamp: Utc::now(),
        screenshot: None,
        context: None,
    })
}

/// Merge `tasks`, store the result, then delete the originals from `store`.
///
/// The merged task is persisted first, so a failed write leaves the
/// originals untouched.
pub async fn merge_stored_tasks(store: &dyn TaskStore, tasks: &[Task]) -> Result<Task> {
    let merged = merge_tasks(tasks)?;
    store.add_task(&merged).await?;
    for task in tasks {
        store.delete_task(&task.uuid).await?;
    }
    info!(merged = tasks.len(), uuid = %merged.uuid, "tasks merged");
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTaskStore;
    use chrono::{DateTime, Duration};

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn task(name: &str, start: &str, minutes: i64, description: &str) -> Task {
        let start = at(start);
        Task::manual(name, "p1", "Research", start, start + Duration::minutes(minutes))
            .with_description(description)
    }

    #[test]
    fn merge_spans_and_joins() {
        let later = task("Later", "2026-03-10T10:00:00Z", 30, "second");
        let earlier = task("Earlier", "2026-03-10T09:00:00Z", 15, "first");
        let blank = task("Blank", "2026-03-10T09:30:00Z", 10, "");
        let merged = merge_tasks(&[later, earlier, blank]).unwrap();
        assert_eq!(merged.name, "Earlier");
        assert_eq!(merged.start_time, at("2026-03-10T09:00:00Z"));
        assert_eq!(merged.end_time, at("2026-03-10T10:30:00Z"));
        assert_eq!(merged.duration, 90);
        assert_eq!(merged.description, "first\nsecond");
        assert_eq!(merged.confidence, 1.0);
    }

    #[test]
    fn single_task_is_rejected() {
        let one = task("Only", "2026-03-10T09:00:00Z", 15, "");
        assert!(matches!(
            merge_tasks(&[one]),
            Err(TaskshotError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn stored_merge_replaces_originals() {
        let store = MemoryTaskStore::new();
        let a = task("A", "2026-03-10T09:00:00Z", 15, "a");
        let b = task("B", "2026-03-10T09:15:00Z", 15, "b");
        store.add_task(&a).await.unwrap();
        store.add_task(&b).await.unwrap();

        let merged = merge_stored_tasks(&store, &[a, b]).await.unwrap();
        let all = store.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].uuid, merged.uuid);
    }

    /// Accepts deletes but refuses every write.
    struct ReadOnlyStore(MemoryTaskStore);

    #[async_trait::async_trait]
    impl TaskStore for ReadOnlyStore {
        async fn add_task(&self, _task: &Task) -> Result<()> {
            Err(TaskshotError::Storage("disk full".to_string()))
        }

        async fn get_recent_tasks(&self, limit: usize) -> Result<Vec<Task>> {
            self.0.get_recent_tasks(limit).await
        }

        async fn delete_task(&self, uuid: &str) -> Result<()> {
            self.0.delete_task(uuid).await
        }

        async fn tasks_between(
            &self,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<Task>> {
            self.0.tasks_between(start, end).await
        }
    }

    #[tokio::test]
    async fn failed_write_keeps_originals() {
        let inner = MemoryTaskStore::new();
        let a = task("A", "2026-03-10T09:00:00Z", 15, "a");
        let b = task("B", "2026-03-10T09:15:00Z", 15, "b");
        inner.add_task(&a).await.unwrap();
        inner.add_task(&b).await.unwrap();
        let store = ReadOnlyStore(inner);

        assert!(merge_stored_tasks(&store, &[a, b]).await.is_err());
        assert_eq!(store.0.all().len(), 2);
    }
}
