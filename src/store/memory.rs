//! In-memory collaborator implementations.
//!
//! Used as builder defaults and in tests. Nothing here survives a restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::traits::{CredentialStore, ProjectStore, SettingsStore, TaskStore};
use crate::types::{ActiveConfiguration, Project, Task};
use crate::{Result, TaskshotError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Task log held in a `Vec`, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored task in insertion order.
    pub fn all(&self) -> Vec<Task> {
        lock(&self.tasks).clone()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn add_task(&self, task: &Task) -> Result<()> {
        let mut tasks = lock(&self.tasks);
        tasks.retain(|t| t.uuid != task.uuid);
        tasks.push(task.clone());
        Ok(())
    }

    async fn get_recent_tasks(&self, limit: usize) -> Result<Vec<Task>> {
        let mut tasks = lock(&self.tasks).clone();
        tasks.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        tasks.truncate(limit);
        Ok(tasks)
    }

    async fn delete_task(&self, uuid: &str) -> Result<()> {
        lock(&self.tasks).retain(|t| t.uuid != uuid);
        Ok(())
    }

    async fn tasks_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = lock(&self.tasks)
            .iter()
            .filter(|t| t.start_time >= start && t.start_time < end)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.start_time);
        Ok(tasks)
    }
}

/// Project catalog held in a `Vec`, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    projects: Mutex<Vec<Project>>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects(projects: impl IntoIterator<Item = Project>) -> Self {
        Self {
            projects: Mutex::new(projects.into_iter().collect()),
        }
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn get_all_projects(&self) -> Result<Vec<Project>> {
        Ok(lock(&self.projects).clone())
    }

    async fn add_project(&self, project: &Project) -> Result<()> {
        let mut projects = lock(&self.projects);
        if projects.iter().any(|p| p.id == project.id) {
            return Err(TaskshotError::Storage(format!(
                "project '{}' already exists",
                project.id
            )));
        }
        projects.push(project.clone());
        Ok(())
    }

    async fn update_project(&self, project: &Project) -> Result<()> {
        let mut projects = lock(&self.projects);
        match projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => {
                *existing = project.clone();
                Ok(())
            }
            None => Err(TaskshotError::Storage(format!(
                "project '{}' not found",
                project.id
            ))),
        }
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        lock(&self.projects).retain(|p| p.id != id);
        Ok(())
    }
}

/// Credentials held in a map. No environment fallback.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        lock(&self.credentials).insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get_credential(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.credentials).get(key).cloned())
    }

    async fn set_credential(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.credentials).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Active configuration held in memory.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    config: Mutex<Option<ActiveConfiguration>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configuration(config: ActiveConfiguration) -> Self {
        Self {
            config: Mutex::new(Some(config)),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get_active_configuration(&self) -> Result<Option<ActiveConfiguration>> {
        Ok(lock(&self.config).clone())
    }

    async fn set_active_configuration(&self, config: &ActiveConfiguration) -> Result<()> {
        *lock(&self.config) = Some(config.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task_at(minutes_ago: i64) -> Task {
        let end = Utc::now() - Duration::minutes(minutes_ago);
        Task::manual("t", "p", "Research", end - Duration::minutes(5), end)
    }

    #[tokio::test]
    async fn recent_tasks_newest_first() {
        let store = MemoryTaskStore::new();
        let old = task_at(30);
        let new = task_at(0);
        store.add_task(&old).await.unwrap();
        store.add_task(&new).await.unwrap();

        let recent = store.get_recent_tasks(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].uuid, new.uuid);
    }

    #[tokio::test]
    async fn duplicate_project_rejected() {
        let store = MemoryProjectStore::new();
        let p = Project::with_id("p1", "Acme");
        store.add_project(&p).await.unwrap();
        assert!(store.add_project(&p).await.is_err());
        assert!(store.update_project(&Project::with_id("p2", "x")).await.is_err());
    }
}
