//! Persistence collaborator traits.
//!
//! The core never talks to a database directly. It consumes these four
//! narrow interfaces, which keeps the pipeline testable with the in-memory
//! implementations and lets hosts plug in whatever storage they have.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;
use crate::types::{ActiveConfiguration, Project, Task};

/// Durable task log.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a task. The task is durable once this returns `Ok`.
    async fn add_task(&self, task: &Task) -> Result<()>;

    /// Most recent tasks, newest first.
    async fn get_recent_tasks(&self, limit: usize) -> Result<Vec<Task>>;

    /// Delete by uuid. Deleting an unknown uuid is not an error.
    async fn delete_task(&self, uuid: &str) -> Result<()>;

    /// Tasks starting within `[start, end)`, oldest first.
    async fn tasks_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Task>>;
}

/// Project catalog.
///
/// Implementations are not required to enforce the single-default-project
/// invariant; callers go through [`save_project`](super::save_project).
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get_all_projects(&self) -> Result<Vec<Project>>;
    async fn add_project(&self, project: &Project) -> Result<()>;
    async fn update_project(&self, project: &Project) -> Result<()>;
    async fn delete_project(&self, id: &str) -> Result<()>;
}

/// Secret storage, keyed by a provider's credential key.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_credential(&self, key: &str) -> Result<Option<String>>;
    async fn set_credential(&self, key: &str, value: &str) -> Result<()>;
}

/// Persisted provider/model selection.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_active_configuration(&self) -> Result<Option<ActiveConfiguration>>;

    /// Replace the stored selection as a whole.
    async fn set_active_configuration(&self, config: &ActiveConfiguration) -> Result<()>;
}
