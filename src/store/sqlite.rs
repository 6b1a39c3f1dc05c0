//! SQLite-backed task log and project catalog.
//!
//! One connection behind a mutex; every call runs on the blocking pool so
//! the async callers never stall the runtime on disk I/O. Timestamps are
//! stored as fixed-width RFC 3339 text, which keeps lexical and
//! chronological order identical.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use super::traits::{ProjectStore, TaskStore};
use crate::types::{Project, Task, TaskContext};
use crate::{Result, TaskshotError};

const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Task and project storage in a single SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file and run migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        debug!(path = %path.display(), "opened task database");
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        run_migrations(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn execute<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        })
        .await
        .map_err(|e| TaskshotError::Storage(format!("database task failed: {e}")))?
    }
}

fn run_migrations(conn: &mut Connection) -> Result<()> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version > CURRENT_SCHEMA_VERSION {
        return Err(TaskshotError::Storage(format!(
            "database version ({version}) is newer than supported schema ({CURRENT_SCHEMA_VERSION})"
        )));
    }
    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }
    let tx = conn.transaction()?;
    if version < 1 {
        tx.execute_batch(include_str!("schema_v1.sql"))?;
    }
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
    tx.commit()?;
    Ok(())
}

fn format_time(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_time(value: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TaskshotError::Storage(format!("invalid {column} '{value}': {e}")))
}

const TASK_COLUMNS: &str = "uuid, name, category, project, confidence, description, start_time, \
     end_time, duration, billable, timestamp, screenshot, context";

fn row_to_task(row: &Row) -> Result<Task> {
    let start_time: String = row.get("start_time")?;
    let end_time: String = row.get("end_time")?;
    let timestamp: String = row.get("timestamp")?;
    let context: Option<String> = row.get("context")?;
    let context = context
        .map(|json| serde_json::from_str::<TaskContext>(&json))
        .transpose()?;

    Ok(Task {
        uuid: row.get("uuid")?,
        name: row.get("name")?,
        category: row.get("category")?,
        project: row.get("project")?,
        confidence: row.get("confidence")?,
        description: row.get("description")?,
        start_time: parse_time(&start_time, "start_time")?,
        end_time: parse_time(&end_time, "end_time")?,
        duration: row.get("duration")?,
        billable: row.get("billable")?,
        timestamp: parse_time(&timestamp, "timestamp")?,
        screenshot: row.get("screenshot")?,
        context,
    })
}

fn collect_tasks(stmt: &mut rusqlite::Statement<'_>, params: impl rusqlite::Params) -> Result<Vec<Task>> {
    let mut rows = stmt.query(params)?;
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(row_to_task(row)?);
    }
    Ok(tasks)
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn add_task(&self, task: &Task) -> Result<()> {
        let task = task.clone();
        let context = task.context.as_ref().map(serde_json::to_string).transpose()?;
        self.execute(move |conn| {
            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO tasks ({TASK_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                params![
                    task.uuid,
                    task.name,
                    task.category,
                    task.project,
                    task.confidence,
                    task.description,
                    format_time(&task.start_time),
                    format_time(&task.end_time),
                    task.duration,
                    task.billable,
                    format_time(&task.timestamp),
                    task.screenshot,
                    context,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_recent_tasks(&self, limit: usize) -> Result<Vec<Task>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks ORDER BY start_time DESC, timestamp DESC LIMIT ?1"
            ))?;
            collect_tasks(&mut stmt, params![limit])
        })
        .await
    }

    async fn delete_task(&self, uuid: &str) -> Result<()> {
        let uuid = uuid.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM tasks WHERE uuid = ?1", params![uuid])?;
            Ok(())
        })
        .await
    }

    async fn tasks_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Task>> {
        let (start, end) = (format_time(&start), format_time(&end));
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks
                 WHERE start_time >= ?1 AND start_time < ?2
                 ORDER BY start_time ASC"
            ))?;
            collect_tasks(&mut stmt, params![start, end])
        })
        .await
    }
}

fn row_to_project(row: &Row) -> Result<Project> {
    let categories: String = row.get("categories")?;
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        categories: serde_json::from_str(&categories)?,
        billable_rate: row.get("billable_rate")?,
        default_billable: row.get("default_billable")?,
        is_default_project: row.get("is_default_project")?,
        color: row.get("color")?,
    })
}

#[async_trait]
impl ProjectStore for SqliteStore {
    async fn get_all_projects(&self) -> Result<Vec<Project>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, categories, billable_rate, default_billable,
                        is_default_project, color
                 FROM projects ORDER BY rowid",
            )?;
            let mut rows = stmt.query([])?;
            let mut projects = Vec::new();
            while let Some(row) = rows.next()? {
                projects.push(row_to_project(row)?);
            }
            Ok(projects)
        })
        .await
    }

    async fn add_project(&self, project: &Project) -> Result<()> {
        let project = project.clone();
        let categories = serde_json::to_string(&project.categories)?;
        self.execute(move |conn| {
            let exists = conn
                .query_row(
                    "SELECT 1 FROM projects WHERE id = ?1",
                    params![project.id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if exists {
                return Err(TaskshotError::Storage(format!(
                    "project '{}' already exists",
                    project.id
                )));
            }
            conn.execute(
                "INSERT INTO projects (id, name, description, categories, billable_rate,
                                       default_billable, is_default_project, color)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    project.id,
                    project.name,
                    project.description,
                    categories,
                    project.billable_rate,
                    project.default_billable,
                    project.is_default_project,
                    project.color,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn update_project(&self, project: &Project) -> Result<()> {
        let project = project.clone();
        let categories = serde_json::to_string(&project.categories)?;
        self.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE projects
                 SET name = ?2, description = ?3, categories = ?4, billable_rate = ?5,
                     default_billable = ?6, is_default_project = ?7, color = ?8
                 WHERE id = ?1",
                params![
                    project.id,
                    project.name,
                    project.description,
                    categories,
                    project.billable_rate,
                    project.default_billable,
                    project.is_default_project,
                    project.color,
                ],
            )?;
            if changed == 0 {
                return Err(TaskshotError::Storage(format!(
                    "project '{}' not found",
                    project.id
                )));
            }
            Ok(())
        })
        .await
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn task_round_trip_preserves_times() {
        let store = SqliteStore::open_in_memory().unwrap();
        let start = Utc::now();
        let task = Task::manual("Write docs", "p1", "Documentation", start, start + Duration::minutes(5))
            .with_description("README");
        store.add_task(&task).await.unwrap();

        let recent = store.get_recent_tasks(10).await.unwrap();
        assert_eq!(recent, vec![task]);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");
        SqliteStore::open(&path).unwrap();
        let store = SqliteStore::open(&path).unwrap();
        assert!(store.get_all_projects().await.unwrap().is_empty());
    }
}
