//! Storage collaborators: traits plus in-memory, SQLite and file implementations.

mod files;
mod memory;
mod projects;
#[cfg(feature = "sqlite")]
mod sqlite;
mod traits;

pub use files::{FileCredentialStore, FileSettingsStore};
pub use memory::{MemoryCredentialStore, MemoryProjectStore, MemorySettingsStore, MemoryTaskStore};
pub use projects::{ensure_default_project, save_project};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
pub use traits::{CredentialStore, ProjectStore, SettingsStore, TaskStore};
