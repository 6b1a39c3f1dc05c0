//! Public types for the Taskshot API.

mod classification;
mod project;
mod provider;
mod settings;
mod task;

pub use classification::{ClassificationContext, ClassificationResult, TaskContext, clamp_confidence};
pub use project::{DEFAULT_PROJECT_ID, Project};
pub use provider::{Capability, ModelDescriptor, ProviderDescriptor};
pub use settings::ActiveConfiguration;
pub use task::{ERROR_CATEGORY, FAILED_TASK_NAME, Task, duration_minutes, new_task_id};
