//! Taskshot - screen-capture activity tracker
//!
//! Periodically captures a frame, asks a vision model to describe it, asks
//! a text model to classify that description into a task against the
//! user's project catalog, and records the result on a continuous timeline.
//! Providers (OpenAI, Anthropic, a local server) sit behind one
//! [`ClassificationGateway`] and are selected at runtime from a registry.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskshot::{
//!     ActiveConfiguration, CaptureOrchestrator, FileCaptureSource, MemoryCredentialStore,
//!     MemoryProjectStore, MemorySettingsStore, MemoryTaskStore, ProviderGateway, TaskClassifier,
//! };
//!
//! #[tokio::main]
//! async fn main() -> taskshot::Result<()> {
//!     let gateway = Arc::new(
//!         ProviderGateway::builder()
//!             .settings_store(Arc::new(MemorySettingsStore::with_configuration(
//!                 ActiveConfiguration::new("openai", "gpt-4o-mini", "gpt-4o"),
//!             )))
//!             .credential_store(Arc::new(
//!                 MemoryCredentialStore::new().with_credential("OPENAI_API_KEY", "sk-..."),
//!             ))
//!             .build()?,
//!     );
//!     gateway.initialize().await?;
//!
//!     let tracker = CaptureOrchestrator::builder(
//!         TaskClassifier::new(gateway),
//!         Arc::new(MemoryTaskStore::new()),
//!         Arc::new(MemoryProjectStore::new()),
//!         Arc::new(FileCaptureSource::new("screen.png")),
//!     )
//!     .build();
//!
//!     let task = tracker.capture_once().await?;
//!     println!("{} ({:.0}%)", task.name, task.confidence * 100.0);
//!     Ok(())
//! }
//! ```

pub mod capture;
pub mod classifier;
pub mod config;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod providers;
pub mod registry;
pub mod store;
pub mod telemetry;
pub mod timesheet;
pub mod traits;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use error::{Result, TaskshotError};
pub use gateway::{GatewayState, ProviderGateway, ProviderGatewayBuilder};
pub use providers::RetryConfig;
pub use registry::ProviderRegistry;
pub use traits::ClassificationGateway;

pub use capture::{CaptureSource, FileCaptureSource, PassthroughThumbnailer, ThumbnailMaker};
#[cfg(feature = "thumbnails")]
pub use capture::ImageThumbnailer;
pub use classifier::TaskClassifier;
pub use config::AppConfig;
pub use orchestrator::{
    CaptureOrchestrator, NoopEvents, TaskConfirmation, TrackerEvents, TrackerOptions,
    TrackingState,
};
#[cfg(feature = "sqlite")]
pub use store::SqliteStore;
pub use store::{
    CredentialStore, FileCredentialStore, FileSettingsStore, MemoryCredentialStore,
    MemoryProjectStore, MemorySettingsStore, MemoryTaskStore, ProjectStore, SettingsStore,
    TaskStore,
};
pub use timesheet::{DateRange, TimeSummary};

// Re-export all types
pub use types::{
    ActiveConfiguration, Capability, ClassificationContext, ClassificationResult, ModelDescriptor,
    Project, ProviderDescriptor, Task, TaskContext,
};
