//! Tracker state and UI collaborator hooks.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::types::Task;

/// Lifecycle of a [`CaptureOrchestrator`](super::CaptureOrchestrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingState {
    Idle,
    Tracking,
    Paused,
}

impl std::fmt::Display for TrackingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackingState::Idle => f.write_str("idle"),
            TrackingState::Tracking => f.write_str("tracking"),
            TrackingState::Paused => f.write_str("paused"),
        }
    }
}

/// The user's answer to a low-confidence suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskConfirmation {
    /// Keep the task as classified.
    Accepted,
    /// Rename the task. Only a changed, non-blank name counts as an edit.
    Edited { name: String },
    /// Closed without answering.
    Dismissed,
}

/// Hooks the orchestrator calls into the host UI.
///
/// Every method has a no-op default. `confirm_task` runs on its own task,
/// so a slow answer never delays the next capture.
#[async_trait]
pub trait TrackerEvents: Send + Sync {
    /// A task (successful or failed) was persisted.
    fn task_recorded(&self, _task: &Task) {}

    /// Ask the user about a low-confidence task.
    async fn confirm_task(&self, _task: &Task) -> TaskConfirmation {
        TaskConfirmation::Dismissed
    }

    /// Blocking notice (start refused, tracking paused after repeated errors).
    fn alert(&self, _message: &str) {}

    fn state_changed(&self, _state: TrackingState) {}

    /// Time until the next scheduled capture, about once a second.
    fn countdown(&self, _remaining: Duration) {}
}

/// Events sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl TrackerEvents for NoopEvents {}
