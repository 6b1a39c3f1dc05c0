use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info};

use super::{CaptureSource, TerminationCallback};
use crate::{Result, TaskshotError};

/// Capture source that re-reads an image file on every frame.
///
/// Whatever keeps the file fresh (a screenshot tool on a timer, a test)
/// decides what the frame shows. [`terminate`](Self::terminate) plays the
/// role of the user revoking capture permission.
pub struct FileCaptureSource {
    path: PathBuf,
    released: AtomicBool,
    callbacks: Mutex<Vec<TerminationCallback>>,
}

impl FileCaptureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            released: AtomicBool::new(false),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `release()` has been called since the last `open()`.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Termination callbacks registered since the last release.
    pub fn pending_callbacks(&self) -> usize {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Signal upstream termination to every registered callback.
    pub fn terminate(&self) {
        info!(path = %self.path.display(), "capture source terminated");
        let callbacks = std::mem::take(
            &mut *self.callbacks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for callback in callbacks {
            callback();
        }
    }

    fn media_type(&self) -> &'static str {
        match self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            Some("gif") => "image/gif",
            _ => "image/jpeg",
        }
    }
}

#[async_trait]
impl CaptureSource for FileCaptureSource {
    async fn open(&self) -> Result<()> {
        if !self.path.exists() {
            return Err(TaskshotError::Capture(format!(
                "frame file not found: {}",
                self.path.display()
            )));
        }
        self.released.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn acquire_frame(&self) -> Result<String> {
        if self.is_released() {
            return Err(TaskshotError::Capture("capture source released".to_string()));
        }
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            TaskshotError::Capture(format!("failed to read frame {}: {e}", self.path.display()))
        })?;
        debug!(bytes = bytes.len(), "frame acquired");
        Ok(format!(
            "data:{};base64,{}",
            self.media_type(),
            STANDARD.encode(bytes)
        ))
    }

    fn on_terminated(&self, callback: TerminationCallback) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }

    /// Also drops pending termination callbacks; the next `open()` starts
    /// with none registered.
    fn release(&self) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        if !self.released.swap(true, Ordering::SeqCst) {
            debug!(path = %self.path.display(), "capture source released");
        }
    }
}
