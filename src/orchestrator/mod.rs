//! The capture loop: capture, describe, classify, persist, confirm.
//!
//! ```text
//!            start()                 pause()
//!   Idle ─────────────► Tracking ─────────────► Paused
//!    ▲                    │  │                    │
//!    │      stop() /      │  └── N consecutive ───┘
//!    └── source ended ────┘      failed cycles
//! ```
//!
//! One cycle runs immediately on `start()`; the next is scheduled only
//! after the previous one has finished. Cycles from the loop and from
//! [`CaptureOrchestrator::capture_once`] share one lock, so at most one is
//! ever in flight. Every cycle persists exactly one task: the classified
//! task on success, an `"Error"` task on failure. Consecutive tasks tile
//! the timeline: each task starts where the previous one ended.
//!
//! Pausing or rescheduling only interrupts the wait between cycles. A
//! cycle that has started always runs to completion.

mod events;
mod options;

pub use events::{NoopEvents, TaskConfirmation, TrackerEvents, TrackingState};
pub use options::{
    DEFAULT_CAPTURE_INTERVAL, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_CONTEXT_TASK_LIMIT,
    DEFAULT_MAX_CONSECUTIVE_ERRORS, TrackerOptions,
};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::capture::{CaptureSource, DEFAULT_THUMBNAIL, ThumbnailMaker};
use crate::classifier::{TaskClassifier, default_project_id};
use crate::gateway::GatewayState;
use crate::providers::retry::with_retry;
use crate::store::{ProjectStore, TaskStore};
use crate::telemetry;
use crate::types::{ERROR_CATEGORY, FAILED_TASK_NAME, Project, Task, duration_minutes, new_task_id};
use crate::{Result, TaskshotError};

/// Coordinates periodic capture and classification.
///
/// Cheap to clone; clones share the same loop.
#[derive(Clone)]
pub struct CaptureOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    classifier: TaskClassifier,
    tasks: Arc<dyn TaskStore>,
    projects: Arc<dyn ProjectStore>,
    source: Arc<dyn CaptureSource>,
    thumbnails: Arc<dyn ThumbnailMaker>,
    events: Arc<dyn TrackerEvents>,
    options: Mutex<TrackerOptions>,
    run: Mutex<RunState>,
    /// Held for the whole of a cycle.
    cycle: tokio::sync::Mutex<()>,
    /// Restarts the wait of the running loop with the current interval.
    reschedule: Notify,
}

struct RunState {
    state: TrackingState,
    /// End time of the last persisted task in the current tracking run.
    last_capture: Option<DateTime<Utc>>,
    consecutive_errors: u32,
    cancel: Option<CancellationToken>,
    /// Bumped on every start so stale termination callbacks are ignored.
    generation: u64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builder for [`CaptureOrchestrator`].
pub struct CaptureOrchestratorBuilder {
    classifier: TaskClassifier,
    tasks: Arc<dyn TaskStore>,
    projects: Arc<dyn ProjectStore>,
    source: Arc<dyn CaptureSource>,
    thumbnails: Option<Arc<dyn ThumbnailMaker>>,
    events: Arc<dyn TrackerEvents>,
    options: TrackerOptions,
}

impl CaptureOrchestratorBuilder {
    pub fn thumbnailer(mut self, thumbnails: Arc<dyn ThumbnailMaker>) -> Self {
        self.thumbnails = Some(thumbnails);
        self
    }

    pub fn events(mut self, events: Arc<dyn TrackerEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn options(mut self, options: TrackerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> CaptureOrchestrator {
        let thumbnails = self.thumbnails.unwrap_or_else(default_thumbnailer);
        CaptureOrchestrator {
            inner: Arc::new(Inner {
                classifier: self.classifier,
                tasks: self.tasks,
                projects: self.projects,
                source: self.source,
                thumbnails,
                events: self.events,
                options: Mutex::new(self.options),
                run: Mutex::new(RunState {
                    state: TrackingState::Idle,
                    last_capture: None,
                    consecutive_errors: 0,
                    cancel: None,
                    generation: 0,
                }),
                cycle: tokio::sync::Mutex::new(()),
                reschedule: Notify::new(),
            }),
        }
    }
}

#[cfg(feature = "thumbnails")]
fn default_thumbnailer() -> Arc<dyn ThumbnailMaker> {
    Arc::new(crate::capture::ImageThumbnailer::default())
}

#[cfg(not(feature = "thumbnails"))]
fn default_thumbnailer() -> Arc<dyn ThumbnailMaker> {
    Arc::new(crate::capture::PassthroughThumbnailer)
}

impl CaptureOrchestrator {
    pub fn builder(
        classifier: TaskClassifier,
        tasks: Arc<dyn TaskStore>,
        projects: Arc<dyn ProjectStore>,
        source: Arc<dyn CaptureSource>,
    ) -> CaptureOrchestratorBuilder {
        CaptureOrchestratorBuilder {
            classifier,
            tasks,
            projects,
            source,
            thumbnails: None,
            events: Arc::new(NoopEvents),
            options: TrackerOptions::default(),
        }
    }

    pub fn state(&self) -> TrackingState {
        lock(&self.inner.run).state
    }

    pub fn consecutive_errors(&self) -> u32 {
        lock(&self.inner.run).consecutive_errors
    }

    /// End time of the most recent task recorded in this tracking run.
    pub fn last_capture(&self) -> Option<DateTime<Utc>> {
        lock(&self.inner.run).last_capture
    }

    pub fn options(&self) -> TrackerOptions {
        lock(&self.inner.options).clone()
    }

    pub fn classifier(&self) -> &TaskClassifier {
        &self.inner.classifier
    }

    /// Begin tracking: capture now, then every `interval`.
    ///
    /// A no-op while already tracking. Refused with an alert when the
    /// gateway is not `Ready`, since captures could not be classified.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        if self.state() == TrackingState::Tracking {
            return Ok(());
        }

        let gateway_state = self.inner.classifier.gateway().state();
        if !gateway_state.is_ready() {
            let message = match gateway_state {
                GatewayState::ConfiguredWithoutCredential => {
                    "An API key is required for the selected AI provider. Configure it in settings before starting tracking."
                }
                _ => "The AI provider is not configured. Configure it in settings before starting tracking.",
            };
            warn!(state = %gateway_state, "refusing to start tracking");
            self.inner.events.alert(message);
            return Err(TaskshotError::StartRefused(message.to_string()));
        }

        self.inner.source.open().await?;

        let token = CancellationToken::new();
        let generation = {
            let mut run = lock(&self.inner.run);
            if run.state == TrackingState::Tracking {
                return Ok(());
            }
            run.state = TrackingState::Tracking;
            run.last_capture = None;
            run.consecutive_errors = 0;
            run.generation += 1;
            run.cancel = Some(token.clone());
            run.generation
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.source.on_terminated(Box::new(move || {
            if let Some(inner) = weak.upgrade()
                && lock(&inner.run).generation == generation
            {
                info!("capture source ended, stopping tracking");
                inner.halt(TrackingState::Idle);
            }
        }));

        metrics::gauge!(telemetry::CONSECUTIVE_FAILURES).set(0.0);
        tokio::spawn(capture_loop(Arc::clone(&self.inner), token));
        info!(interval_secs = self.options().interval.as_secs(), "tracking started");
        self.inner.events.state_changed(TrackingState::Tracking);
        Ok(())
    }

    /// Stop scheduling captures and release the capture source.
    ///
    /// Idempotent: does nothing unless tracking.
    pub fn pause(&self) {
        if self.state() == TrackingState::Tracking {
            self.inner.halt(TrackingState::Paused);
        }
    }

    /// Stop tracking entirely and return to `Idle`.
    pub fn stop(&self) {
        if self.state() != TrackingState::Idle {
            self.inner.halt(TrackingState::Idle);
        }
    }

    /// Change the capture interval. While tracking, the pending capture is
    /// rescheduled to one full new interval from now, or from the end of
    /// the cycle in flight.
    pub fn set_capture_interval(&self, minutes: u64) -> Result<()> {
        if minutes == 0 {
            return Err(TaskshotError::InvalidInput(
                "capture interval must be at least one minute".to_string(),
            ));
        }
        lock(&self.inner.options).interval = Duration::from_secs(minutes * 60);

        if self.state() == TrackingState::Tracking {
            info!(minutes, "capture interval changed, rescheduling");
            self.inner.reschedule.notify_one();
        }
        Ok(())
    }

    /// Run a single cycle now, outside the schedule.
    ///
    /// Waits for a cycle already in flight to finish first. The resulting
    /// task (classified or `"Error"`) is persisted either way; the error is
    /// returned for failed cycles.
    pub async fn capture_once(&self) -> Result<Task> {
        self.inner.run_cycle().await
    }
}

async fn capture_loop(inner: Arc<Inner>, token: CancellationToken) {
    // Outcomes are recorded by the cycle itself.
    let _ = inner.run_cycle().await;

    'schedule: loop {
        if token.is_cancelled() {
            return;
        }
        let interval = lock(&inner.options).interval;
        let next = Instant::now() + interval;
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(secs = interval.as_secs(), "next capture scheduled");

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = inner.reschedule.notified() => continue 'schedule,
                _ = tokio::time::sleep_until(next) => break,
                _ = ticker.tick() => {
                    inner.events.countdown(next.saturating_duration_since(Instant::now()));
                }
            }
        }

        let _ = inner.run_cycle().await;
    }
}

impl Inner {
    fn halt(&self, target: TrackingState) {
        let token = {
            let mut run = lock(&self.run);
            if run.state == target {
                return;
            }
            run.state = target;
            run.cancel.take()
        };
        if let Some(token) = token {
            token.cancel();
        }
        self.source.release();
        info!(state = %target, "tracking halted");
        self.events.state_changed(target);
    }

    async fn run_cycle(self: &Arc<Self>) -> Result<Task> {
        let _cycle = self.cycle.lock().await;
        let (interval, retry, limit) = {
            let options = lock(&self.options);
            (options.interval, options.retry.clone(), options.context_task_limit)
        };
        let end_time = Utc::now();
        let start_time = lock(&self.run).last_capture.unwrap_or_else(|| {
            end_time - chrono::Duration::from_std(interval).unwrap_or(chrono::Duration::zero())
        });

        match self
            .classify_capture(start_time, end_time, &retry, limit)
            .await
        {
            Ok(task) => {
                self.record_success(&task);
                Ok(task)
            }
            Err(e) => {
                self.record_failure(&e, start_time, end_time).await;
                Err(e)
            }
        }
    }

    /// Capture, describe, classify and persist. Any error fails the cycle.
    async fn classify_capture(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        retry: &crate::providers::RetryConfig,
        context_limit: usize,
    ) -> Result<Task> {
        let frame = self.source.acquire_frame().await?;
        let gateway = self.classifier.gateway().as_ref();
        let image = frame.as_str();
        let description =
            with_retry(retry, "classify_image", move || gateway.classify_image(image)).await?;
        debug!(len = description.len(), "frame described");

        let catalog = self.projects.get_all_projects().await?;
        let recent = self.tasks.get_recent_tasks(context_limit).await?;
        let (classifier, text) = (&self.classifier, description.as_str());
        let (projects, history) = (catalog.as_slice(), recent.as_slice());
        let result = with_retry(retry, "classify_text", move || {
            classifier.classify(text, projects, history)
        })
        .await?;

        let thumbnails = Arc::clone(&self.thumbnails);
        let made = tokio::task::spawn_blocking(move || thumbnails.make_thumbnail(&frame))
            .await
            .map_err(|e| TaskshotError::Capture(format!("thumbnail task failed: {e}")))
            .and_then(|thumb| thumb);
        let screenshot = match made {
            Ok(thumb) => thumb,
            Err(e) => {
                warn!(error = %e, "thumbnail failed, storing placeholder");
                DEFAULT_THUMBNAIL.to_string()
            }
        };

        let billable = find_project(&catalog, &result.project_id)
            .map(|p| p.default_billable)
            .unwrap_or(true);

        let task = Task {
            uuid: new_task_id(),
            name: result.category.clone(),
            category: result.category.clone(),
            project: result.project_id.clone(),
            confidence: result.confidence,
            description: result.explanation.clone(),
            start_time,
            end_time,
            duration: duration_minutes(start_time, end_time),
            billable,
            timestamp: end_time,
            screenshot: Some(screenshot),
            context: Some(result.task_context()),
        };
        self.tasks.add_task(&task).await?;
        Ok(task)
    }

    fn record_success(self: &Arc<Self>, task: &Task) {
        let threshold = {
            let mut run = lock(&self.run);
            run.last_capture = Some(task.end_time);
            run.consecutive_errors = 0;
            lock(&self.options).confidence_threshold
        };
        metrics::counter!(telemetry::CYCLES_TOTAL, "status" => "ok").increment(1);
        metrics::gauge!(telemetry::CONSECUTIVE_FAILURES).set(0.0);
        info!(
            task = %task.name,
            project = %task.project,
            confidence = task.confidence,
            "task recorded"
        );
        self.events.task_recorded(task);

        if task.confidence < threshold {
            debug!(confidence = task.confidence, "low confidence, asking for confirmation");
            tokio::spawn(confirm_task(Arc::clone(self), task.clone()));
        }
    }

    async fn record_failure(&self, err: &TaskshotError, start_time: DateTime<Utc>, end_time: DateTime<Utc>) {
        warn!(error = %err, "capture cycle failed");
        let catalog = self.projects.get_all_projects().await.unwrap_or_default();
        let task = Task {
            uuid: new_task_id(),
            name: FAILED_TASK_NAME.to_string(),
            category: ERROR_CATEGORY.to_string(),
            project: default_project_id(&catalog),
            confidence: 0.0,
            description: err.to_string(),
            start_time,
            end_time,
            duration: duration_minutes(start_time, end_time),
            billable: false,
            timestamp: end_time,
            screenshot: None,
            context: None,
        };
        match self.tasks.add_task(&task).await {
            Ok(()) => self.events.task_recorded(&task),
            Err(e) => error!(error = %e, "failed to persist failure task"),
        }

        let (errors, max) = {
            let mut run = lock(&self.run);
            run.last_capture = Some(end_time);
            run.consecutive_errors += 1;
            (
                run.consecutive_errors,
                lock(&self.options).max_consecutive_errors,
            )
        };
        metrics::counter!(telemetry::CYCLES_TOTAL, "status" => "error").increment(1);
        metrics::gauge!(telemetry::CONSECUTIVE_FAILURES).set(f64::from(errors));
        warn!(errors, max, "consecutive capture failures");

        if errors >= max {
            let tracking = lock(&self.run).state == TrackingState::Tracking;
            if tracking {
                self.halt(TrackingState::Paused);
            }
            self.events.alert(&format!(
                "Tracking paused after {errors} consecutive errors. Last error: {err}"
            ));
        }
    }
}

async fn confirm_task(inner: Arc<Inner>, task: Task) {
    let TaskConfirmation::Edited { name } = inner.events.confirm_task(&task).await else {
        return;
    };
    let name = name.trim();
    if name.is_empty() || name == task.name {
        return;
    }
    let mut edited = task.clone();
    edited.name = name.to_string();
    edited.confidence = 1.0;
    // Same uuid, so the store replaces the original in place.
    match inner.tasks.add_task(&edited).await {
        Ok(()) => {
            info!(task = %edited.name, "task confirmed by user");
            inner.events.task_recorded(&edited);
        }
        Err(e) => error!(error = %e, "failed to store confirmed task"),
    }
}

fn find_project<'a>(catalog: &'a [Project], id: &str) -> Option<&'a Project> {
    catalog.iter().find(|p| p.id == id)
}
