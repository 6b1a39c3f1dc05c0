use std::time::Duration;

use crate::providers::RetryConfig;

/// Default time between captures.
pub const DEFAULT_CAPTURE_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Confidence below which the user is asked to confirm a task.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;
/// Consecutive failed cycles that pause tracking.
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 3;
/// Recent tasks fetched as classification context.
pub const DEFAULT_CONTEXT_TASK_LIMIT: usize = 50;

/// Scheduling and error policy for the capture loop.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerOptions {
    pub interval: Duration,
    pub confidence_threshold: f64,
    pub max_consecutive_errors: u32,
    pub context_task_limit: usize,
    /// Per-call retry around the two model calls. Default: single attempt.
    pub retry: RetryConfig,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_CAPTURE_INTERVAL,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
            context_task_limit: DEFAULT_CONTEXT_TASK_LIMIT,
            retry: RetryConfig::disabled(),
        }
    }
}

impl TrackerOptions {
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Clamped to at least 1.
    pub fn max_consecutive_errors(mut self, n: u32) -> Self {
        self.max_consecutive_errors = n.max(1);
        self
    }

    pub fn context_task_limit(mut self, limit: usize) -> Self {
        self.context_task_limit = limit;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}
