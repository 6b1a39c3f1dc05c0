//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder (e.g. prometheus,
//! statsd); without a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `taskshot_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: provider id (e.g. "openai", "local")
//! - `operation`: "vision" or "text"
//! - `status`: outcome: "ok" or "error"

/// Total provider requests issued by the gateway.
///
/// Labels: `provider`, `operation`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "taskshot_requests_total";

/// Provider request duration in seconds.
///
/// Labels: `provider`, `operation`.
pub const REQUEST_DURATION_SECONDS: &str = "taskshot_request_duration_seconds";

/// Text responses that could not be parsed and were replaced by the fallback object.
///
/// Labels: `provider`.
pub const FALLBACK_RESPONSES_TOTAL: &str = "taskshot_fallback_responses_total";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `operation`.
pub const RETRIES_TOTAL: &str = "taskshot_retries_total";

/// Completed capture cycles.
///
/// Labels: `status` ("ok" | "error").
pub const CYCLES_TOTAL: &str = "taskshot_cycles_total";

/// Current number of consecutive failed cycles (gauge).
pub const CONSECUTIVE_FAILURES: &str = "taskshot_consecutive_failures";
