use std::time::Duration;

use taskshot::{RetryConfig, Result, TaskshotError};

#[test]
fn test_error_display() {
    let err = TaskshotError::UnsupportedProvider("acme".to_string());
    assert!(err.to_string().contains("acme"));
}

#[test]
fn test_not_initialized_message() {
    let err = TaskshotError::NotInitialized;
    assert!(err.to_string().contains("not initialized"));
}

#[test]
fn test_result_alias() {
    fn returns_error() -> Result<()> {
        Err(TaskshotError::StartRefused("no provider".into()))
    }
    assert!(returns_error().is_err());
}

#[test]
fn api_error_from_status() {
    let err = TaskshotError::from_status(reqwest::StatusCode::UNAUTHORIZED);
    assert!(matches!(
        &err,
        TaskshotError::Api { status: 401, message } if message == "Unauthorized"
    ));
    assert_eq!(err.to_string(), "API request failed (401): Unauthorized");
}

// ============================================================================
// Transient error classification
// ============================================================================

#[test]
fn transient_errors() {
    assert!(TaskshotError::Http("connection reset".into()).is_transient());
    for status in [408, 429, 500, 502, 503] {
        assert!(
            TaskshotError::Api {
                status,
                message: String::new()
            }
            .is_transient(),
            "{status} should be transient"
        );
    }
}

#[test]
fn permanent_errors() {
    for status in [400, 401, 403, 404] {
        assert!(
            !TaskshotError::Api {
                status,
                message: String::new()
            }
            .is_transient()
        );
    }
    assert!(!TaskshotError::NotInitialized.is_transient());
    assert!(!TaskshotError::MalformedResponse("choices".into()).is_transient());
    assert!(!TaskshotError::Configuration("bad".into()).is_transient());
    assert!(!TaskshotError::Storage("locked".into()).is_transient());
}

// ============================================================================
// Retry configuration
// ============================================================================

#[test]
fn retry_config_defaults_to_single_attempt() {
    let config = RetryConfig::default();
    assert_eq!(config.max_attempts, 1);
    assert_eq!(config.initial_delay, Duration::from_millis(500));
    assert_eq!(config.max_delay, Duration::from_secs(30));
}

#[test]
fn retry_config_builder_and_backoff() {
    let config = RetryConfig::new()
        .max_attempts(4)
        .initial_delay(Duration::from_millis(100))
        .max_delay(Duration::from_millis(300));

    assert_eq!(config.max_attempts, 4);
    assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
    assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
    assert_eq!(config.delay_for_attempt(2), Duration::from_millis(300));
}
