//! Taskshot error types

/// Taskshot error types
#[derive(Debug, thiserror::Error)]
pub enum TaskshotError {
    // Configuration errors
    /// Invalid or missing provider/model selection, bad registry or config file.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A classify call was made before the gateway reached `Ready`.
    #[error("AI provider not initialized; configure provider settings first")]
    NotInitialized,

    /// An activated provider has no wire backend registered.
    ///
    /// Activation validates providers, so this indicates a wiring bug.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("cannot start tracking: {0}")]
    StartRefused(String),

    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success response from a provider. `message` carries the status text.
    #[error("API request failed ({status}): {message}")]
    Api { status: u16, message: String },

    /// A provider envelope did not contain the expected field.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Collaborator errors
    #[error("storage error: {0}")]
    Storage(String),

    #[error("capture error: {0}")]
    Capture(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaskshotError {
    /// Whether a retry of the same request could plausibly succeed.
    ///
    /// Transport failures, timeouts, rate limits and server errors are
    /// transient. Everything else (auth, validation, configuration) is not.
    pub fn is_transient(&self) -> bool {
        match self {
            TaskshotError::Http(_) => true,
            TaskshotError::Api { status, .. } => {
                matches!(status, 408 | 429) || (500..600).contains(status)
            }
            _ => false,
        }
    }

    /// Build an [`TaskshotError::Api`] from a response status.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        TaskshotError::Api {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string(),
        }
    }
}

impl From<reqwest::Error> for TaskshotError {
    fn from(err: reqwest::Error) -> Self {
        TaskshotError::Http(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for TaskshotError {
    fn from(err: rusqlite::Error) -> Self {
        TaskshotError::Storage(err.to_string())
    }
}

/// Result type alias for Taskshot operations
pub type Result<T> = std::result::Result<T, TaskshotError>;
