//! Application configuration.
//!
//! Configuration is loaded from TOML with the following resolution order:
//! 1. `--config <path>` (CLI flag; an error if the file is missing)
//! 2. `~/.taskshot/config.toml` (user)
//! 3. built-in defaults
//!
//! Every field is defaulted, so a partial file only overrides what it names.
//! Provider credentials never live here; see
//! [`FileCredentialStore`](crate::store::FileCredentialStore).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::classifier::{DEFAULT_HISTORY_LINES, TASK_CATEGORIES};
use crate::gateway::{DEFAULT_PROVIDER, DEFAULT_TEXT_MODEL, DEFAULT_VISION_MODEL};
use crate::orchestrator::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_CONTEXT_TASK_LIMIT, DEFAULT_MAX_CONSECUTIVE_ERRORS,
    TrackerOptions,
};
use crate::providers::RetryConfig;
use crate::types::ActiveConfiguration;
use crate::{Result, TaskshotError};

/// Directory under `$HOME` holding config, settings, secrets and the database.
pub const DATA_DIR_NAME: &str = ".taskshot";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Capture loop scheduling and error policy.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    /// Minutes between captures (default: 5).
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    /// Below this a confirmation is requested (default: 0.7).
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Consecutive failed cycles before tracking pauses (default: 3).
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
    /// Recent tasks fetched as prompt context (default: 50).
    #[serde(default = "default_context_task_limit")]
    pub context_task_limit: usize,
    /// Lines in the recent-task-history block (default: 5).
    #[serde(default = "default_history_lines")]
    pub history_lines: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            confidence_threshold: default_confidence_threshold(),
            max_consecutive_errors: default_max_consecutive_errors(),
            context_task_limit: default_context_task_limit(),
            history_lines: default_history_lines(),
        }
    }
}

fn default_interval_minutes() -> u64 {
    5
}

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_max_consecutive_errors() -> u32 {
    DEFAULT_MAX_CONSECUTIVE_ERRORS
}

fn default_context_task_limit() -> usize {
    DEFAULT_CONTEXT_TASK_LIMIT
}

fn default_history_lines() -> usize {
    DEFAULT_HISTORY_LINES
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Allowed task categories offered to the model.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
        }
    }
}

fn default_categories() -> Vec<String> {
    TASK_CATEGORIES.iter().map(|c| (*c).to_string()).collect()
}

/// Soft-start provider selection used until the user saves settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            vision_model: default_vision_model(),
            text_model: default_text_model(),
        }
    }
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_vision_model() -> String {
    DEFAULT_VISION_MODEL.to_string()
}

fn default_text_model() -> String {
    DEFAULT_TEXT_MODEL.to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds; 0 disables the timeout (default: 0).
    #[serde(default)]
    pub timeout_secs: u64,
}

/// Retry policy around the two model calls of a capture cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    /// Attempts including the first; 1 disables retry (default: 1).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    1
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Data directory (default: `~/.taskshot`). A leading `~/` is expanded.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Provider registry override; relative paths resolve against `data_dir`.
    #[serde(default)]
    pub registry_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TaskshotError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            TaskshotError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(TaskshotError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        Ok(dirs::home_dir()
            .map(|home| home.join(DATA_DIR_NAME).join("config.toml"))
            .filter(|path| path.exists()))
    }

    /// Resolved data directory.
    pub fn data_dir(&self) -> PathBuf {
        match &self.storage.data_dir {
            Some(dir) => expand_home(dir),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DATA_DIR_NAME),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("taskshot.db")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir().join("settings.toml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.data_dir().join("secrets.toml")
    }

    /// Registry override, if configured.
    pub fn registry_path(&self) -> Option<PathBuf> {
        self.storage.registry_path.as_ref().map(|path| {
            let path = expand_home(path);
            if path.is_absolute() {
                path
            } else {
                self.data_dir().join(path)
            }
        })
    }

    /// HTTP timeout, `None` when disabled.
    pub fn http_timeout(&self) -> Option<Duration> {
        (self.http.timeout_secs > 0).then(|| Duration::from_secs(self.http.timeout_secs))
    }

    pub fn active_defaults(&self) -> ActiveConfiguration {
        ActiveConfiguration::new(
            &self.defaults.provider,
            &self.defaults.vision_model,
            &self.defaults.text_model,
        )
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .max_attempts(self.retry.max_attempts)
            .initial_delay(Duration::from_millis(self.retry.initial_delay_ms))
            .max_delay(Duration::from_millis(self.retry.max_delay_ms))
    }

    /// Orchestrator options. A zero interval is raised to one minute.
    pub fn tracker_options(&self) -> TrackerOptions {
        TrackerOptions::default()
            .interval(Duration::from_secs(self.tracking.interval_minutes.max(1) * 60))
            .confidence_threshold(self.tracking.confidence_threshold)
            .max_consecutive_errors(self.tracking.max_consecutive_errors)
            .context_task_limit(self.tracking.context_task_limit)
            .retry(self.retry_config())
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = AppConfig::default();
        assert_eq!(config.tracking.interval_minutes, 5);
        assert_eq!(config.tracking.max_consecutive_errors, 3);
        assert_eq!(config.classifier.categories.len(), 10);
        assert_eq!(config.defaults.text_model, "gpt-4o");
        assert_eq!(config.http_timeout(), None);
        assert_eq!(config.retry_config().max_attempts, 1);
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [tracking]
            interval_minutes = 10
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.tracking.interval_minutes, 10);
        // Defaults preserved
        assert_eq!(config.tracking.confidence_threshold, 0.7);
        assert_eq!(config.defaults.provider, "openai");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [tracking]
            interval_minutes = 2
            confidence_threshold = 0.5
            max_consecutive_errors = 5
            context_task_limit = 20
            history_lines = 3

            [classifier]
            categories = ["Coding", "Meetings"]

            [defaults]
            provider = "local"
            vision_model = "local-vision"
            text_model = "llama2"

            [http]
            timeout_secs = 60

            [retry]
            max_attempts = 3
            initial_delay_ms = 100
            max_delay_ms = 1000

            [storage]
            data_dir = "/var/lib/taskshot"
            registry_path = "providers.json"
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let options = config.tracker_options();
        assert_eq!(options.interval, Duration::from_secs(120));
        assert_eq!(options.confidence_threshold, 0.5);
        assert_eq!(options.max_consecutive_errors, 5);
        assert_eq!(options.context_task_limit, 20);
        assert_eq!(options.retry.max_attempts, 3);
        assert_eq!(options.retry.initial_delay, Duration::from_millis(100));
        assert_eq!(config.classifier.categories, vec!["Coding", "Meetings"]);
        assert_eq!(
            config.active_defaults(),
            ActiveConfiguration::new("local", "local-vision", "llama2")
        );
        assert_eq!(config.http_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(
            config.registry_path(),
            Some(PathBuf::from("/var/lib/taskshot/providers.json"))
        );
        assert_eq!(
            config.database_path(),
            PathBuf::from("/var/lib/taskshot/taskshot.db")
        );
    }

    #[test]
    fn zero_interval_is_raised() {
        let mut config = AppConfig::default();
        config.tracking.interval_minutes = 0;
        assert_eq!(config.tracker_options().interval, Duration::from_secs(60));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/taskshot.toml"))).unwrap_err();
        assert!(matches!(err, TaskshotError::Configuration(_)));
    }

    #[test]
    fn load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[http]\ntimeout_secs = 15\n").unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.http.timeout_secs, 15);
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[tracking\n").unwrap();
        assert!(matches!(
            AppConfig::load(Some(&path)),
            Err(TaskshotError::Configuration(_))
        ));
    }
}
