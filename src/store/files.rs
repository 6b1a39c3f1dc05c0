//! TOML-file settings and credential stores.
//!
//! Settings live in `settings.toml`:
//!
//! ```toml
//! [ai]
//! provider = "openai"
//! vision_model = "gpt-4o-mini"
//! text_model = "gpt-4o"
//! ```
//!
//! Credentials live in `secrets.toml` under `[credentials]`, keyed by the
//! provider's credential key. The secrets file is written with mode 0600
//! and refused on read if group or other bits are set. Lookups fall back to
//! the environment variable of the same name.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{CredentialStore, SettingsStore};
use crate::types::ActiveConfiguration;
use crate::{Result, TaskshotError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ai: Option<AiSection>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AiSection {
    provider: String,
    vision_model: String,
    text_model: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SecretsFile {
    #[serde(default)]
    credentials: BTreeMap<String, String>,
}

/// Active configuration persisted to `settings.toml`.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get_active_configuration(&self) -> Result<Option<ActiveConfiguration>> {
        let path = self.path.clone();
        let file = blocking(move || {
            if !path.exists() {
                return Ok(SettingsFile::default());
            }
            read_toml::<SettingsFile>(&path, "settings")
        })
        .await?;
        Ok(file.ai.map(|ai| ActiveConfiguration {
            provider_id: ai.provider,
            vision_model_id: ai.vision_model,
            text_model_id: ai.text_model,
        }))
    }

    async fn set_active_configuration(&self, config: &ActiveConfiguration) -> Result<()> {
        let file = SettingsFile {
            ai: Some(AiSection {
                provider: config.provider_id.clone(),
                vision_model: config.vision_model_id.clone(),
                text_model: config.text_model_id.clone(),
            }),
        };
        let path = self.path.clone();
        blocking(move || write_toml(&path, &file, false)).await
    }
}

/// Credentials persisted to `secrets.toml`, with environment fallback.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
    env_fallback: bool,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_fallback: true,
        }
    }

    /// Disable the environment-variable fallback.
    pub fn without_env_fallback(mut self) -> Self {
        self.env_fallback = false;
        self
    }
}

fn load_secrets(path: &Path) -> Result<SecretsFile> {
    if !path.exists() {
        return Ok(SecretsFile::default());
    }
    check_permissions(path)?;
    read_toml(path, "secrets")
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get_credential(&self, key: &str) -> Result<Option<String>> {
        let path = self.path.clone();
        let from_file = blocking(move || load_secrets(&path))
            .await?
            .credentials
            .remove(key);
        if from_file.is_some() || !self.env_fallback {
            return Ok(from_file);
        }
        Ok(std::env::var(key).ok())
    }

    async fn set_credential(&self, key: &str, value: &str) -> Result<()> {
        let (path, key, value) = (self.path.clone(), key.to_string(), value.to_string());
        blocking(move || {
            let mut secrets = load_secrets(&path)?;
            secrets.credentials.insert(key, value);
            write_toml(&path, &secrets, true)
        })
        .await
    }
}

/// Run file I/O on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TaskshotError::Storage(format!("file task failed: {e}")))?
}

fn read_toml<T: for<'de> Deserialize<'de>>(path: &Path, what: &str) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        TaskshotError::Configuration(format!("Failed to read {what} file {path:?}: {e}"))
    })?;
    toml::from_str(&content).map_err(|e| {
        TaskshotError::Configuration(format!("Failed to parse {what} file {path:?}: {e}"))
    })
}

/// Write via a sibling temp file and rename, so readers never see a partial file.
fn write_toml<T: Serialize>(path: &Path, value: &T, private: bool) -> Result<()> {
    let content = toml::to_string(value)
        .map_err(|e| TaskshotError::Configuration(format!("Failed to serialize {path:?}: {e}")))?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("toml.tmp");
    {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        if private {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        #[cfg(not(unix))]
        let _ = private;
        let mut file = options.open(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), "wrote file");
    Ok(())
}

/// Check that the secrets file has secure permissions (0600 or 0400).
#[cfg(unix)]
fn check_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|e| {
        TaskshotError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
    })?;

    let mode = metadata.permissions().mode();
    // Reject if group or other bits are set
    if mode & 0o077 != 0 {
        return Err(TaskshotError::Configuration(format!(
            "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
            mode & 0o777
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.toml"));
        assert_eq!(store.get_active_configuration().await.unwrap(), None);

        let config = ActiveConfiguration::new("local", "local-vision", "llama2");
        store.set_active_configuration(&config).await.unwrap();
        assert_eq!(store.get_active_configuration().await.unwrap(), Some(config));

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("[ai]"));
        assert!(raw.contains("vision_model = \"local-vision\""));
    }

    #[tokio::test]
    async fn credentials_written_private() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        let store = FileCredentialStore::new(&path).without_env_fallback();
        store.set_credential("TASKSHOT_TEST_KEY", "sk-1").await.unwrap();
        assert_eq!(
            store.get_credential("TASKSHOT_TEST_KEY").await.unwrap(),
            Some("sk-1".to_string())
        );
        assert_eq!(store.get_credential("OTHER").await.unwrap(), None);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn insecure_secrets_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        fs::write(&path, "[credentials]\nKEY = \"v\"\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let err = FileCredentialStore::new(&path)
            .get_credential("KEY")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("insecure permissions"));
    }
}
