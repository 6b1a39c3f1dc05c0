//! Builder for configuring gateway instances

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::ProviderGateway;
use crate::providers::{AnthropicBackend, LocalBackend, OpenAiBackend, ProviderBackend};
use crate::registry::ProviderRegistry;
use crate::store::{CredentialStore, MemoryCredentialStore, MemorySettingsStore, SettingsStore};
use crate::types::ActiveConfiguration;
use crate::{Result, TaskshotError};

/// Provider used when no settings have been saved yet.
pub const DEFAULT_PROVIDER: &str = "openai";
/// Vision model used when no settings have been saved yet.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o-mini";
/// Text model used when no settings have been saved yet.
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4o";

/// Builder for [`ProviderGateway`].
///
/// Every piece has a default: the embedded provider registry, in-memory
/// settings and credential stores, the built-in backends for `openai`,
/// `anthropic` and `local`, and no request timeout.
pub struct ProviderGatewayBuilder {
    registry: Option<ProviderRegistry>,
    settings: Option<Arc<dyn SettingsStore>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    backends: HashMap<String, Arc<dyn ProviderBackend>>,
    defaults: ActiveConfiguration,
    timeout: Option<Duration>,
    http_client: Option<reqwest::Client>,
}

impl ProviderGatewayBuilder {
    pub fn new() -> Self {
        let mut backends: HashMap<String, Arc<dyn ProviderBackend>> = HashMap::new();
        backends.insert("openai".to_string(), Arc::new(OpenAiBackend));
        backends.insert("anthropic".to_string(), Arc::new(AnthropicBackend));
        backends.insert("local".to_string(), Arc::new(LocalBackend));
        Self {
            registry: None,
            settings: None,
            credentials: None,
            backends,
            defaults: ActiveConfiguration::new(
                DEFAULT_PROVIDER,
                DEFAULT_VISION_MODEL,
                DEFAULT_TEXT_MODEL,
            ),
            timeout: None,
            http_client: None,
        }
    }

    /// Use a custom provider registry instead of the embedded seed.
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(store);
        self
    }

    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(store);
        self
    }

    /// Register (or replace) the wire backend for a provider id.
    pub fn backend(mut self, provider_id: impl Into<String>, backend: Arc<dyn ProviderBackend>) -> Self {
        self.backends.insert(provider_id.into(), backend);
        self
    }

    /// Selection used when the settings store is empty.
    pub fn defaults(mut self, defaults: ActiveConfiguration) -> Self {
        self.defaults = defaults;
        self
    }

    /// Per-request timeout. Without one a hung provider stalls the call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Share an existing HTTP client. Overrides [`timeout`](Self::timeout).
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the gateway. The result is `Uninitialized` until
    /// [`ProviderGateway::initialize`] is called.
    pub fn build(self) -> Result<ProviderGateway> {
        let registry = match self.registry {
            Some(registry) => registry,
            None => ProviderRegistry::with_embedded_seed()?,
        };

        let http = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder().user_agent(crate::version::user_agent());
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build().map_err(|e| {
                    TaskshotError::Configuration(format!("failed to build HTTP client: {e}"))
                })?
            }
        };

        Ok(ProviderGateway::new(
            Arc::new(registry),
            self.backends,
            self.settings
                .unwrap_or_else(|| Arc::new(MemorySettingsStore::new())),
            self.credentials
                .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new())),
            self.defaults,
            http,
        ))
    }
}

impl Default for ProviderGatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
