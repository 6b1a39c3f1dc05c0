//! ProviderGateway - one normalized contract over every provider backend

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::GatewayState;
use crate::providers::{ProviderBackend, fallback_classification, parse_model_json};
use crate::registry::{ProviderRegistry, ProviderSummary};
use crate::store::{CredentialStore, SettingsStore};
use crate::telemetry;
use crate::traits::ClassificationGateway;
use crate::types::{ActiveConfiguration, Capability, ModelDescriptor, ProviderDescriptor};
use crate::{Result, TaskshotError};

/// Everything a classify call needs, resolved once per activation.
///
/// Calls clone the `Arc` up front so a concurrent `save_settings` never
/// changes the provider or model under an in-flight request.
struct Activation {
    provider: ProviderDescriptor,
    vision: ModelDescriptor,
    text: ModelDescriptor,
    backend: Arc<dyn ProviderBackend>,
    credential: Option<String>,
}

struct Inner {
    state: GatewayState,
    config: Option<ActiveConfiguration>,
    activation: Option<Arc<Activation>>,
}

/// Gateway that owns the active provider/model selection.
///
/// Create with [`ProviderGateway::builder()`](super::ProviderGatewayBuilder),
/// then call [`initialize`](Self::initialize) before classifying.
pub struct ProviderGateway {
    registry: Arc<ProviderRegistry>,
    backends: HashMap<String, Arc<dyn ProviderBackend>>,
    settings: Arc<dyn SettingsStore>,
    credentials: Arc<dyn CredentialStore>,
    defaults: ActiveConfiguration,
    http: reqwest::Client,
    inner: RwLock<Inner>,
}

impl ProviderGateway {
    pub(crate) fn new(
        registry: Arc<ProviderRegistry>,
        backends: HashMap<String, Arc<dyn ProviderBackend>>,
        settings: Arc<dyn SettingsStore>,
        credentials: Arc<dyn CredentialStore>,
        defaults: ActiveConfiguration,
        http: reqwest::Client,
    ) -> Self {
        Self {
            registry,
            backends,
            settings,
            credentials,
            defaults,
            http,
            inner: RwLock::new(Inner {
                state: GatewayState::Uninitialized,
                config: None,
                activation: None,
            }),
        }
    }

    /// Create a new builder for configuring the gateway.
    pub fn builder() -> super::ProviderGatewayBuilder {
        super::ProviderGatewayBuilder::new()
    }

    /// Load the persisted selection and try to reach `Ready`.
    ///
    /// Missing settings or a missing credential are not errors: the gateway
    /// lands in `ConfiguredWithoutCredential` and the rest of the app keeps
    /// running with AI features off. An unknown provider or a model that is
    /// missing or has the wrong capability is a `Configuration` error.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<GatewayState> {
        let Some(config) = self.settings.get_active_configuration().await? else {
            warn!(
                provider = %self.defaults.provider_id,
                "no AI provider settings found, using defaults"
            );
            self.set_inner(
                GatewayState::ConfiguredWithoutCredential,
                Some(self.defaults.clone()),
                None,
            );
            return Ok(GatewayState::ConfiguredWithoutCredential);
        };

        let Some(provider) = self.registry.get(&config.provider_id).cloned() else {
            self.set_inner(GatewayState::Uninitialized, None, None);
            return Err(TaskshotError::Configuration(format!(
                "invalid provider: {}",
                config.provider_id
            )));
        };

        let credential = if provider.requires_credential {
            let key = provider.credential_key.as_deref().unwrap_or_default();
            let stored = self.credentials.get_credential(key).await?;
            match stored.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()) {
                Some(credential) => Some(credential),
                None => {
                    warn!(
                        provider = %provider.id,
                        credential_key = key,
                        "no credential stored, AI features disabled"
                    );
                    self.set_inner(GatewayState::ConfiguredWithoutCredential, Some(config), None);
                    return Ok(GatewayState::ConfiguredWithoutCredential);
                }
            }
        } else {
            None
        };

        let vision = provider
            .model_with(&config.vision_model_id, Capability::Vision)
            .cloned();
        let text = provider
            .model_with(&config.text_model_id, Capability::Text)
            .cloned();
        let (vision, text) = match (vision, text) {
            (Some(vision), Some(text)) => (vision, text),
            (None, _) => {
                self.set_inner(GatewayState::Configured, Some(config.clone()), None);
                return Err(TaskshotError::Configuration(format!(
                    "invalid vision model: {}",
                    config.vision_model_id
                )));
            }
            (_, None) => {
                self.set_inner(GatewayState::Configured, Some(config.clone()), None);
                return Err(TaskshotError::Configuration(format!(
                    "invalid text model: {}",
                    config.text_model_id
                )));
            }
        };

        let Some(backend) = self.backends.get(&provider.id).cloned() else {
            self.set_inner(GatewayState::Configured, Some(config), None);
            return Err(TaskshotError::UnsupportedProvider(provider.id));
        };

        info!(
            provider = %provider.id,
            vision_model = %vision.id,
            text_model = %text.id,
            "AI provider initialized"
        );
        let activation = Activation {
            provider,
            vision,
            text,
            backend,
            credential,
        };
        self.set_inner(GatewayState::Ready, Some(config), Some(Arc::new(activation)));
        Ok(GatewayState::Ready)
    }

    /// Replace the active selection (and optionally its credential), then re-initialize.
    ///
    /// The three fields of `config` are stored together; a blank credential
    /// is ignored.
    pub async fn save_settings(
        &self,
        config: ActiveConfiguration,
        credential: Option<&str>,
    ) -> Result<GatewayState> {
        let provider = self.registry.get(&config.provider_id).ok_or_else(|| {
            TaskshotError::Configuration(format!("invalid provider: {}", config.provider_id))
        })?;
        if let (Some(key), Some(value)) = (
            provider.credential_key.as_deref(),
            credential.map(str::trim).filter(|c| !c.is_empty()),
        ) {
            self.credentials.set_credential(key, value).await?;
        }
        self.settings.set_active_configuration(&config).await?;
        info!(provider = %config.provider_id, "AI provider settings saved");
        self.initialize().await
    }

    /// The selection the gateway is currently working from, if any.
    pub fn active_configuration(&self) -> Option<ActiveConfiguration> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .config
            .clone()
    }

    /// Descriptor of the configured provider, if it is known to the registry.
    pub fn active_provider(&self) -> Option<ProviderDescriptor> {
        let config = self.active_configuration()?;
        self.registry.get(&config.provider_id).cloned()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Provider/model catalog for settings screens.
    pub fn available_providers(&self) -> Vec<ProviderSummary> {
        self.registry.available_providers()
    }

    fn set_inner(
        &self,
        state: GatewayState,
        config: Option<ActiveConfiguration>,
        activation: Option<Arc<Activation>>,
    ) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.state = state;
        inner.config = config;
        inner.activation = activation;
    }

    fn snapshot(&self) -> Result<Arc<Activation>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        match (&inner.state, &inner.activation) {
            (GatewayState::Ready, Some(activation)) => Ok(Arc::clone(activation)),
            _ => Err(TaskshotError::NotInitialized),
        }
    }

    async fn post(
        &self,
        active: &Activation,
        model: &ModelDescriptor,
        operation: &'static str,
        body: &Value,
    ) -> Result<Value> {
        let mut request = self.http.post(&model.endpoint).json(body);
        for (name, value) in active.backend.extra_headers() {
            request = request.header(name, value);
        }
        if let Some(credential) = active.credential.as_deref() {
            for (name, value) in active.backend.auth_headers(credential) {
                request = request.header(name, value);
            }
        }

        let start = Instant::now();
        let result = async {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(TaskshotError::from_status(status));
            }
            // A non-JSON body is handed to the backend as a bare string so
            // envelope extraction reports it rather than the transport.
            let text = response.text().await?;
            Ok(serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text)))
        }
        .await;

        record_request(operation, &active.provider.id, start, result.is_ok());
        match &result {
            Ok(_) => debug!(
                provider = %active.provider.id,
                model = %model.id,
                operation,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "provider request succeeded"
            ),
            Err(e) => warn!(
                provider = %active.provider.id,
                model = %model.id,
                operation,
                error = %e,
                "provider request failed"
            ),
        }
        result
    }
}

#[async_trait]
impl ClassificationGateway for ProviderGateway {
    fn state(&self) -> GatewayState {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).state
    }

    #[instrument(skip(self, image), fields(operation = "vision", image_len = image.len()))]
    async fn classify_image(&self, image: &str) -> Result<String> {
        let active = self.snapshot()?;
        let body = active.backend.build_vision_request(&active.vision, image);
        let response = self.post(&active, &active.vision, "vision", &body).await?;
        active.backend.extract_vision_response(&response)
    }

    #[instrument(skip(self, prompt), fields(operation = "text", prompt_len = prompt.len()))]
    async fn classify_text(&self, prompt: &str) -> Result<Value> {
        let active = self.snapshot()?;
        let body = active.backend.build_text_request(&active.text, prompt);
        let response = self.post(&active, &active.text, "text", &body).await?;

        let raw = match active.backend.extract_text_response(&response) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(provider = %active.provider.id, error = %e, "unexpected text response envelope");
                match response {
                    Value::String(body) => body,
                    other => other.to_string(),
                }
            }
        };

        match parse_model_json(&raw) {
            Ok(object) => Ok(Value::Object(object)),
            Err(failure) => {
                warn!(
                    provider = %active.provider.id,
                    error = %failure,
                    "model returned unparseable classification, using fallback"
                );
                metrics::counter!(telemetry::FALLBACK_RESPONSES_TOTAL,
                    "provider" => active.provider.id.clone(),
                )
                .increment(1);
                Ok(fallback_classification(&raw))
            }
        }
    }
}

fn record_request(operation: &'static str, provider: &str, start: Instant, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    metrics::counter!(telemetry::REQUESTS_TOTAL,
        "provider" => provider.to_owned(),
        "operation" => operation,
        "status" => status,
    )
    .increment(1);
    metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
        "provider" => provider.to_owned(),
        "operation" => operation,
    )
    .record(start.elapsed().as_secs_f64());
}
