//! Provider registry: the static catalog of known providers and models.
//!
//! The registry is loaded once at startup, either from the compiled-in
//! seed or from a JSON file using the same format, and is read-only
//! afterwards. It carries no behaviour: which wire format a provider
//! speaks is decided by the backends registered on the gateway.
//!
//! Load-time validation covers the structural invariants only (credential
//! key present when required, positive token limits, unique ids). Whether a
//! provider exposes both a vision and a text model is checked when it is
//! activated, not here.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::types::{Capability, ProviderDescriptor};
use crate::{Result, TaskshotError};

/// Static catalog of providers, keyed by provider id.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderDescriptor>,
}

/// Summary of one provider for settings screens.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub id: String,
    pub name: String,
    pub requires_credential: bool,
    pub models: Vec<ModelSummary>,
}

/// Summary of one model for settings screens.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub capability: Capability,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a provider after validating it, replacing any entry with the same id.
    pub fn insert(&mut self, provider: ProviderDescriptor) -> Result<()> {
        validate(&provider)?;
        self.providers.insert(provider.id.clone(), provider);
        Ok(())
    }

    /// Get a provider by id.
    pub fn get(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.providers.get(id)
    }

    /// All providers, ordered by id.
    pub fn list(&self) -> Vec<&ProviderDescriptor> {
        self.providers.values().collect()
    }

    /// Provider/model catalog in the shape settings UIs consume.
    pub fn available_providers(&self) -> Vec<ProviderSummary> {
        self.providers
            .values()
            .map(|p| ProviderSummary {
                id: p.id.clone(),
                name: p.display_name.clone(),
                requires_credential: p.requires_credential,
                models: p
                    .models
                    .iter()
                    .map(|m| ModelSummary {
                        id: m.id.clone(),
                        name: m.display_name.clone(),
                        capability: m.capability,
                    })
                    .collect(),
            })
            .collect()
    }

    /// Number of providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Parse a registry from JSON (an array of provider descriptors).
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<ProviderDescriptor> = serde_json::from_str(json).map_err(|e| {
            TaskshotError::Configuration(format!("failed to parse provider registry: {e}"))
        })?;
        let mut registry = Self::new();
        for entry in entries {
            if registry.providers.contains_key(&entry.id) {
                return Err(TaskshotError::Configuration(format!(
                    "duplicate provider id '{}'",
                    entry.id
                )));
            }
            registry.insert(entry)?;
        }
        debug!(providers = registry.len(), "provider registry loaded");
        Ok(registry)
    }

    /// Load a registry from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TaskshotError::Configuration(format!("failed to read provider registry {path:?}: {e}"))
        })?;
        Self::from_json(&content)
    }

    /// Create a registry from the compiled-in seed.
    pub fn with_embedded_seed() -> Result<Self> {
        Self::from_json(EMBEDDED_SEED)
    }
}

fn validate(provider: &ProviderDescriptor) -> Result<()> {
    if provider.id.trim().is_empty() {
        return Err(TaskshotError::Configuration(
            "provider id must not be empty".to_string(),
        ));
    }
    if provider.requires_credential
        && provider
            .credential_key
            .as_deref()
            .is_none_or(|k| k.trim().is_empty())
    {
        return Err(TaskshotError::Configuration(format!(
            "provider '{}' requires a credential but declares no credential key",
            provider.id
        )));
    }
    let mut seen = HashSet::new();
    for model in &provider.models {
        if !seen.insert(model.id.as_str()) {
            return Err(TaskshotError::Configuration(format!(
                "provider '{}' lists model '{}' twice",
                provider.id, model.id
            )));
        }
        if model.max_output_tokens == 0 {
            return Err(TaskshotError::Configuration(format!(
                "model '{}' of provider '{}' must allow at least one output token",
                model.id, provider.id
            )));
        }
    }
    Ok(())
}

/// Raw JSON seed data compiled into the binary.
const EMBEDDED_SEED: &str = include_str!("seed.json");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelDescriptor;

    #[test]
    fn embedded_seed_parses() {
        let registry = ProviderRegistry::with_embedded_seed().unwrap();
        assert_eq!(registry.len(), 3);
        for id in ["openai", "anthropic", "local"] {
            let provider = registry.get(id).unwrap();
            assert!(provider.is_usable(), "{id} should have vision and text models");
        }
        assert!(!registry.get("local").unwrap().requires_credential);
    }

    #[test]
    fn missing_credential_key_rejected() {
        let mut provider = ProviderDescriptor::new("x", "X");
        provider.requires_credential = true;
        let err = ProviderRegistry::new().insert(provider).unwrap_err();
        assert!(err.to_string().contains("credential key"));
    }

    #[test]
    fn zero_token_limit_rejected() {
        let provider = ProviderDescriptor::new("x", "X").with_model(ModelDescriptor::new(
            "m",
            Capability::Text,
            "http://localhost",
            0,
        ));
        assert!(ProviderRegistry::new().insert(provider).is_err());
    }

    #[test]
    fn duplicate_provider_rejected() {
        let json = r#"[
            {"id": "a", "displayName": "A"},
            {"id": "a", "displayName": "A again"}
        ]"#;
        let err = ProviderRegistry::from_json(json).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn available_providers_uses_type_key() {
        let registry = ProviderRegistry::with_embedded_seed().unwrap();
        let summary = registry.available_providers();
        let json = serde_json::to_value(&summary).unwrap();
        let openai = json
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["id"] == "openai")
            .unwrap();
        assert_eq!(openai["models"][0]["type"], "vision");
    }
}
