//! Provider and model descriptors.
//!
//! Static description of the providers the gateway knows how to talk to.
//! Descriptors are pure data; all behaviour lives in the provider backends.

use serde::{Deserialize, Serialize};

/// What kind of input a model accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Accepts an image (plus a fixed instruction) and returns a description.
    Vision,
    /// Accepts a text prompt only.
    Text,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Vision => f.write_str("vision"),
            Capability::Text => f.write_str("text"),
        }
    }
}

/// A single model offered by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Model identifier, also sent on the wire as the model name.
    pub id: String,
    pub display_name: String,
    pub capability: Capability,
    /// Full URL requests for this model are POSTed to.
    pub endpoint: String,
    pub max_output_tokens: u32,
}

impl ModelDescriptor {
    pub fn new(
        id: impl Into<String>,
        capability: Capability,
        endpoint: impl Into<String>,
        max_output_tokens: u32,
    ) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            capability,
            endpoint: endpoint.into(),
            max_output_tokens,
        }
    }

    /// Set a human-readable name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }
}

/// A provider (vendor or local server) and its model catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub requires_credential: bool,
    /// Name of the stored credential (and its environment variable fallback).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_key: Option<String>,
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
}

impl ProviderDescriptor {
    /// Create a provider that needs no credential.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            requires_credential: false,
            credential_key: None,
            models: Vec::new(),
        }
    }

    /// Require a credential stored under `key`.
    pub fn with_credential(mut self, key: impl Into<String>) -> Self {
        self.requires_credential = true;
        self.credential_key = Some(key.into());
        self
    }

    /// Add a model to the catalog.
    pub fn with_model(mut self, model: ModelDescriptor) -> Self {
        self.models.push(model);
        self
    }

    /// Look up a model by id.
    pub fn model(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Look up a model by id, only if it has the given capability.
    pub fn model_with(&self, id: &str, capability: Capability) -> Option<&ModelDescriptor> {
        self.model(id).filter(|m| m.capability == capability)
    }

    /// All models with the given capability, in catalog order.
    pub fn models_with(&self, capability: Capability) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter().filter(move |m| m.capability == capability)
    }

    /// Whether the provider exposes at least one vision and one text model.
    pub fn is_usable(&self) -> bool {
        self.models_with(Capability::Vision).next().is_some()
            && self.models_with(Capability::Text).next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ProviderDescriptor {
        ProviderDescriptor::new("acme", "Acme AI")
            .with_credential("ACME_API_KEY")
            .with_model(ModelDescriptor::new(
                "eye-1",
                Capability::Vision,
                "https://acme.test/v1/vision",
                300,
            ))
            .with_model(ModelDescriptor::new(
                "word-1",
                Capability::Text,
                "https://acme.test/v1/text",
                150,
            ))
    }

    #[test]
    fn model_with_checks_capability() {
        let p = provider();
        assert!(p.model_with("eye-1", Capability::Vision).is_some());
        assert!(p.model_with("eye-1", Capability::Text).is_none());
        assert!(p.model_with("missing", Capability::Text).is_none());
    }

    #[test]
    fn usable_needs_both_capabilities() {
        assert!(provider().is_usable());
        let text_only = ProviderDescriptor::new("t", "T").with_model(ModelDescriptor::new(
            "w",
            Capability::Text,
            "http://localhost",
            10,
        ));
        assert!(!text_only.is_usable());
    }

    #[test]
    fn descriptor_json_shape() {
        let json = serde_json::to_value(provider()).unwrap();
        assert_eq!(json["requiresCredential"], true);
        assert_eq!(json["credentialKey"], "ACME_API_KEY");
        assert_eq!(json["models"][0]["capability"], "vision");
        assert_eq!(json["models"][1]["maxOutputTokens"], 150);
    }
}
