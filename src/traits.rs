//! Core ClassificationGateway trait

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::gateway::GatewayState;

/// The two model calls the capture pipeline needs.
///
/// [`ProviderGateway`](crate::ProviderGateway) is the real implementation;
/// the classifier and orchestrator only see this trait so they can be
/// driven by scripted gateways in tests.
#[async_trait]
pub trait ClassificationGateway: Send + Sync {
    /// Current activation state. Only `Ready` permits classify calls.
    fn state(&self) -> GatewayState;

    /// Describe a captured frame (base64, optionally a `data:` URL).
    async fn classify_image(&self, image: &str) -> Result<String>;

    /// Classify a prompt. Always returns a JSON object; unparseable model
    /// output is replaced by the fallback classification.
    async fn classify_text(&self, prompt: &str) -> Result<Value>;
}
