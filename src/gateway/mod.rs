//! Gateway implementations

mod builder;
mod provider;

pub use builder::{
    DEFAULT_PROVIDER, DEFAULT_TEXT_MODEL, DEFAULT_VISION_MODEL, ProviderGatewayBuilder,
};
pub use provider::ProviderGateway;

/// Activation state of a [`ProviderGateway`].
///
/// ```text
/// Uninitialized ──initialize()──► Configured ──► Ready
///        │
///        └──────────────────────► ConfiguredWithoutCredential (degraded)
/// ```
///
/// `Configured` is where a gateway rests when its settings name a known
/// provider but activation failed (bad model id, no backend).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayState {
    Uninitialized,
    Configured,
    /// Settings are present (or defaulted) but no usable credential is stored.
    ConfiguredWithoutCredential,
    Ready,
}

impl GatewayState {
    pub fn is_ready(self) -> bool {
        self == GatewayState::Ready
    }
}

impl std::fmt::Display for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayState::Uninitialized => "uninitialized",
            GatewayState::Configured => "configured",
            GatewayState::ConfiguredWithoutCredential => "configured (no credential)",
            GatewayState::Ready => "ready",
        };
        f.write_str(s)
    }
}
