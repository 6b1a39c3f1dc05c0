//! The user's active provider/model selection.

use serde::{Deserialize, Serialize};

/// Which provider and which two models the gateway should use.
///
/// Always replaced as a whole; there is no partial update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveConfiguration {
    pub provider_id: String,
    pub vision_model_id: String,
    pub text_model_id: String,
}

impl ActiveConfiguration {
    pub fn new(
        provider_id: impl Into<String>,
        vision_model_id: impl Into<String>,
        text_model_id: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            vision_model_id: vision_model_id.into(),
            text_model_id: text_model_id.into(),
        }
    }
}
