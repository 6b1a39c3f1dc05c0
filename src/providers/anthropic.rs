//! Anthropic messages backend.

use serde_json::{Value, json};

use super::traits::{ProviderBackend, VISION_PROMPT, split_data_url, string_at};
use crate::Result;
use crate::types::ModelDescriptor;

/// API version pinned on every request.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages API wire format.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnthropicBackend;

impl ProviderBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn auth_headers(&self, credential: &str) -> Vec<(&'static str, String)> {
        vec![("x-api-key", credential.to_string())]
    }

    fn extra_headers(&self) -> Vec<(&'static str, String)> {
        vec![("anthropic-version", ANTHROPIC_VERSION.to_string())]
    }

    fn build_vision_request(&self, model: &ModelDescriptor, image: &str) -> Value {
        let image = split_data_url(image);
        json!({
            "model": model.id,
            "max_tokens": model.max_output_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": image.media_type,
                            "data": image.data,
                        }
                    },
                    { "type": "text", "text": VISION_PROMPT }
                ]
            }],
        })
    }

    fn build_text_request(&self, model: &ModelDescriptor, prompt: &str) -> Value {
        json!({
            "model": model.id,
            "max_tokens": model.max_output_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        })
    }

    fn extract_vision_response(&self, body: &Value) -> Result<String> {
        string_at(body, "/content/0/text", self.name())
    }

    fn extract_text_response(&self, body: &Value) -> Result<String> {
        string_at(body, "/content/0/text", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Capability;

    #[test]
    fn vision_request_uses_base64_source_block() {
        let model = ModelDescriptor::new(
            "claude-3-5-sonnet-latest",
            Capability::Vision,
            "https://api.anthropic.com/v1/messages",
            300,
        );
        let body = AnthropicBackend.build_vision_request(&model, "data:image/png;base64,QUJD");
        let source = &body["messages"][0]["content"][0]["source"];
        assert_eq!(source["type"], "base64");
        assert_eq!(source["media_type"], "image/png");
        assert_eq!(source["data"], "QUJD");
    }

    #[test]
    fn version_header_always_sent() {
        assert_eq!(
            AnthropicBackend.extra_headers(),
            vec![("anthropic-version", "2023-06-01".to_string())]
        );
        assert_eq!(AnthropicBackend.auth_headers("k")[0].0, "x-api-key");
    }

    #[test]
    fn extracts_first_content_block() {
        let body = json!({"content": [{"type": "text", "text": "{\"task\":\"x\"}"}]});
        assert_eq!(
            AnthropicBackend.extract_text_response(&body).unwrap(),
            "{\"task\":\"x\"}"
        );
    }
}
