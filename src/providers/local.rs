//! Backend for a self-hosted model server.
//!
//! The local server takes flat bodies: `{image, prompt, max_tokens}` for
//! vision and `{prompt, max_tokens}` for text, and answers with
//! `{description}` and `{response}` respectively.

use serde_json::{Value, json};

use super::traits::{ProviderBackend, VISION_PROMPT, split_data_url, string_at};
use crate::Result;
use crate::types::ModelDescriptor;

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalBackend;

impl ProviderBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    fn auth_headers(&self, credential: &str) -> Vec<(&'static str, String)> {
        vec![("authorization", format!("Bearer {credential}"))]
    }

    fn build_vision_request(&self, model: &ModelDescriptor, image: &str) -> Value {
        json!({
            "image": split_data_url(image).data,
            "prompt": VISION_PROMPT,
            "max_tokens": model.max_output_tokens,
        })
    }

    fn build_text_request(&self, model: &ModelDescriptor, prompt: &str) -> Value {
        json!({
            "prompt": prompt,
            "max_tokens": model.max_output_tokens,
        })
    }

    fn extract_vision_response(&self, body: &Value) -> Result<String> {
        string_at(body, "/description", self.name())
    }

    fn extract_text_response(&self, body: &Value) -> Result<String> {
        string_at(body, "/response", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Capability;

    #[test]
    fn flat_bodies() {
        let model = ModelDescriptor::new("llama2", Capability::Text, "http://localhost:8080", 150);
        let body = LocalBackend.build_text_request(&model, "hi");
        assert_eq!(body, json!({"prompt": "hi", "max_tokens": 150}));

        let body = LocalBackend.build_vision_request(&model, "data:image/png;base64,QUJD");
        assert_eq!(body["image"], "QUJD");
    }

    #[test]
    fn envelopes() {
        assert_eq!(
            LocalBackend
                .extract_vision_response(&json!({"description": "a terminal"}))
                .unwrap(),
            "a terminal"
        );
        assert!(LocalBackend.extract_text_response(&json!({})).is_err());
    }
}
