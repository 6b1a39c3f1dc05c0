//! OpenAI chat-completions backend.

use serde_json::{Value, json};

use super::traits::{ProviderBackend, VISION_PROMPT, split_data_url, string_at};
use crate::Result;
use crate::types::ModelDescriptor;

/// OpenAI (and any chat-completions compatible) wire format.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiBackend;

impl ProviderBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn auth_headers(&self, credential: &str) -> Vec<(&'static str, String)> {
        vec![("authorization", format!("Bearer {credential}"))]
    }

    fn build_vision_request(&self, model: &ModelDescriptor, image: &str) -> Value {
        let image = split_data_url(image);
        json!({
            "model": model.id,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": VISION_PROMPT },
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:{};base64,{}", image.media_type, image.data)
                        }
                    }
                ]
            }],
            "max_tokens": model.max_output_tokens,
        })
    }

    fn build_text_request(&self, model: &ModelDescriptor, prompt: &str) -> Value {
        json!({
            "model": model.id,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": model.max_output_tokens,
            "response_format": { "type": "json_object" },
        })
    }

    fn extract_vision_response(&self, body: &Value) -> Result<String> {
        string_at(body, "/choices/0/message/content", self.name())
    }

    fn extract_text_response(&self, body: &Value) -> Result<String> {
        string_at(body, "/choices/0/message/content", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Capability;

    fn model() -> ModelDescriptor {
        ModelDescriptor::new(
            "gpt-4o-mini",
            Capability::Vision,
            "https://api.openai.com/v1/chat/completions",
            300,
        )
    }

    #[test]
    fn vision_request_embeds_data_url() {
        let body = OpenAiBackend.build_vision_request(&model(), "QUJD");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 300);
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert_eq!(
            content[1]["image_url"]["url"],
            "data:image/jpeg;base64,QUJD"
        );
    }

    #[test]
    fn text_request_asks_for_json_object() {
        let body = OpenAiBackend.build_text_request(&model(), "classify");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["content"], "classify");
    }

    #[test]
    fn bearer_auth() {
        let headers = OpenAiBackend.auth_headers("sk-test");
        assert_eq!(headers, vec![("authorization", "Bearer sk-test".to_string())]);
    }

    #[test]
    fn extracts_first_choice() {
        let body = json!({"choices": [{"message": {"content": "an editor"}}]});
        assert_eq!(OpenAiBackend.extract_vision_response(&body).unwrap(), "an editor");
    }
}
