//! Wire-format trait implemented once per provider.
//!
//! A backend only translates: it builds the JSON body for a request and
//! pulls the interesting text back out of the response envelope. Sending
//! the request, status handling and telemetry live in the gateway, so a
//! new provider is one small impl of this trait plus a registry entry.

use serde_json::Value;

use crate::Result;
use crate::types::ModelDescriptor;

/// Instruction sent alongside every captured frame.
pub const VISION_PROMPT: &str = "What is in this image? Analyze this screenshot and describe \
what task the user appears to be working on. Focus on: 1) Open applications 2) Visible \
content 3) Any indicators of the type of work being performed.";

/// Request/response translation for one provider's HTTP API.
pub trait ProviderBackend: Send + Sync {
    /// Backend name for logging/metrics.
    fn name(&self) -> &str;

    /// Headers carrying the credential. Only called when the provider
    /// requires one.
    fn auth_headers(&self, credential: &str) -> Vec<(&'static str, String)>;

    /// Headers sent on every request regardless of credentials.
    fn extra_headers(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Body for a "describe this frame" request. `image` is base64, with or
    /// without a `data:` URL prefix.
    fn build_vision_request(&self, model: &ModelDescriptor, image: &str) -> Value;

    /// Body for a text-classification request.
    fn build_text_request(&self, model: &ModelDescriptor, prompt: &str) -> Value;

    /// Descriptive text from a vision response envelope.
    fn extract_vision_response(&self, body: &Value) -> Result<String>;

    /// Raw model output from a text response envelope, before JSON parsing.
    fn extract_text_response(&self, body: &Value) -> Result<String>;
}

/// A base64 image split into its media type and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage<'a> {
    pub media_type: &'a str,
    pub data: &'a str,
}

/// Media type assumed for bare base64 frames.
pub const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

/// Split `data:<mime>;base64,<payload>` into parts. Bare base64 is taken as JPEG.
pub fn split_data_url(image: &str) -> InlineImage<'_> {
    if let Some(rest) = image.strip_prefix("data:")
        && let Some((header, data)) = rest.split_once(',')
    {
        let media_type = header.strip_suffix(";base64").unwrap_or(header);
        return InlineImage {
            media_type: if media_type.is_empty() {
                DEFAULT_MEDIA_TYPE
            } else {
                media_type
            },
            data,
        };
    }
    InlineImage {
        media_type: DEFAULT_MEDIA_TYPE,
        data: image,
    }
}

/// Read a string at a JSON pointer, naming the pointer in the error.
pub(crate) fn string_at(body: &Value, pointer: &str, provider: &str) -> Result<String> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| {
            crate::TaskshotError::MalformedResponse(format!(
                "{provider} response has no string at {pointer}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_url_is_split() {
        let img = split_data_url("data:image/png;base64,AAAA");
        assert_eq!(img.media_type, "image/png");
        assert_eq!(img.data, "AAAA");
    }

    #[test]
    fn bare_base64_defaults_to_jpeg() {
        let img = split_data_url("/9j/4AAQ");
        assert_eq!(img.media_type, "image/jpeg");
        assert_eq!(img.data, "/9j/4AAQ");
    }

    #[test]
    fn string_at_reports_pointer() {
        let body = json!({"choices": []});
        let err = string_at(&body, "/choices/0/message/content", "openai").unwrap_err();
        assert!(err.to_string().contains("/choices/0/message/content"));
    }
}
