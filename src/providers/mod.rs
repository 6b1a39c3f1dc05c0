//! Provider wire formats and model-output handling.
//!
//! Each supported provider implements [`ProviderBackend`]; the gateway
//! selects one per activation and never dispatches on provider names.

mod anthropic;
mod local;
mod openai;
pub mod parse;
pub mod retry;
pub mod traits;

pub use anthropic::{ANTHROPIC_VERSION, AnthropicBackend};
pub use local::LocalBackend;
pub use openai::OpenAiBackend;
pub use parse::{ParseFailure, fallback_classification, parse_model_json, strip_code_fences};
pub use retry::RetryConfig;
pub use traits::{ProviderBackend, VISION_PROMPT, split_data_url};
