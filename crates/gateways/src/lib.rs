pub mod languages;
pub mod synthesize;
pub mod translate;

use thiserror::Error;

pub use languages::{base_tag, language_name};
pub use synthesize::{HttpSynthesizer, SynthesisGateway};
pub use translate::{LlmTranslator, TranslationGateway, personal_translation_prompt};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected gateway response: {0}")]
    BadResponse(String),
}
