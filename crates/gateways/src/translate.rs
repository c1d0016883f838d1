use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use voxrelay_config::TranslationSettings;

use crate::GatewayError;
use crate::languages::language_name;

/// Natural-language translation and general text generation.
///
/// `translate` produces colloquial target-language text for one utterance;
/// `generate` is the general-purpose capability used by agent queries.
#[async_trait]
pub trait TranslationGateway: Send + Sync + 'static {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, GatewayError>;

    async fn generate(&self, prompt: &str) -> Result<String, GatewayError>;
}

/// Builds the colloquial-translation instruction for one utterance.
pub fn translation_prompt(text: &str, source_language: &str, target_language: &str) -> String {
    format!(
        "Translate this {} phrase to {} in a natural, colloquial way as people actually speak:\n\
         \"{}\"\n\
         \n\
         Rules:\n\
         - Use everyday slang and expressions\n\
         - Match the casual/formal tone\n\
         - Sound natural, not literal\n\
         - ONE LINE ONLY - just the translation, nothing else",
        language_name(source_language),
        language_name(target_language),
        text,
    )
}

/// Builds the personal-mode translation instruction. Shorter than the
/// room-mode prompt: no tone-matching rules, just source and target.
pub fn personal_translation_prompt(
    text: &str,
    source_language: &str,
    target_language: &str,
) -> String {
    format!(
        "Translate this phrase naturally and colloquially:\n\
         \"{}\"\n\
         \n\
         From: {}\n\
         To: {}\n\
         \n\
         ONE LINE ONLY - just the translation.",
        text,
        language_name(source_language),
        language_name(target_language),
    )
}

/// Unary LLM gateway speaking a `generateContent`-style JSON API.
pub struct LlmTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl LlmTranslator {
    pub fn new(settings: &TranslationSettings, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    async fn generate_content(&self, prompt: &str) -> Result<String, GatewayError> {
        let url = format!("{}/{}:generateContent", self.endpoint, self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::BadResponse(format!(
                "generation endpoint returned {status}"
            )));
        }

        let value: serde_json::Value = response.json().await?;
        value["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| GatewayError::BadResponse("no candidate text in response".into()))
    }
}

#[async_trait]
impl TranslationGateway for LlmTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, GatewayError> {
        let prompt = translation_prompt(text, source_language, target_language);
        let translated = self.generate_content(&prompt).await?;
        debug!(
            source = %source_language,
            target = %target_language,
            "Translated utterance"
        );
        Ok(translated)
    }

    async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        self.generate_content(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_both_languages_and_quotes_text() {
        let prompt = translation_prompt("¿qué tal?", "es-ES", "en-US");
        assert!(prompt.contains("Spanish phrase to English"));
        assert!(prompt.contains("\"¿qué tal?\""));
        assert!(prompt.contains("ONE LINE ONLY"));
    }

    #[test]
    fn prompt_falls_back_to_raw_codes() {
        let prompt = translation_prompt("hey", "xx-YY", "en-US");
        assert!(prompt.contains("xx-YY phrase to English"));
    }

    #[test]
    fn personal_prompt_names_languages_on_their_own_lines() {
        let prompt = personal_translation_prompt("good morning", "en-US", "fr-FR");
        assert!(prompt.starts_with("Translate this phrase naturally and colloquially:"));
        assert!(prompt.contains("\"good morning\""));
        assert!(prompt.contains("From: English"));
        assert!(prompt.contains("To: French"));
        assert!(prompt.contains("ONE LINE ONLY - just the translation."));
        // Room-mode rules stay out of the personal prompt.
        assert!(!prompt.contains("Rules:"));
    }
}
