use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use voxrelay_config::SynthesisSettings;

use crate::GatewayError;

/// Text-to-speech. Failures are non-fatal to callers: the pipeline logs
/// and skips audio delivery for the affected listener.
#[async_trait]
pub trait SynthesisGateway: Send + Sync + 'static {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, GatewayError>;
}

/// HTTP synthesizer speaking an ElevenLabs-style voice endpoint.
///
/// One shared voice is used for every listener.
pub struct HttpSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    voice_id: String,
    speed: f32,
    stability: f32,
    similarity_boost: f32,
}

impl HttpSynthesizer {
    pub fn new(settings: &SynthesisSettings, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            voice_id: settings.voice_id.clone(),
            speed: settings.speed,
            stability: settings.stability,
            similarity_boost: settings.similarity_boost,
        })
    }
}

#[async_trait]
impl SynthesisGateway for HttpSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, GatewayError> {
        let url = format!("{}/{}", self.endpoint, self.voice_id);
        let body = json!({
            "text": text,
            "model_id": "eleven_multilingual_v2",
            "voice_settings": {
                "speed": self.speed,
                "stability": self.stability,
                "similarity_boost": self.similarity_boost,
            },
        });

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::BadResponse(format!(
                "synthesis endpoint returned {status}"
            )));
        }

        let audio = response.bytes().await?.to_vec();
        debug!(bytes = audio.len(), "Synthesized speech payload");
        Ok(audio)
    }
}
