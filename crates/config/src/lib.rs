use anyhow::Result;
use serde::Deserialize;

/// Top-level settings tree for the relay.
///
/// Loaded from an optional `config/voxrelay.toml` file, with `VOXRELAY_`
/// prefixed environment variables overriding individual keys
/// (e.g. `VOXRELAY_SERVER__PORT=9090`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub speech: SpeechSettings,
    #[serde(default)]
    pub translation: TranslationSettings,
    #[serde(default)]
    pub synthesis: SynthesisSettings,
    #[serde(default)]
    pub gateway: GatewaySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Connection parameters for the external streaming speech engine.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechSettings {
    /// WebSocket endpoint of the recognition engine.
    #[serde(default = "default_speech_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    /// Capture sample rate of inbound audio chunks.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

/// Unary LLM endpoint used for translation, rewriting and agent answers.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationSettings {
    #[serde(default = "default_translation_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_translation_model")]
    pub model: String,
}

/// Text-to-speech endpoint and voice shaping.
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisSettings {
    #[serde(default = "default_synthesis_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_stability")]
    pub stability: f32,
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
}

/// Bounds on outbound gateway calls so one hung listener cannot stall a room.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            endpoint: default_speech_endpoint(),
            api_key: String::new(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            endpoint: default_translation_endpoint(),
            api_key: String::new(),
            model: default_translation_model(),
        }
    }
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            endpoint: default_synthesis_endpoint(),
            api_key: String::new(),
            voice_id: default_voice_id(),
            speed: default_speed(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/voxrelay").required(false))
            .add_source(
                config::Environment::with_prefix("VOXRELAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_speech_endpoint() -> String {
    "wss://speech.example.com/v1/stream".to_string()
}

fn default_sample_rate() -> u32 {
    48_000
}

fn default_translation_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}

fn default_translation_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_synthesis_endpoint() -> String {
    "https://api.elevenlabs.io/v1/text-to-speech".to_string()
}

fn default_voice_id() -> String {
    "pNInz6obpgDQGcFmaJgB".to_string()
}

fn default_speed() -> f32 {
    0.85
}

fn default_stability() -> f32 {
    0.5
}

fn default_similarity_boost() -> f32 {
    0.75
}

fn default_timeout_ms() -> u64 {
    15_000
}
