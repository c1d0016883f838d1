use std::sync::Arc;
use std::time::Duration;

use voxrelay_config::Settings;
use voxrelay_core::RoomRegistry;
use voxrelay_gateways::{SynthesisGateway, TranslationGateway};
use voxrelay_speech::SpeechBackend;

/// Shared application state, cloned into every connection task.
///
/// The external collaborators sit behind trait objects so tests can swap
/// in scripted implementations.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<RoomRegistry>,
    pub speech: Arc<dyn SpeechBackend>,
    pub translator: Arc<dyn TranslationGateway>,
    pub synthesizer: Arc<dyn SynthesisGateway>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        speech: Arc<dyn SpeechBackend>,
        translator: Arc<dyn TranslationGateway>,
        synthesizer: Arc<dyn SynthesisGateway>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            registry: Arc::new(RoomRegistry::new()),
            speech,
            translator,
            synthesizer,
        }
    }

    /// Bound on every unary gateway call, so one hung call cannot stall a
    /// room past this latency.
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.settings.gateway.timeout_ms)
    }
}
