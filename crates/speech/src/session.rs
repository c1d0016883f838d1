use tokio::sync::mpsc;
use tracing::debug;

use crate::{SessionEvent, SpeechBackend, StreamConfig};

/// Lifecycle of a transcription session.
///
/// `Closed` is terminal; a new session must be created to resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Streaming,
    Closed,
}

/// One live recognition stream for one participant and one language.
///
/// Wraps the backend's audio/event channel pair. The event receiver is
/// taken once by the owning connection task; audio is pushed here in
/// capture order. `finish` stops accepting audio and lets already-queued
/// results drain (flush-then-close).
pub struct TranscriptionSession {
    language: String,
    state: SessionState,
    audio_tx: Option<mpsc::Sender<Vec<u8>>>,
    events: Option<mpsc::Receiver<SessionEvent>>,
}

impl TranscriptionSession {
    /// Opens a streaming session against the given engine. The network
    /// handshake may suspend briefly.
    pub async fn open(
        backend: &dyn SpeechBackend,
        config: StreamConfig,
    ) -> anyhow::Result<Self> {
        let language = config.language.clone();
        let (audio_tx, events) = backend.start_stream(config).await?;
        debug!(%language, backend = backend.name(), "Transcription session opened");

        Ok(Self {
            language,
            state: SessionState::Streaming,
            audio_tx: Some(audio_tx),
            events: Some(events),
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Takes the event receiver. Yields `None` on the second call.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<SessionEvent>> {
        self.events.take()
    }

    /// Forwards one opaque audio chunk to the engine. Returns `false` once
    /// the session no longer accepts audio.
    pub async fn push_audio(&self, chunk: Vec<u8>) -> bool {
        match &self.audio_tx {
            Some(tx) => tx.send(chunk).await.is_ok(),
            None => false,
        }
    }

    /// Graceful termination: no more audio is accepted, in-flight results
    /// already queued by the engine still drain through the event channel.
    pub fn finish(&mut self) {
        self.audio_tx = None;
        self.state = SessionState::Closed;
    }
}
