pub mod remote;
pub mod session;

use async_trait::async_trait;
use tokio::sync::mpsc;

pub use session::{SessionState, TranscriptionSession};

/// Configuration for one streaming recognition session.
///
/// A session is bound to a single language at creation and is not reusable
/// across languages.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Locale code of the speaker (e.g. `en-US`).
    pub language: String,
    /// Whether the engine should emit interim (revisable) results.
    pub interim_results: bool,
    /// Capture sample rate of the opaque audio chunks.
    pub sample_rate: u32,
    /// Punctuation normalization.
    pub punctuate: bool,
}

impl StreamConfig {
    pub fn new(language: impl Into<String>, interim_results: bool) -> Self {
        Self {
            language: language.into(),
            interim_results,
            sample_rate: 48_000,
            punctuate: true,
        }
    }
}

/// Events emitted by a live recognition stream.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A transcript segment. Final segments will not be revised further.
    Transcript { text: String, is_final: bool },
    /// The stream failed mid-flight. The session is unusable afterwards.
    Error(String),
}

/// Trait for pluggable streaming speech engines.
///
/// `start_stream` hands back a sender for opaque audio chunks (capture
/// order, no gaps) and a receiver for recognition events. Dropping the
/// sender signals end of audio; the engine flushes queued results and then
/// closes the event channel.
#[async_trait]
pub trait SpeechBackend: Send + Sync + 'static {
    async fn start_stream(
        &self,
        config: StreamConfig,
    ) -> anyhow::Result<(mpsc::Sender<Vec<u8>>, mpsc::Receiver<SessionEvent>)>;

    /// Human-readable backend name.
    fn name(&self) -> &str;
}
