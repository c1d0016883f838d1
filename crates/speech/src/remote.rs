use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

use crate::{SessionEvent, SpeechBackend, StreamConfig};

/// Result frame emitted by the remote recognition engine.
#[derive(Debug, Deserialize)]
struct EngineFrame {
    #[serde(default)]
    text: String,
    #[serde(default)]
    is_final: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Streaming speech engine reached over a bidirectional WebSocket.
///
/// Binary audio chunks go out as-is; JSON result frames come back with
/// `text` / `is_final` fields. Closing the audio sender sends a close
/// frame so the engine flushes pending recognition results before the
/// socket shuts down.
pub struct RemoteSpeechBackend {
    endpoint: String,
    api_key: String,
}

impl RemoteSpeechBackend {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    fn stream_url(&self, config: &StreamConfig) -> String {
        format!(
            "{}?language={}&sample_rate={}&interim_results={}&punctuate={}",
            self.endpoint,
            config.language,
            config.sample_rate,
            config.interim_results,
            config.punctuate,
        )
    }
}

#[async_trait]
impl SpeechBackend for RemoteSpeechBackend {
    async fn start_stream(
        &self,
        config: StreamConfig,
    ) -> anyhow::Result<(mpsc::Sender<Vec<u8>>, mpsc::Receiver<SessionEvent>)> {
        let url = self.stream_url(&config);
        let mut request = url.as_str().into_client_request()?;
        if !self.api_key.is_empty() {
            request.headers_mut().insert(
                "Authorization",
                HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
            );
        }

        let (socket, _response) = connect_async(request).await?;
        info!(language = %config.language, "Connected to speech engine");

        let (mut ws_sink, mut ws_stream) = socket.split();
        let (audio_tx, mut audio_rx) = mpsc::channel::<Vec<u8>>(64);
        let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(64);

        // Forward audio chunks in capture order; a dropped sender ends the
        // stream with a close frame so the engine flushes what it has.
        tokio::spawn(async move {
            while let Some(chunk) = audio_rx.recv().await {
                if ws_sink.send(Message::Binary(chunk.into())).await.is_err() {
                    warn!("Speech engine write failed, dropping remaining audio");
                    return;
                }
            }
            let _ = ws_sink.send(Message::Close(None)).await;
            debug!("Audio forwarding to speech engine complete");
        });

        let interim_wanted = config.interim_results;
        tokio::spawn(async move {
            while let Some(msg) = ws_stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        let frame: EngineFrame = match serde_json::from_str(text.as_str()) {
                            Ok(f) => f,
                            Err(e) => {
                                warn!(%e, "Unparseable frame from speech engine");
                                continue;
                            }
                        };

                        if let Some(error) = frame.error {
                            let _ = event_tx.send(SessionEvent::Error(error)).await;
                            break;
                        }
                        if frame.text.is_empty() {
                            continue;
                        }
                        if !frame.is_final && !interim_wanted {
                            continue;
                        }

                        let event = SessionEvent::Transcript {
                            text: frame.text,
                            is_final: frame.is_final,
                        };
                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        let _ = event_tx.send(SessionEvent::Error(e.to_string())).await;
                        break;
                    }
                }
            }
            debug!("Speech engine reader task exiting");
        });

        Ok((audio_tx, event_rx))
    }

    fn name(&self) -> &str {
        "remote_ws"
    }
}
