use axum::{
    extract::{State, WebSocketUpgrade, ws::{Message, WebSocket}},
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;
use voxrelay_core::ServerEvent;

use super::frame::Frame;
use super::orchestrator::Orchestrator;
use crate::state::AppState;

pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    info!(%connection_id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();

    // All outbound traffic for this connection funnels through one writer
    // task, so frames from control replies, session events and fan-out
    // tasks never interleave on the wire.
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let writer = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(%e, "Failed to serialize outbound event");
                    continue;
                }
            };
            if sink.send(Message::text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut orchestrator = Orchestrator::new(state, outbound_tx);

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                dispatch_frame(&mut orchestrator, Frame::decode(text.as_bytes())).await;
            }
            Ok(Message::Binary(data)) => {
                dispatch_frame(&mut orchestrator, Frame::decode(&data)).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(%connection_id, %e, "WebSocket error");
                break;
            }
        }
    }

    orchestrator.shutdown();
    writer.abort();
    info!(%connection_id, "WebSocket disconnected");
}

async fn dispatch_frame(orchestrator: &mut Orchestrator, frame: Frame) {
    match frame {
        Frame::Control(event) => orchestrator.handle_event(event).await,
        Frame::Audio(chunk) => orchestrator.handle_audio(chunk).await,
        Frame::Ignored => {}
    }
}
