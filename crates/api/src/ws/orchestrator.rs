use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;
use voxrelay_core::{ClientEvent, Outbound, Participant, Room, ServerEvent};
use voxrelay_speech::{SessionEvent, StreamConfig, TranscriptionSession};

use crate::pipeline;
use crate::state::AppState;

/// Where a session's finalized transcripts are routed.
#[derive(Debug, Clone)]
enum FinalRoute {
    /// Room mode: translate and deliver to every other participant.
    FanOut {
        room_code: String,
        speaker_id: String,
        language: String,
    },
    /// Agent mode: answer the asker from the room's history.
    AgentQuery {
        room_code: String,
        asker_id: String,
        answer_language: String,
    },
    /// Personal mode: translate back to the sender only.
    Personal {
        source_language: String,
        target_language: String,
    },
}

/// Aborts the session's event-consumer task on drop.
///
/// Replacing a session drops its guard, so no event from the old stream
/// can surface after the new one starts. A graceful stop detaches the
/// guard instead, letting already-queued recognition results drain.
struct ConsumerGuard(Option<AbortHandle>);

impl ConsumerGuard {
    fn detach(mut self) {
        self.0 = None;
    }
}

impl Drop for ConsumerGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }
}

struct ActiveSession {
    session: TranscriptionSession,
    guard: ConsumerGuard,
}

/// Per-connection state machine: sole owner of one transport connection's
/// lifecycle. Inbound events are handled one at a time in arrival order;
/// at most one transcription session is live at any moment.
pub struct Orchestrator {
    state: AppState,
    outbound: Outbound,
    user_id: Option<String>,
    room_code: Option<String>,
    active: Option<ActiveSession>,
    /// Consumer of a gracefully stopped session, kept so a later start (or
    /// disconnect) can cut off its remaining events.
    draining: Option<ConsumerGuard>,
}

impl Orchestrator {
    pub fn new(state: AppState, outbound: Outbound) -> Self {
        Self {
            state,
            outbound,
            user_id: None,
            room_code: None,
            active: None,
            draining: None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn room_code(&self) -> Option<&str> {
        self.room_code.as_deref()
    }

    pub fn has_active_session(&self) -> bool {
        self.active.is_some()
    }

    fn send(&self, event: ServerEvent) {
        let _ = self.outbound.send(event);
    }

    fn send_error(&self, message: impl Into<String>) {
        self.send(ServerEvent::Error {
            message: message.into(),
        });
    }

    pub async fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::CreateRoom { language, name } => {
                self.leave_current_room();
                let code = self.state.registry.create_room();
                // The room was just registered; the lookup cannot miss.
                if let Some(room) = self.state.registry.get(&code) {
                    self.enter_room(room, language, name, true);
                }
            }
            ClientEvent::JoinRoom {
                room_id,
                language,
                name,
            } => match self.state.registry.get(&room_id) {
                Some(room) => {
                    self.leave_current_room();
                    self.enter_room(room, language, name, false);
                }
                None => self.send_error("Room not found"),
            },
            ClientEvent::StartSpeaking => {
                let Some((user_id, room_code, language)) = self.joined_identity() else {
                    self.send_error("Join a room before speaking");
                    return;
                };
                let config = self.stream_config(language.clone(), true);
                let route = FinalRoute::FanOut {
                    room_code,
                    speaker_id: user_id,
                    language,
                };
                self.open_session(config, route).await;
            }
            ClientEvent::AgentQueryStart { language } => {
                let Some((user_id, room_code, room_language)) = self.joined_identity() else {
                    self.send_error("Join a room before asking the agent");
                    return;
                };
                let config = self.stream_config(language, false);
                let route = FinalRoute::AgentQuery {
                    room_code,
                    asker_id: user_id,
                    answer_language: room_language,
                };
                self.open_session(config, route).await;
            }
            ClientEvent::PersonalModeStart {
                source_language,
                target_language,
            } => {
                let config = self.stream_config(source_language.clone(), true);
                let route = FinalRoute::Personal {
                    source_language,
                    target_language,
                };
                self.open_session(config, route).await;
            }
            ClientEvent::StopSpeaking
            | ClientEvent::AgentQueryStop
            | ClientEvent::PersonalModeStop => {
                self.finish_session();
            }
        }
    }

    /// Forwards one opaque audio chunk to the active session; silently
    /// dropped when none is live.
    pub async fn handle_audio(&mut self, chunk: Vec<u8>) {
        match &self.active {
            Some(active) => {
                if !active.session.push_audio(chunk).await {
                    debug!("Audio after session close, dropped");
                }
            }
            None => trace!("Audio frame without active session, dropped"),
        }
    }

    /// Connection closed: end any session, leave the room, let the
    /// registry collect it if empty, and tell the survivors.
    pub fn shutdown(&mut self) {
        self.terminate_session();
        self.leave_current_room();
    }

    fn joined_identity(&self) -> Option<(String, String, String)> {
        let user_id = self.user_id.clone()?;
        let room_code = self.room_code.clone()?;
        let room = self.state.registry.get(&room_code)?;
        let (_, language) = room.participant_identity(&user_id)?;
        Some((user_id, room_code, language))
    }

    fn stream_config(&self, language: String, interim_results: bool) -> StreamConfig {
        StreamConfig {
            language,
            interim_results,
            sample_rate: self.state.settings.speech.sample_rate,
            punctuate: true,
        }
    }

    fn enter_room(&mut self, room: Arc<Room>, language: String, name: String, created: bool) {
        let user_id = Uuid::new_v4().to_string();
        room.add_participant(Participant::new(
            user_id.clone(),
            name,
            language,
            self.outbound.clone(),
        ));

        // A join can race the last departure: the handle was looked up
        // before the emptied room was swept. Re-check after inserting and
        // back out if the registry no longer points at this room.
        if !self.state.registry.is_current(&room) {
            room.remove_participant(&user_id);
            warn!(room_code = %room.code(), "Room swept during join, backing out");
            self.send_error("Room not found");
            return;
        }

        self.user_id = Some(user_id.clone());
        self.room_code = Some(room.code().to_string());

        info!(room_code = %room.code(), %user_id, created, "Participant joined room");

        let event = if created {
            ServerEvent::RoomCreated {
                room_id: room.code().to_string(),
                user_id,
            }
        } else {
            ServerEvent::RoomJoined {
                room_id: room.code().to_string(),
                user_id,
            }
        };
        self.send(event);

        room.broadcast(ServerEvent::ParticipantsUpdate {
            participants: room.participant_infos(),
        });
    }

    fn leave_current_room(&mut self) {
        let (Some(user_id), Some(room_code)) = (self.user_id.take(), self.room_code.take())
        else {
            return;
        };

        if let Some(room) = self.state.registry.get(&room_code) {
            room.remove_participant(&user_id);
            self.state.registry.remove_if_empty(&room_code);

            // If the room survived, tell the remaining participants.
            if let Some(room) = self.state.registry.get(&room_code) {
                room.broadcast(ServerEvent::ParticipantsUpdate {
                    participants: room.participant_infos(),
                });
            }
        }

        info!(%room_code, %user_id, "Participant left room");
    }

    /// Opens a new transcription session, first terminating any session
    /// still active on this connection.
    async fn open_session(&mut self, config: StreamConfig, route: FinalRoute) {
        self.terminate_session();

        let mut session =
            match TranscriptionSession::open(self.state.speech.as_ref(), config).await {
                Ok(session) => session,
                Err(e) => {
                    warn!(%e, "Failed to open transcription session");
                    self.send_error(format!("Could not start transcription: {e}"));
                    return;
                }
            };

        // The receiver is present on a freshly opened session.
        let Some(events) = session.take_events() else {
            self.send_error("Could not start transcription: no event stream");
            return;
        };

        let handle = tokio::spawn(consume_session_events(
            events,
            self.outbound.clone(),
            self.state.clone(),
            route,
        ));

        self.active = Some(ActiveSession {
            session,
            guard: ConsumerGuard(Some(handle.abort_handle())),
        });

        self.send(ServerEvent::Ready);
    }

    /// Graceful stop: no more audio, queued recognition results drain.
    /// The consumer's guard stays armed so a later start can end it.
    fn finish_session(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.session.finish();
            self.draining = Some(active.guard);
            debug!("Transcription session finished");
        }
    }

    /// Abrupt end (replacement or disconnect): consumers of both the
    /// active and any draining session are aborted so stale events cannot
    /// surface afterwards.
    fn terminate_session(&mut self) {
        self.draining = None;
        if let Some(mut active) = self.active.take() {
            active.session.finish();
            debug!("Transcription session terminated");
        }
    }
}

/// Drains one session's event stream, echoing transcripts to the sender
/// and routing finalized text into the matching pipeline.
async fn consume_session_events(
    mut events: mpsc::Receiver<SessionEvent>,
    outbound: Outbound,
    state: AppState,
    route: FinalRoute,
) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Transcript { text, is_final } => match &route {
                FinalRoute::FanOut {
                    room_code,
                    speaker_id,
                    language,
                } => {
                    let _ = outbound.send(ServerEvent::Transcript {
                        text: text.clone(),
                        is_final,
                    });
                    if is_final {
                        // Awaited inline: appends history before spawning
                        // per-listener work, keeping the log chronological
                        // across consecutive utterances.
                        pipeline::fan_out(
                            state.clone(),
                            room_code.clone(),
                            speaker_id.clone(),
                            text,
                            language.clone(),
                        )
                        .await;
                    }
                }
                FinalRoute::AgentQuery {
                    room_code,
                    asker_id,
                    answer_language,
                } => {
                    if is_final {
                        tokio::spawn(pipeline::agent_query(
                            state.clone(),
                            room_code.clone(),
                            asker_id.clone(),
                            text,
                            answer_language.clone(),
                        ));
                    }
                }
                FinalRoute::Personal {
                    source_language,
                    target_language,
                } => {
                    let _ = outbound.send(ServerEvent::PersonalTranscript { text: text.clone() });
                    if is_final {
                        tokio::spawn(pipeline::personal_mode(
                            state.clone(),
                            outbound.clone(),
                            text,
                            source_language.clone(),
                            target_language.clone(),
                        ));
                    }
                }
            },
            SessionEvent::Error(message) => {
                // Stream errors are reported but do not close the
                // connection; the session stays down until a fresh start.
                warn!(%message, "Transcription stream error");
                let _ = outbound.send(ServerEvent::Error { message });
            }
        }
    }

    debug!("Session event stream closed");
}
