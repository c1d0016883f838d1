use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use crate::protocol::{ParticipantInfo, ServerEvent};

/// Delivery handle for one participant's transport.
///
/// The connection's writer task drains this channel, which serializes all
/// outbound frames for that socket. Sending to a departed participant fails
/// and is ignored everywhere.
pub type Outbound = mpsc::UnboundedSender<ServerEvent>;

/// One connected user inside a room.
///
/// `name` and `language` are fixed for the lifetime of the connection.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub language: String,
    outbound: Outbound,
}

impl Participant {
    pub fn new(id: String, name: String, language: String, outbound: Outbound) -> Self {
        Self {
            id,
            name,
            language,
            outbound,
        }
    }

    /// Pushes an event to this participant's transport. A closed channel
    /// (participant already disconnected) is not an error.
    pub fn send(&self, event: ServerEvent) {
        if self.outbound.send(event).is_err() {
            debug!(participant_id = %self.id, "Dropping event for departed participant");
        }
    }

    pub fn info(&self) -> ParticipantInfo {
        ParticipantInfo {
            user_id: self.id.clone(),
            language: self.language.clone(),
            name: self.name.clone(),
        }
    }
}

/// Append-only conversation history entry, used as agent-query context.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub speaker: String,
    pub language: String,
    pub text: String,
}

#[derive(Default)]
struct RoomInner {
    /// Insertion order preserved; rooms are small, so id lookups scan.
    participants: Vec<Participant>,
    history: Vec<HistoryEntry>,
}

/// A named collection of participants plus the room's conversation log.
pub struct Room {
    code: String,
    inner: RwLock<RoomInner>,
}

impl Room {
    pub fn new(code: String) -> Self {
        Self {
            code,
            inner: RwLock::new(RoomInner::default()),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn add_participant(&self, participant: Participant) {
        self.inner.write().participants.push(participant);
    }

    /// Removes a participant by id. Returns whether one was removed.
    pub fn remove_participant(&self, participant_id: &str) -> bool {
        let mut inner = self.inner.write();
        let before = inner.participants.len();
        inner.participants.retain(|p| p.id != participant_id);
        inner.participants.len() != before
    }

    pub fn participant_count(&self) -> usize {
        self.inner.read().participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().participants.is_empty()
    }

    pub fn participant_infos(&self) -> Vec<ParticipantInfo> {
        self.inner.read().participants.iter().map(Participant::info).collect()
    }

    /// Clones a participant (including its delivery handle) by id.
    pub fn participant(&self, participant_id: &str) -> Option<Participant> {
        self.inner
            .read()
            .participants
            .iter()
            .find(|p| p.id == participant_id)
            .cloned()
    }

    /// Looks up a participant's (name, language) pair.
    pub fn participant_identity(&self, participant_id: &str) -> Option<(String, String)> {
        self.inner
            .read()
            .participants
            .iter()
            .find(|p| p.id == participant_id)
            .map(|p| (p.name.clone(), p.language.clone()))
    }

    /// Sends an event to every current participant.
    pub fn broadcast(&self, event: ServerEvent) {
        for participant in self.inner.read().participants.iter() {
            participant.send(event.clone());
        }
    }

    /// Stable snapshot of everyone except `speaker_id`, taken at the moment
    /// an utterance finalizes. A participant leaving afterwards just makes
    /// its send fail silently.
    pub fn listener_snapshot(&self, speaker_id: &str) -> Vec<Participant> {
        self.inner
            .read()
            .participants
            .iter()
            .filter(|p| p.id != speaker_id)
            .cloned()
            .collect()
    }

    pub fn append_history(&self, entry: HistoryEntry) {
        self.inner.write().history.push(entry);
    }

    pub fn history_len(&self) -> usize {
        self.inner.read().history.len()
    }

    /// Renders the conversation log as `speaker (language): text` lines in
    /// chronological order.
    pub fn history_context(&self) -> String {
        self.inner
            .read()
            .history
            .iter()
            .map(|entry| format!("{} ({}): {}", entry.speaker, entry.language, entry.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
