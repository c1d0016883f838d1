use serde::{Deserialize, Serialize};

/// Inbound control messages, one variant per wire `type` tag.
///
/// Fields beyond the ones listed here are ignored on deserialization.
/// A well-formed JSON object with an unrecognized tag fails to parse into
/// this enum and is treated as a no-op by the frame demultiplexer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    CreateRoom {
        language: String,
        name: String,
    },
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        language: String,
        name: String,
    },
    StartSpeaking,
    StopSpeaking,
    AgentQueryStart {
        language: String,
    },
    AgentQueryStop,
    #[serde(rename_all = "camelCase")]
    PersonalModeStart {
        source_language: String,
        target_language: String,
    },
    PersonalModeStop,
}

/// Outbound events pushed to a client through its connection's writer task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    RoomCreated { room_id: String, user_id: String },
    #[serde(rename_all = "camelCase")]
    RoomJoined { room_id: String, user_id: String },
    ParticipantsUpdate { participants: Vec<ParticipantInfo> },
    #[serde(rename_all = "camelCase")]
    Transcript { text: String, is_final: bool },
    #[serde(rename_all = "camelCase")]
    Translation {
        speaker_id: String,
        speaker_name: String,
        original: String,
        translated: String,
    },
    /// Base64-encoded synthesized audio payload.
    Audio { audio: String },
    Ready,
    Error { message: String },
    AgentResponse { response: String },
    PersonalTranscript { text: String },
    PersonalTranslation { translated: String },
    PersonalAudio { audio: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub user_id: String,
    pub language: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_event_tags_round_trip() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"join_room","roomId":"ab12cd","language":"fr-FR","name":"Nadia"}"#,
        )
        .unwrap();
        match event {
            ClientEvent::JoinRoom {
                room_id,
                language,
                name,
            } => {
                assert_eq!(room_id, "ab12cd");
                assert_eq!(language, "fr-FR");
                assert_eq!(name, "Nadia");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unit_variants_parse_from_bare_type() {
        let event: ClientEvent = serde_json::from_str(r#"{"type":"start_speaking"}"#).unwrap();
        assert!(matches!(event, ClientEvent::StartSpeaking));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"create_room","language":"en-US","name":"Ana","clientVersion":"3.1"}"#,
        )
        .unwrap();
        assert!(matches!(event, ClientEvent::CreateRoom { .. }));
    }

    #[test]
    fn unknown_type_is_a_parse_error() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"reboot_server"}"#).is_err());
    }

    #[test]
    fn server_event_wire_shapes() {
        let json = serde_json::to_value(ServerEvent::Transcript {
            text: "hola".into(),
            is_final: true,
        })
        .unwrap();
        assert_eq!(json["type"], "transcript");
        assert_eq!(json["isFinal"], true);

        let json = serde_json::to_value(ServerEvent::Translation {
            speaker_id: "u1".into(),
            speaker_name: "Ana".into(),
            original: "hola".into(),
            translated: "hello".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "translation");
        assert_eq!(json["speakerId"], "u1");
        assert_eq!(json["speakerName"], "Ana");

        let json = serde_json::to_value(ServerEvent::ParticipantsUpdate {
            participants: vec![ParticipantInfo {
                user_id: "u1".into(),
                language: "en-US".into(),
                name: "Ana".into(),
            }],
        })
        .unwrap();
        assert_eq!(json["participants"][0]["userId"], "u1");

        let json = serde_json::to_value(ServerEvent::Ready).unwrap();
        assert_eq!(json["type"], "ready");
    }
}
