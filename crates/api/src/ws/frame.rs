use voxrelay_core::ClientEvent;

/// Classification of one inbound transport frame, decided once per frame.
///
/// The channel multiplexes JSON control messages and binary audio without a
/// framing layer: control messages are always well-formed text and audio
/// chunks are codec packets that never parse as JSON.
#[derive(Debug)]
pub enum Frame {
    /// A recognized control message.
    Control(ClientEvent),
    /// Valid JSON with an unrecognized shape; dropped without error.
    Ignored,
    /// Opaque binary audio for the active transcription session.
    Audio(Vec<u8>),
}

impl Frame {
    pub fn decode(raw: &[u8]) -> Frame {
        match serde_json::from_slice::<ClientEvent>(raw) {
            Ok(event) => Frame::Control(event),
            Err(_) if serde_json::from_slice::<serde_json::Value>(raw).is_ok() => Frame::Ignored,
            Err(_) => Frame::Audio(raw.to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_frames_decode() {
        let frame = Frame::decode(br#"{"type":"stop_speaking"}"#);
        assert!(matches!(
            frame,
            Frame::Control(ClientEvent::StopSpeaking)
        ));
    }

    #[test]
    fn unknown_type_is_ignored_not_audio() {
        let frame = Frame::decode(br#"{"type":"set_volume","level":3}"#);
        assert!(matches!(frame, Frame::Ignored));
    }

    #[test]
    fn malformed_control_json_is_ignored() {
        // Known tag but missing required fields: well-formed JSON, no-op.
        let frame = Frame::decode(br#"{"type":"join_room"}"#);
        assert!(matches!(frame, Frame::Ignored));
    }

    #[test]
    fn binary_codec_packets_are_audio() {
        // WebM/EBML magic, definitely not JSON.
        let packet = [0x1A, 0x45, 0xDF, 0xA3, 0x00, 0x01];
        match Frame::decode(&packet) {
            Frame::Audio(bytes) => assert_eq!(bytes, packet),
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
