//! Downstream processing for finalized transcripts: room fan-out, agent
//! queries, and personal-mode translation.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, warn};
use voxrelay_core::{HistoryEntry, Outbound, Participant, ServerEvent};
use voxrelay_gateways::{base_tag, language_name, personal_translation_prompt};

use crate::state::AppState;

/// Translates one finalized utterance for every other room participant and
/// delivers text plus synthesized audio to each.
///
/// The listener set is snapshotted at finalization; each listener runs as
/// its own task so nobody waits on another's gateway latency, and one
/// listener's failure never blocks the rest. The history entry is appended
/// exactly once per utterance, before delivery, regardless of listener
/// count.
pub async fn fan_out(
    state: AppState,
    room_code: String,
    speaker_id: String,
    text: String,
    source_language: String,
) {
    // Room vanished mid-flight: nobody is left to deliver to.
    let Some(room) = state.registry.get(&room_code) else {
        return;
    };
    let Some((speaker_name, _)) = room.participant_identity(&speaker_id) else {
        debug!(%speaker_id, "Speaker left before fan-out, abandoning utterance");
        return;
    };

    room.append_history(HistoryEntry {
        timestamp: Utc::now(),
        speaker: speaker_name.clone(),
        language: language_name(&source_language).to_string(),
        text: text.clone(),
    });

    let listeners = room.listener_snapshot(&speaker_id);
    debug!(
        %room_code,
        %speaker_id,
        listeners = listeners.len(),
        "Fanning out finalized utterance"
    );

    for listener in listeners {
        tokio::spawn(deliver_to_listener(
            state.clone(),
            listener,
            speaker_id.clone(),
            speaker_name.clone(),
            text.clone(),
            source_language.clone(),
        ));
    }
}

/// One listener's share of the fan-out. Failures are logged and scoped to
/// this listener only.
async fn deliver_to_listener(
    state: AppState,
    listener: Participant,
    speaker_id: String,
    speaker_name: String,
    original: String,
    source_language: String,
) {
    let translated = if base_tag(&source_language) == base_tag(&listener.language) {
        // Same base language: verbatim text, no gateway call.
        original.clone()
    } else {
        let call = state
            .translator
            .translate(&original, &source_language, &listener.language);
        match timeout(state.gateway_timeout(), call).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(listener = %listener.id, %e, "Translation failed, skipping listener");
                return;
            }
            Err(_) => {
                warn!(listener = %listener.id, "Translation timed out, skipping listener");
                return;
            }
        }
    };

    listener.send(ServerEvent::Translation {
        speaker_id,
        speaker_name,
        original,
        translated: translated.clone(),
    });

    match timeout(state.gateway_timeout(), state.synthesizer.synthesize(&translated)).await {
        Ok(Ok(audio)) => listener.send(ServerEvent::Audio {
            audio: BASE64.encode(audio),
        }),
        Ok(Err(e)) => warn!(listener = %listener.id, %e, "Synthesis failed, skipping audio"),
        Err(_) => warn!(listener = %listener.id, "Synthesis timed out, skipping audio"),
    }
}

/// Builds the agent prompt from the room's conversation log and a question.
pub fn agent_prompt(context: &str, question: &str, answer_language: &str) -> String {
    format!(
        "You are a helpful conversation assistant. You have access to the conversation history below.\n\
         \n\
         CONVERSATION HISTORY:\n\
         {}\n\
         \n\
         USER QUESTION: {}\n\
         \n\
         Provide a helpful, concise answer to the user's question based on the conversation history. \
         If the conversation history is empty or doesn't contain relevant information, politely say so.\n\
         \n\
         Answer in {} language.",
        context,
        question,
        language_name(answer_language),
    )
}

/// Answers one spoken question using the room's conversation history as
/// context. Response text and audio go to the asker only.
pub async fn agent_query(
    state: AppState,
    room_code: String,
    asker_id: String,
    question: String,
    language: String,
) {
    let Some(room) = state.registry.get(&room_code) else {
        return;
    };
    let Some(asker) = room.participant(&asker_id) else {
        return;
    };

    let context = room.history_context();
    let prompt = agent_prompt(&context, &question, &language);

    let response = match timeout(state.gateway_timeout(), state.translator.generate(&prompt)).await
    {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            warn!(%asker_id, %e, "Agent query failed");
            asker.send(ServerEvent::Error {
                message: "Could not process your question".into(),
            });
            return;
        }
        Err(_) => {
            warn!(%asker_id, "Agent query timed out");
            asker.send(ServerEvent::Error {
                message: "Could not process your question".into(),
            });
            return;
        }
    };

    asker.send(ServerEvent::AgentResponse {
        response: response.clone(),
    });

    match timeout(state.gateway_timeout(), state.synthesizer.synthesize(&response)).await {
        Ok(Ok(audio)) => asker.send(ServerEvent::Audio {
            audio: BASE64.encode(audio),
        }),
        Ok(Err(e)) => warn!(%asker_id, %e, "Agent response synthesis failed"),
        Err(_) => warn!(%asker_id, "Agent response synthesis timed out"),
    }
}

/// Stand-alone single-user translation: no room, no broadcast. Equal base
/// tags mean there is nothing to add beyond the transcript already sent,
/// so no translation or audio event is emitted at all.
pub async fn personal_mode(
    state: AppState,
    outbound: Outbound,
    text: String,
    source_language: String,
    target_language: String,
) {
    if base_tag(&source_language) == base_tag(&target_language) {
        return;
    }

    // Personal mode has its own shorter instruction, so this goes through
    // the general generation call rather than the room-mode translate.
    let prompt = personal_translation_prompt(&text, &source_language, &target_language);
    let call = state.translator.generate(&prompt);
    let translated = match timeout(state.gateway_timeout(), call).await {
        Ok(Ok(translated)) => translated,
        Ok(Err(e)) => {
            warn!(%e, "Personal mode translation failed");
            return;
        }
        Err(_) => {
            warn!("Personal mode translation timed out");
            return;
        }
    };

    let _ = outbound.send(ServerEvent::PersonalTranslation {
        translated: translated.clone(),
    });

    match timeout(state.gateway_timeout(), state.synthesizer.synthesize(&translated)).await {
        Ok(Ok(audio)) => {
            let _ = outbound.send(ServerEvent::PersonalAudio {
                audio: BASE64.encode(audio),
            });
        }
        Ok(Err(e)) => warn!(%e, "Personal mode synthesis failed"),
        Err(_) => warn!("Personal mode synthesis timed out"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_prompt_keeps_history_before_question() {
        let prompt = agent_prompt("A (English): hi\nB (French): salut", "what did B say?", "en-US");
        let history_pos = prompt.find("A (English): hi").unwrap();
        let second_pos = prompt.find("B (French): salut").unwrap();
        let question_pos = prompt.find("what did B say?").unwrap();
        assert!(history_pos < second_pos);
        assert!(second_pos < question_pos);
        assert!(prompt.contains("Answer in English language."));
    }
}
