//! The two fixed personas and their responder contract.
//!
//! Personas are a closed enum with match dispatch; adding a third persona is
//! a localized change to this file. The responder contract is part of the
//! turn engine's interruption semantics: a responder invoked with the
//! interrupt signal already raised produces nothing and performs no
//! generation call.

use tracing::warn;

use super::prompts::persona_system_prompt;
use super::{DialogueState, PersonaOutput, Speaker};
use crate::services::{ChatTurn, PersonaVoice, ServiceError};

/// One of the two fixed dialogue voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Persona {
    Critic,
    Creative,
}

impl Persona {
    /// Wire identifier, used as the `agentId` and as the persisted sender.
    pub fn id(&self) -> &'static str {
        match self {
            Persona::Critic => "critic",
            Persona::Creative => "creative",
        }
    }

    /// Fixed text-to-speech voice for this persona.
    pub fn voice(&self) -> &'static str {
        match self {
            Persona::Critic => "onyx",
            Persona::Creative => "shimmer",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Persona::Critic => "The Critic",
            Persona::Creative => "The Creative",
        }
    }

    /// The persona that takes the other side of the alternation.
    pub fn other(&self) -> Persona {
        match self {
            Persona::Critic => Persona::Creative,
            Persona::Creative => Persona::Critic,
        }
    }

    pub fn from_id(id: &str) -> Option<Persona> {
        match id {
            "critic" => Some(Persona::Critic),
            "creative" => Some(Persona::Creative),
            _ => None,
        }
    }
}

/// Map the dialogue history into chat turns for a persona's generation call.
fn chat_turns(persona: Persona, state: &DialogueState) -> Vec<ChatTurn> {
    let mut turns = vec![ChatTurn::system(persona_system_prompt(
        persona,
        &state.document_context,
    ))];
    for message in &state.messages {
        match message.speaker {
            Speaker::User => turns.push(ChatTurn::user(message.text.clone())),
            Speaker::Persona(p) => turns.push(ChatTurn::assistant(format!(
                "{}: {}",
                p.display_name(),
                message.text
            ))),
        }
    }
    turns
}

/// Run one persona step.
///
/// Returns `Ok(None)` without calling the provider when the interrupt signal
/// is already raised. On audio generation failure, degrades to a text-only
/// reply rather than failing the turn; only a failure of both paths is an
/// error.
pub async fn respond(
    persona: Persona,
    state: &DialogueState,
    voice: &dyn PersonaVoice,
) -> Result<Option<PersonaOutput>, ServiceError> {
    if state.interrupt.is_raised() {
        return Ok(None);
    }

    let turns = chat_turns(persona, state);

    match voice.speak(persona.voice(), &turns).await {
        Ok(reply) => Ok(Some(PersonaOutput {
            persona,
            text: reply.text,
            audio: reply.audio,
        })),
        Err(e) => {
            warn!(persona = persona.id(), "audio generation failed ({e}), falling back to text");
            let text = voice.speak_text(&turns).await?;
            Ok(Some(PersonaOutput { persona, text, audio: None }))
        }
    }
}
