//! Dialogue state owned by the orchestrator for the lifetime of one turn.

use std::sync::Arc;

use bytes::Bytes;

use super::{InterruptSignal, Persona};

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Persona(Persona),
}

/// One message in the dialogue history. Insertion order is chronological.
#[derive(Debug, Clone)]
pub struct AgentMessage {
    pub speaker: Speaker,
    pub text: String,
}

impl AgentMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { speaker: Speaker::User, text: text.into() }
    }

    pub fn persona(persona: Persona, text: impl Into<String>) -> Self {
        Self { speaker: Speaker::Persona(persona), text: text.into() }
    }
}

/// One emitted persona reply: text plus optional rendered audio.
#[derive(Debug, Clone)]
pub struct PersonaOutput {
    pub persona: Persona,
    pub text: String,
    pub audio: Option<Bytes>,
}

/// Router output: the persona to invoke next, or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Persona(Persona),
    Finish,
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    Completed,
    Interrupted,
}

/// Mutable state for one turn (or resumed turn).
///
/// The message history is append-only within a turn. The interrupt signal is
/// shared by reference with the connection session and is checked at every
/// suspension point; once raised it is never cleared mid-turn.
pub struct DialogueState {
    pub messages: Vec<AgentMessage>,
    pub next: Route,
    /// Immutable per turn.
    pub document_context: String,
    pub interrupt: Arc<InterruptSignal>,
    /// Persona outputs accumulated during this turn.
    pub audio_outputs: Vec<PersonaOutput>,
}

impl DialogueState {
    /// Build the state for a fresh turn: seed history plus the new user
    /// message.
    pub fn new(
        seed: Vec<AgentMessage>,
        user_text: impl Into<String>,
        document_context: String,
        interrupt: Arc<InterruptSignal>,
    ) -> Self {
        let mut messages = seed;
        messages.push(AgentMessage::user(user_text));
        Self {
            messages,
            next: Route::Persona(Persona::Critic),
            document_context,
            interrupt,
            audio_outputs: Vec::new(),
        }
    }

    /// Append a message. History only ever grows within a turn.
    pub fn push(&mut self, message: AgentMessage) {
        self.messages.push(message);
    }

    fn last_user_index(&self) -> Option<usize> {
        self.messages.iter().rposition(|m| m.speaker == Speaker::User)
    }

    fn last_persona_index(&self) -> Option<usize> {
        self.messages
            .iter()
            .rposition(|m| matches!(m.speaker, Speaker::Persona(_)))
    }

    /// Whether the most recent user message is newer than all persona
    /// messages, i.e. a fresh or follow-up utterance opens a new topic.
    pub fn fresh_user_message(&self) -> bool {
        match (self.last_user_index(), self.last_persona_index()) {
            (Some(user), Some(persona)) => user > persona,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// The persona that spoke last, if any.
    pub fn last_persona(&self) -> Option<Persona> {
        self.messages.iter().rev().find_map(|m| match m.speaker {
            Speaker::Persona(p) => Some(p),
            Speaker::User => None,
        })
    }

    /// Persona turns taken on the current topic (since the last user
    /// message).
    pub fn topic_turns(&self) -> usize {
        let start = self.last_user_index().map(|i| i + 1).unwrap_or(0);
        self.messages[start..]
            .iter()
            .filter(|m| matches!(m.speaker, Speaker::Persona(_)))
            .count()
    }
}
