//! External service seams.
//!
//! Transcription, persona generation, routing decisions, and persistence are
//! all consumed through traits with constructor-injected handles, so tests
//! substitute fakes and the dialogue engine never touches a concrete client.
//!
//! - `openai` - OpenAI-backed transcription, routing, and persona voices
//! - `memory` - in-memory document/session/message store

pub mod memory;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

/// Error type shared by all external services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Audio(#[from] crate::core::audio::AudioError),
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Network(err.to_string())
    }
}

/// Role of one chat turn sent to a language model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One prompt turn for a language-model call.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// A generated persona reply: text plus an optional audio rendering.
#[derive(Debug, Clone)]
pub struct SpokenReply {
    pub text: String,
    pub audio: Option<Bytes>,
}

/// Batch speech-to-text over an assembled utterance.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe a complete WAV-framed utterance. An empty string means
    /// nothing intelligible was said; that is not an error.
    async fn transcribe(&self, wav: Bytes) -> Result<String, ServiceError>;
}

/// Combined text and speech generation for a persona.
#[async_trait]
pub trait PersonaVoice: Send + Sync {
    /// Generate a reply in the given voice, with audio.
    async fn speak(&self, voice: &str, turns: &[ChatTurn]) -> Result<SpokenReply, ServiceError>;

    /// Text-only generation, used as the degraded path when audio fails.
    async fn speak_text(&self, turns: &[ChatTurn]) -> Result<String, ServiceError>;
}

/// Language-model judgment calls for the turn router.
#[async_trait]
pub trait DialogueModel: Send + Sync {
    /// Return the model's raw completion for a routing prompt. The caller
    /// parses and validates it; garbage in means a deterministic fallback,
    /// never a retry loop.
    async fn decide(&self, system: &str, user: &str) -> Result<String, ServiceError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub id: String,
    pub created_at: u64,
    pub doc_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub document_id: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageRecord {
    pub id: String,
    pub document_id: String,
    pub created_at: u64,
    pub sender: String,
    pub text: String,
}

/// Simple create/read persistence for documents, sessions, and messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create_document(&self, doc_text: String) -> Result<DocumentRecord, ServiceError>;
    async fn get_document(&self, id: &str) -> Result<Option<DocumentRecord>, ServiceError>;
    async fn create_session(
        &self,
        user_id: String,
        document_id: String,
    ) -> Result<SessionRecord, ServiceError>;
    async fn get_session(&self, id: &str) -> Result<Option<SessionRecord>, ServiceError>;
    async fn save_message(
        &self,
        document_id: &str,
        sender: &str,
        text: &str,
    ) -> Result<MessageRecord, ServiceError>;
    async fn messages_for_document(
        &self,
        document_id: &str,
    ) -> Result<Vec<MessageRecord>, ServiceError>;
}

/// Bundle of injected service handles shared across the server.
#[derive(Clone)]
pub struct Services {
    pub stt: Arc<dyn SpeechToText>,
    pub voice: Arc<dyn PersonaVoice>,
    pub dialogue_model: Arc<dyn DialogueModel>,
    pub store: Arc<dyn MessageStore>,
}
