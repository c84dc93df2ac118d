//! Wire messages for the voice socket. JSON, tagged by `type`, camelCase
//! field names.

use serde::{Deserialize, Serialize};

use crate::core::audio::AudioChunk;
use crate::core::now_ms;

/// Client-to-server messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum IncomingMessage {
    /// First message on the socket; binds the connection to a session.
    #[serde(rename = "connection_init", rename_all = "camelCase")]
    ConnectionInit {
        user_id: String,
        session_id: String,
        document_id: String,
    },

    /// The client's voice-activity detector opened an utterance.
    #[serde(rename = "speech_start", rename_all = "camelCase")]
    SpeechStart {
        #[serde(default)]
        user_id: Option<String>,
        /// Set when speech was detected over agent playback.
        #[serde(default)]
        is_barge_in: Option<bool>,
        #[serde(default)]
        timestamp: Option<u64>,
    },

    /// One base64 PCM frame of the current utterance.
    #[serde(rename = "audio_chunk")]
    AudioChunk(AudioChunk),

    /// The utterance ended; the buffered chunks form one recording.
    #[serde(rename = "speech_end", rename_all = "camelCase")]
    SpeechEnd {
        #[serde(default)]
        duration: Option<u64>,
    },

    #[serde(rename = "disconnect", rename_all = "camelCase")]
    Disconnect {
        #[serde(default)]
        user_id: Option<String>,
    },
}

/// Server-to-client messages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum OutgoingMessage {
    #[serde(rename = "connection_ack", rename_all = "camelCase")]
    ConnectionAck { visitor_id: String, timestamp: u64 },

    /// Stop playback immediately; the in-flight turn has been cancelled.
    #[serde(rename = "interrupt", rename_all = "camelCase")]
    Interrupt { timestamp: u64 },

    /// What the user was heard to say. Empty text means the utterance was
    /// unintelligible; no turn follows.
    #[serde(rename = "transcript", rename_all = "camelCase")]
    Transcript { text: String, timestamp: u64 },

    /// One persona's spoken reply. `audio` is base64 mp3 when available.
    #[serde(rename = "agent_response", rename_all = "camelCase")]
    AgentResponse {
        agent_id: String,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        audio: Option<String>,
        timestamp: u64,
    },

    #[serde(rename = "error", rename_all = "camelCase")]
    Error { message: String, timestamp: u64 },
}

impl OutgoingMessage {
    pub fn error(message: impl Into<String>) -> Self {
        OutgoingMessage::Error {
            message: message.into(),
            timestamp: now_ms(),
        }
    }
}
