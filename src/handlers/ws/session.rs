//! Per-connection conversation state.

use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::core::audio::AudioChunk;
use crate::core::dialogue::{AgentMessage, InterruptSignal};

/// State owned by the socket read loop for one connection.
///
/// Shared with pipeline tasks only through the interrupt signal; everything
/// else is cloned into the task at spawn time so the read loop never blocks
/// on a turn in flight.
pub struct ConnectionSession {
    pub visitor_id: Uuid,
    pub user_id: String,
    pub session_id: String,
    pub document_id: String,
    /// Document text resolved at init time, handed to every turn.
    pub document_text: String,
    /// Chunks of the utterance currently being captured.
    pub pending_audio: Vec<AudioChunk>,
    /// Cancellation signal for the most recently started turn.
    pub interrupt: Arc<InterruptSignal>,
    /// Rolling dialogue history across turns, shared with pipeline tasks.
    pub history: Arc<Mutex<Vec<AgentMessage>>>,
    pub initialized: bool,
}

impl ConnectionSession {
    pub fn new() -> Self {
        Self {
            visitor_id: Uuid::new_v4(),
            user_id: String::new(),
            session_id: String::new(),
            document_id: String::new(),
            document_text: String::new(),
            pending_audio: Vec::new(),
            interrupt: Arc::new(InterruptSignal::new()),
            history: Arc::new(Mutex::new(Vec::new())),
            initialized: false,
        }
    }

    /// Start capturing a new utterance.
    ///
    /// Raises the previous turn's signal (a no-op if no turn is running),
    /// drops any half-captured audio, and arms a fresh signal for the turn
    /// this utterance will become. Returns true when this call raised the
    /// previous signal, false when it was already raised.
    pub fn begin_utterance(&mut self) -> bool {
        let cancelled = self.interrupt.raise();
        self.pending_audio.clear();
        self.interrupt = Arc::new(InterruptSignal::new());
        cancelled
    }

    /// Take the buffered utterance, leaving the buffer empty.
    pub fn take_pending_audio(&mut self) -> Vec<AudioChunk> {
        std::mem::take(&mut self.pending_audio)
    }
}

impl Default for ConnectionSession {
    fn default() -> Self {
        Self::new()
    }
}
