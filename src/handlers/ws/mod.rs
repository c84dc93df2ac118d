//! WebSocket voice endpoint.
//!
//! One socket carries one conversation. The client streams voice-activity
//! events and base64 PCM chunks; the server answers with transcripts and
//! per-persona spoken replies, and raises an in-band `interrupt` event when
//! the user barges in over playback.
//!
//! ## Connection flow
//! 1. Client connects to `/ws/voice` and sends `connection_init` with its
//!    user, session, and document identifiers.
//! 2. Server replies `connection_ack` with a visitor id.
//! 3. Each utterance is `speech_start`, then `audio_chunk`s, then
//!    `speech_end`; the server transcribes the utterance and runs a dialogue
//!    turn, streaming `transcript` and `agent_response` events back.
//! 4. A `speech_start` with `isBargeIn: true` cancels any in-flight turn; the
//!    server emits `interrupt` so the client stops playback.
//! 5. `disconnect` (or closing the socket) ends the conversation.

mod handler;
mod messages;
mod processor;
mod session;

pub use handler::ws_voice_handler;
pub use messages::{IncomingMessage, OutgoingMessage};
pub use session::ConnectionSession;
