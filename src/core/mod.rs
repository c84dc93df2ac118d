//! Core voice-dialogue components
//!
//! This module contains the transport-independent pieces of the system:
//! - `audio` - PCM16 encoding, chunk reassembly, and WAV framing
//! - `vad` - RMS volume monitoring with speech/silence/barge-in detection
//! - `client` - capture streaming, playback queue, microphone acquisition
//! - `dialogue` - the two-persona turn engine (router, orchestrator, personas)

pub mod audio;
pub mod client;
pub mod dialogue;
pub mod vad;

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, used for wire-message timestamps.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
