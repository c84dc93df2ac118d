//! PCM audio helpers: 16-bit encoding, utterance reassembly, and WAV framing.
//!
//! Audio travels the wire as base64-encoded mono PCM16 little-endian chunks.
//! Chunks carry explicit sequence numbers because the transport makes no
//! ordering promise; reassembly sorts before concatenating. Transcription
//! providers want a proper container, so assembled utterances are wrapped in
//! a standard 44-byte WAV header.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard sample rate for speech capture and transcription.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio chunks to assemble")]
    Empty,
    #[error("invalid base64 audio data in chunk {sequence}")]
    InvalidBase64 { sequence: u32 },
}

/// One inbound audio chunk as carried by the wire protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioChunk {
    /// Base64-encoded PCM16 little-endian samples
    pub data: String,
    /// Per-utterance sequence number, starts at 0
    pub sequence: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Client-side capture timestamp (ms since epoch)
    pub timestamp: u64,
}

/// Root-mean-square amplitude of a frame of float samples.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Normalize an RMS value to a bounded [0, 1] volume signal for UI feedback.
pub fn normalized_volume(rms: f32) -> f32 {
    (rms * 10.0).min(1.0)
}

/// Convert float samples in [-1, 1] to 16-bit signed little-endian PCM.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let value = if clamped < 0.0 {
            (clamped * 0x8000 as f32) as i16
        } else {
            (clamped * 0x7fff as f32) as i16
        };
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Encode audio bytes for the wire.
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Reassemble an utterance from its chunks.
///
/// Chunks are sorted by sequence number before concatenation, so the result
/// is byte-identical regardless of arrival order. Returns the raw PCM bytes
/// and the sample rate reported by the first chunk (the client's audio stack
/// may override the requested rate).
pub fn assemble_utterance(mut chunks: Vec<AudioChunk>) -> Result<(Bytes, u32), AudioError> {
    if chunks.is_empty() {
        return Err(AudioError::Empty);
    }

    chunks.sort_by_key(|chunk| chunk.sequence);
    let sample_rate = chunks[0].sample_rate;

    let mut pcm = Vec::new();
    for chunk in &chunks {
        let decoded = BASE64.decode(&chunk.data).map_err(|_| AudioError::InvalidBase64 {
            sequence: chunk.sequence,
        })?;
        pcm.extend_from_slice(&decoded);
    }

    if pcm.is_empty() {
        return Err(AudioError::Empty);
    }

    Ok((Bytes::from(pcm), sample_rate))
}

/// Wrap raw mono PCM16 data in a WAV container.
pub fn wav_from_pcm(pcm: &[u8], sample_rate: u32) -> Bytes {
    const NUM_CHANNELS: u16 = 1;
    const BITS_PER_SAMPLE: u16 = 16;

    let bytes_per_sample = u32::from(BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate * u32::from(NUM_CHANNELS) * bytes_per_sample;
    let block_align = NUM_CHANNELS * (BITS_PER_SAMPLE / 8);
    let data_size = pcm.len() as u32;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // PCM fmt chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // audio format: PCM
    wav.extend_from_slice(&NUM_CHANNELS.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    wav.extend_from_slice(pcm);

    Bytes::from(wav)
}
