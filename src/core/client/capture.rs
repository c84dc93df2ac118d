//! Capture streaming: microphone frames in, wire-ready events out.
//!
//! The capture client owns a [`VolumeMonitor`] and turns its transitions into
//! the event sequence the server expects: `SpeechStart` before any chunks,
//! PCM16 chunks tagged with per-utterance sequence numbers while speech is
//! active, and `SpeechEnd` with the measured duration. Pausing suppresses
//! chunk transmission while monitoring continues for barge-in.

use std::time::Instant;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::sync::mpsc;
use tracing::debug;

use crate::core::audio::{AudioChunk, encode_pcm16};
use crate::core::now_ms;
use crate::core::vad::{MonitorEvent, VadConfig, VolumeMonitor};

/// Event produced by the capture client, mirroring the wire protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    SpeechStart { is_barge_in: bool },
    Chunk(AudioChunk),
    SpeechEnd { duration_ms: u64 },
}

pub struct CaptureClient {
    monitor: VolumeMonitor,
    sample_rate: u32,
    /// Per-utterance chunk counter; resets on every speech start.
    sequence: u32,
    /// Recording paused: chunks are suppressed, monitoring continues.
    paused: bool,
    sink: mpsc::UnboundedSender<CaptureEvent>,
}

impl CaptureClient {
    pub fn new(config: VadConfig, sink: mpsc::UnboundedSender<CaptureEvent>) -> Self {
        let sample_rate = config.sample_rate;
        Self {
            monitor: VolumeMonitor::new(config),
            sample_rate,
            sequence: 0,
            paused: false,
            sink,
        }
    }

    /// Current normalized volume for UI feedback.
    pub fn volume(&self) -> f32 {
        self.monitor.volume()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Process one captured frame, emitting any due events and the frame's
    /// encoded chunk when speech is active.
    pub fn process_frame(&mut self, samples: &[f32], now: Instant) {
        match self.monitor.process_frame(samples, now) {
            Some(MonitorEvent::SpeechStart) => {
                self.sequence = 0;
                self.send(CaptureEvent::SpeechStart { is_barge_in: false });
            }
            Some(MonitorEvent::BargeIn) => {
                // The monitor has already left paused mode; follow it so
                // chunks flow for the interrupting utterance.
                self.paused = false;
                self.sequence = 0;
                self.send(CaptureEvent::SpeechStart { is_barge_in: true });
            }
            Some(MonitorEvent::SpeechEnd { duration }) => {
                self.send(CaptureEvent::SpeechEnd {
                    duration_ms: duration.as_millis() as u64,
                });
            }
            None => {}
        }

        if self.monitor.is_speaking() && !self.paused {
            let chunk = AudioChunk {
                data: BASE64.encode(encode_pcm16(samples)),
                sequence: self.sequence,
                sample_rate: self.sample_rate,
                timestamp: now_ms(),
            };
            self.sequence += 1;
            self.send(CaptureEvent::Chunk(chunk));
        }
    }

    /// Suspend chunk transmission while agent audio plays back. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.monitor.set_paused(true);
            debug!("capture paused, monitoring for barge-in");
        }
    }

    /// Re-enable chunk transmission. Idempotent.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.monitor.set_paused(false);
            debug!("capture resumed");
        }
    }

    fn send(&self, event: CaptureEvent) {
        // A dropped receiver means the connection is gone; nothing to do.
        let _ = self.sink.send(event);
    }
}
