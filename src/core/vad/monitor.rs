//! RMS volume monitor with hysteresis and barge-in detection.
//!
//! # State transitions
//!
//! ```text
//! [Idle] ──── rms > speech_threshold ────► [Speaking]
//!    ▲                                         │
//!    │   silence >= silence_duration           │
//!    └──── (voiced >= min_speech: SpeechEnd) ──┘
//!          (voiced <  min_speech: no event)
//!
//! [Paused] ─── rms > barge_in_threshold ──► [Speaking] (BargeIn)
//! ```
//!
//! The monitor is synchronous and clock-injected: callers pass `Instant`s so
//! tests can drive time deterministically. In a live client it runs as a
//! continuously rescheduled tick and never blocks.

use std::time::{Duration, Instant};

use tracing::debug;

use super::VadConfig;
use crate::core::audio::{normalized_volume, rms};

/// Event emitted by the monitor on a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Speech started after silence.
    SpeechStart,
    /// Speech ended after the silence window elapsed. Carries the voiced
    /// duration of the utterance.
    SpeechEnd { duration: Duration },
    /// The user started speaking over agent playback. Leaves paused mode.
    BargeIn,
}

/// Classifies audio frames into speech/silence/barge-in events.
pub struct VolumeMonitor {
    config: VadConfig,

    /// Whether we're currently inside a speech segment.
    speaking: bool,

    /// Paused mode: agent audio is playing back. Monitoring continues with
    /// the higher barge-in threshold.
    paused: bool,

    speech_started_at: Option<Instant>,

    /// Last frame above the active threshold; the silence timer restarts
    /// from here.
    last_voice_at: Option<Instant>,

    /// Last computed normalized volume, for UI feedback.
    volume: f32,
}

impl VolumeMonitor {
    pub fn new(config: VadConfig) -> Self {
        Self {
            config,
            speaking: false,
            paused: false,
            speech_started_at: None,
            last_voice_at: None,
            volume: 0.0,
        }
    }

    /// Current normalized volume in [0, 1].
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Enter or leave paused (agent playback) mode.
    ///
    /// Entering paused mode resets the speaking state so fresh speech can be
    /// detected as a barge-in.
    pub fn set_paused(&mut self, paused: bool) {
        if paused && !self.paused {
            self.speaking = false;
            self.speech_started_at = None;
            self.last_voice_at = None;
        }
        self.paused = paused;
    }

    /// Process one frame of float samples and return any triggered event.
    pub fn process_frame(&mut self, samples: &[f32], now: Instant) -> Option<MonitorEvent> {
        let level = rms(samples);
        self.volume = normalized_volume(level);

        // Higher threshold during playback rejects echo from the speakers.
        let active_threshold = if self.paused {
            self.config.barge_in_threshold
        } else {
            self.config.speech_threshold
        };

        if level > active_threshold {
            self.process_voice_frame(now)
        } else {
            self.process_silence_frame(now)
        }
    }

    fn process_voice_frame(&mut self, now: Instant) -> Option<MonitorEvent> {
        if self.paused {
            // User speaking over agent audio.
            debug!("barge-in detected during playback");
            self.paused = false;
            self.speaking = true;
            self.speech_started_at = Some(now);
            self.last_voice_at = Some(now);
            return Some(MonitorEvent::BargeIn);
        }

        self.last_voice_at = Some(now);

        if !self.speaking {
            self.speaking = true;
            self.speech_started_at = Some(now);
            debug!("speech started");
            return Some(MonitorEvent::SpeechStart);
        }

        None
    }

    fn process_silence_frame(&mut self, now: Instant) -> Option<MonitorEvent> {
        if !self.speaking {
            return None;
        }

        let last_voice = self.last_voice_at?;
        let silence = now.saturating_duration_since(last_voice);
        if silence < Duration::from_millis(self.config.silence_duration_ms) {
            return None;
        }

        // Silence window elapsed: the utterance is over either way.
        self.speaking = false;
        let started = self.speech_started_at.take()?;
        self.last_voice_at = None;

        let voiced = last_voice.saturating_duration_since(started);
        if voiced < Duration::from_millis(self.config.min_speech_duration_ms) {
            // Too short to be speech; discard as noise and keep listening.
            debug!(voiced_ms = voiced.as_millis() as u64, "utterance too short, ignoring");
            return None;
        }

        debug!(duration_ms = voiced.as_millis() as u64, "speech ended");
        Some(MonitorEvent::SpeechEnd { duration: voiced })
    }
}
