use crate::core::audio::DEFAULT_SAMPLE_RATE;

/// Configuration for the volume monitor.
///
/// The threshold values are empirically tuned constants carried as
/// configuration rather than hard-coded, so deployments can adjust them for
/// their acoustic environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VadConfig {
    /// RMS threshold for speech detection while actively listening.
    pub speech_threshold: f32,

    /// Higher RMS threshold used while agent audio is being played back.
    ///
    /// Playback leaks into the microphone; requiring a louder signal during
    /// playback keeps acoustic feedback from triggering false interruptions.
    pub barge_in_threshold: f32,

    /// Continuous silence (ms) before an utterance is considered ended.
    pub silence_duration_ms: u64,

    /// Minimum voiced duration (ms) for an utterance to count as speech.
    ///
    /// Anything shorter is discarded as noise: no speech-end is emitted and
    /// the monitor returns to listening.
    pub min_speech_duration_ms: u64,

    /// Capture sample rate in Hz.
    pub sample_rate: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            speech_threshold: 0.12,
            barge_in_threshold: 0.2,
            silence_duration_ms: 900,
            min_speech_duration_ms: 300,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl VadConfig {
    pub fn with_speech_threshold(mut self, threshold: f32) -> Self {
        self.speech_threshold = threshold;
        self
    }

    pub fn with_barge_in_threshold(mut self, threshold: f32) -> Self {
        self.barge_in_threshold = threshold;
        self
    }

    pub fn with_silence_duration_ms(mut self, duration_ms: u64) -> Self {
        self.silence_duration_ms = duration_ms;
        self
    }

    pub fn with_min_speech_duration_ms(mut self, duration_ms: u64) -> Self {
        self.min_speech_duration_ms = duration_ms;
        self
    }
}
