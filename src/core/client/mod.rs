//! Client-side audio streaming components.
//!
//! These pieces run on the capture side of the connection:
//! - `capture` - encodes microphone frames into wire chunks and emits
//!   speech-start/end events driven by the volume monitor
//! - `playback` - FIFO queue of returned agent audio with interrupt support
//! - `mic` - microphone acquisition with user-actionable error classification

mod capture;
mod mic;
mod playback;

pub use capture::{CaptureClient, CaptureEvent};
pub use mic::{MicConstraints, MicError, MicrophoneSource, acquire};
pub use playback::{AudioSegment, AudioSink, PlaybackError, PlaybackQueue};
