//! Volume-based voice activity detection.
//!
//! Classifies a continuous stream of audio frames into speech, silence, and
//! barge-in events from raw amplitude alone. The monitor has no knowledge of
//! transcription or dialogue; it only drives the `idle -> speaking -> idle`
//! state machine and exposes a normalized volume signal for UI feedback.

mod config;
mod monitor;

pub use config::VadConfig;
pub use monitor::{MonitorEvent, VolumeMonitor};
