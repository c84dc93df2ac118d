//! Microphone acquisition with user-actionable error classification.
//!
//! Every failure category maps to a distinct, human-readable message so the
//! client can tell the user what to do instead of showing a generic failure.
//! Unsupported constraints get one retry with relaxed constraints before
//! giving up.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

/// Audio processing constraints requested from the capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl MicConstraints {
    /// Preferred constraints for voice capture.
    pub fn full() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }

    /// Bare capture with no processing, for devices that reject the full set.
    pub fn relaxed() -> Self {
        Self {
            echo_cancellation: false,
            noise_suppression: false,
            auto_gain_control: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MicError {
    #[error("Microphone access was denied. Allow microphone access in your settings and try again.")]
    PermissionDenied,
    #[error("No microphone found. Connect a microphone and try again.")]
    NoDevice,
    #[error("Microphone is in use by another application. Close other apps using the microphone and try again.")]
    DeviceBusy,
    #[error("The requested audio settings are not supported by this microphone.")]
    ConstraintsUnsupported,
    #[error("Microphone error: {0}")]
    Other(String),
}

/// Capture device abstraction; real clients wrap their platform audio API.
#[async_trait]
pub trait MicrophoneSource: Send + Sync {
    async fn open(&self, constraints: MicConstraints) -> Result<(), MicError>;
}

/// Open the microphone, retrying once with relaxed constraints if the full
/// set is unsupported. Returns the constraints that actually took effect.
pub async fn acquire(source: &dyn MicrophoneSource) -> Result<MicConstraints, MicError> {
    match source.open(MicConstraints::full()).await {
        Ok(()) => Ok(MicConstraints::full()),
        Err(MicError::ConstraintsUnsupported) => {
            warn!("full capture constraints unsupported, retrying relaxed");
            source.open(MicConstraints::relaxed()).await?;
            Ok(MicConstraints::relaxed())
        }
        Err(e) => Err(e),
    }
}
