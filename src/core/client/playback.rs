//! FIFO playback queue for returned agent audio.
//!
//! Segments play strictly in arrival order; a decode or device error on one
//! segment never blocks the queue, the drain simply advances to the next.
//! `stop_all` clears the queue and halts the current segment, and is safe to
//! call at any time, including when nothing is playing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AudioSegment {
    pub agent_id: String,
    pub audio: Bytes,
}

#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("audio decode failed: {0}")]
    Decode(String),
    #[error("playback failed: {0}")]
    Device(String),
}

/// Output device abstraction.
///
/// `play` resolves when the segment finishes or fails; `stop` halts whatever
/// is currently playing and must be a no-op when idle.
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, segment: &AudioSegment) -> Result<(), PlaybackError>;
    fn stop(&self);
}

pub struct PlaybackQueue {
    queue: Mutex<VecDeque<AudioSegment>>,
    playing: AtomicBool,
    /// Bumped by `stop_all`; an in-progress drain observes the change and
    /// stops before pulling another segment.
    generation: AtomicU64,
}

impl Default for PlaybackQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            playing: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    pub fn enqueue(&self, segment: AudioSegment) {
        self.queue.lock().push_back(segment);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Clear the queue and halt the current segment immediately.
    ///
    /// Callable at any time; does nothing beyond `sink.stop()` when idle.
    pub fn stop_all(&self, sink: &dyn AudioSink) {
        self.queue.lock().clear();
        self.generation.fetch_add(1, Ordering::AcqRel);
        sink.stop();
    }

    /// Play queued segments in FIFO order until the queue is empty or
    /// `stop_all` intervenes. Errors on individual segments are logged and
    /// skipped. Re-entrant calls while a drain is running return immediately.
    pub async fn drain(&self, sink: &dyn AudioSink) {
        if self.playing.swap(true, Ordering::AcqRel) {
            return;
        }
        let generation = self.generation.load(Ordering::Acquire);

        loop {
            if self.generation.load(Ordering::Acquire) != generation {
                break;
            }
            let Some(segment) = self.queue.lock().pop_front() else {
                break;
            };
            if let Err(e) = sink.play(&segment).await {
                warn!(agent_id = %segment.agent_id, "playback failed, skipping segment: {e}");
                continue;
            }
        }

        self.playing.store(false, Ordering::Release);
    }
}
