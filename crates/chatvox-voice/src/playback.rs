//! Playback queue — serializes audio buffers to a single output device.
//!
//! A bounded queue with exactly one consumer: at most one buffer is
//! active at any time, the rest wait in FIFO order. A full queue
//! rejects new buffers instead of blocking, because for a live chat
//! feed dropping excess speech is preferable to stalling. One bad
//! buffer never stalls the queue: playback failures are reported as
//! events and the loop moves on.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use chatvox_core::{AppEvent, AppEventEmitter, AudioBuffer};

use crate::error::VoiceError;

// ── AudioSink ──────────────────────────────────────────────────────

/// Abstraction over the audio output device: play these bytes, report
/// completion or failure.
///
/// # Object safety
/// All methods take `&self`, so the trait is object-safe and usable as
/// `Arc<dyn AudioSink>` inside [`PlaybackQueue`]. Interior mutability
/// handles state changes inside each implementation.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play one buffer to completion.
    ///
    /// Resolves when the buffer has drained naturally or was stopped
    /// via [`stop`](Self::stop); returns an error on device or decode
    /// failure.
    async fn play(&self, buffer: AudioBuffer) -> Result<(), VoiceError>;

    /// Interrupt the currently playing buffer, if any.
    ///
    /// Must cause a pending [`play`](Self::play) call to resolve
    /// promptly.
    fn stop(&self);
}

// ── Playback queue ─────────────────────────────────────────────────

/// Configuration for the playback queue.
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Maximum number of pending buffers. An enqueue at capacity fails
    /// with [`VoiceError::QueueFull`] and the buffer is discarded.
    pub capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { capacity: 16 }
    }
}

struct Shared {
    pending: Mutex<VecDeque<AudioBuffer>>,
    notify: Notify,
    sink: Arc<dyn AudioSink>,
    emitter: Arc<dyn AppEventEmitter>,
    capacity: usize,
}

/// Bounded queue of audio buffers with a single playback consumer.
///
/// Dropping the queue stops the consumer task after the active buffer
/// finishes.
pub struct PlaybackQueue {
    shared: Arc<Shared>,
    cancel: CancellationToken,
}

impl PlaybackQueue {
    /// Create the queue and spawn its playback loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        sink: Arc<dyn AudioSink>,
        emitter: Arc<dyn AppEventEmitter>,
        config: PlaybackConfig,
    ) -> Self {
        let shared = Arc::new(Shared {
            pending: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            sink,
            emitter,
            capacity: config.capacity.max(1),
        });
        let cancel = CancellationToken::new();
        tokio::spawn(run_loop(Arc::clone(&shared), cancel.clone()));
        Self { shared, cancel }
    }

    /// Append a buffer to the tail of the queue.
    ///
    /// Fails with [`VoiceError::QueueFull`] when the queue is at
    /// capacity; the buffer is discarded and the caller decides whether
    /// that matters.
    pub fn enqueue(&self, buffer: AudioBuffer) -> Result<(), VoiceError> {
        {
            let mut pending = self.shared.pending.lock().unwrap();
            if pending.len() >= self.shared.capacity {
                return Err(VoiceError::QueueFull {
                    capacity: self.shared.capacity,
                });
            }
            pending.push_back(buffer);
        }
        self.shared.notify.notify_one();
        Ok(())
    }

    /// Number of buffers waiting to play (excludes the active one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.pending.lock().unwrap().len()
    }

    /// Whether no buffers are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop the active buffer immediately and discard all pending ones.
    pub fn clear(&self) {
        self.shared.pending.lock().unwrap().clear();
        self.shared.sink.stop();
        tracing::debug!("playback queue cleared");
    }
}

impl Drop for PlaybackQueue {
    fn drop(&mut self) {
        self.cancel.cancel();
        // Wake the loop if it is parked on an empty queue.
        self.shared.notify.notify_one();
    }
}

/// The single playback consumer.
///
/// Pops the head, plays it through the sink, and keeps going on
/// per-buffer failures — they are reported via the emitter, never
/// propagated as fatal.
async fn run_loop(shared: Arc<Shared>, cancel: CancellationToken) {
    loop {
        let next = shared.pending.lock().unwrap().pop_front();
        match next {
            Some(buffer) => {
                let duration = buffer.duration();
                if let Err(e) = shared.sink.play(buffer).await {
                    tracing::warn!(error = %e, "audio buffer failed to play, continuing");
                    shared.emitter.emit(AppEvent::playback_error(e.to_string()));
                } else {
                    tracing::trace!(?duration, "audio buffer finished");
                }
            }
            None => {
                tokio::select! {
                    () = shared.notify.notified() => {}
                    () = cancel.cancelled() => break,
                }
            }
        }
        if cancel.is_cancelled() {
            break;
        }
    }
    tracing::debug!("playback loop stopped");
}
