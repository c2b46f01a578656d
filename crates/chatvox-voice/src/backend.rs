//! Speech engine backend trait — the engine-agnostic synthesis interface.
//!
//! The orchestration service treats the text-to-speech engine as a black
//! box producing audio bytes and a voice catalog. This module defines
//! that boundary as an object-safe trait so that engines can be swapped
//! (or mocked in tests) without touching the dispatcher or catalog.

use async_trait::async_trait;

use chatvox_core::{AudioBuffer, Speaker};

use crate::error::VoiceError;

/// Backend-agnostic text-to-speech engine.
///
/// Implementations must be `Send + Sync` so the dispatcher can hold
/// them as `Arc<dyn TtsBackend>` across `.await` points.
///
/// `synthesize` is async (via [`async_trait`]) because engines may run
/// inference off-thread or over a socket; CPU-bound implementations are
/// expected to keep individual calls bounded and rely on the
/// dispatcher's admission gate for throughput control.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Synthesize text with the given voice.
    ///
    /// # Arguments
    /// * `text` — non-empty text to synthesize (the dispatcher rejects
    ///   empty input before calling here).
    /// * `speaker` — a voice id previously validated against
    ///   [`voices`](Self::voices).
    async fn synthesize(&self, text: &str, speaker: i64) -> Result<AudioBuffer, VoiceError>;

    /// Enumerate every voice the engine knows.
    ///
    /// Returns the full, uncapped set; display capping is the
    /// catalog's concern.
    fn voices(&self) -> Result<Vec<Speaker>, VoiceError>;
}
