//! Pure domain types shared across the workspace.
//!
//! These are data types with no I/O dependencies. Everything here is
//! `Clone`-able and (where it crosses the presentation boundary)
//! serde-serializable with camelCase field names.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ── Connection state ───────────────────────────────────────────────

/// Lifecycle state of the single chat-stream connection.
///
/// Exactly one instance exists, owned by the connection supervisor.
/// It is mutated only through the supervisor's transition function,
/// which also emits a `connection:status` event for every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection; `start()` is allowed.
    Idle,
    /// A connection attempt is in flight.
    Connecting,
    /// Connected and forwarding chat messages.
    Connected,
    /// A shutdown is in flight.
    Disconnecting,
    /// The connection was lost or could not be established; `start()`
    /// is allowed again.
    Failed,
}

impl ConnectionState {
    /// Stable label used on the wire and in status strings.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
            Self::Failed => "failed",
        }
    }

    /// Whether a connection attempt or live connection exists.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ── Speakers ───────────────────────────────────────────────────────

/// A synthesis voice known to the speech engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    /// Engine-assigned voice identifier.
    pub id: i64,
    /// Human-readable display name.
    pub name: String,
}

impl Speaker {
    /// Create a new speaker entry.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

// ── Synthesis ──────────────────────────────────────────────────────

/// A single text-to-speech request. Transient: created per call, never
/// stored beyond its processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    /// Text to synthesize.
    pub text: String,
    /// Voice to synthesize with.
    pub speaker: i64,
}

impl SynthesisRequest {
    /// Create a new synthesis request.
    pub fn new(text: impl Into<String>, speaker: i64) -> Self {
        Self {
            text: text.into(),
            speaker,
        }
    }
}

/// Audio produced by speech synthesis.
///
/// Ownership transfers from the synthesis dispatcher to the playback
/// queue on enqueue; the buffer is discarded after playback completes
/// or fails.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// PCM f32 mono samples.
    pub samples: Vec<f32>,
    /// Sample rate of the audio (e.g. 22 050 Hz).
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a buffer from raw samples.
    #[must_use]
    pub const fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Number of samples in the buffer.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no audio at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration implied by the sample count and rate.
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }
}
