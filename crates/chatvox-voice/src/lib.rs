//! Speech synthesis and playback for chatvox.
//!
//! Three components live here, mirroring the audio half of the
//! orchestration service:
//!
//! - [`SpeakerCatalog`] — caches the engine's voice list and owns the
//!   validated voice selection.
//! - [`SynthesisDispatcher`] — turns text + voice into an
//!   [`AudioBuffer`](chatvox_core::AudioBuffer), bounding concurrent
//!   synthesis work with a FIFO admission gate.
//! - [`PlaybackQueue`] — serializes buffers to a single output device,
//!   one buffer active at a time, resilient to per-buffer failures.
//!
//! The speech engine itself is a black box behind the [`TtsBackend`]
//! trait; the output device is behind [`AudioSink`]. [`RodioSink`] is
//! the production sink, and the `piper` feature provides a Piper
//! engine adapter.

pub mod backend;
#[cfg(feature = "piper")]
pub mod backend_piper;
pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod playback;
pub mod sink_rodio;

pub use backend::TtsBackend;
pub use catalog::{SPEAKER_DISPLAY_CAP, SpeakerCatalog};
pub use dispatch::{SynthesisConfig, SynthesisDispatcher};
pub use error::VoiceError;
pub use playback::{AudioSink, PlaybackConfig, PlaybackQueue};
pub use sink_rodio::RodioSink;
