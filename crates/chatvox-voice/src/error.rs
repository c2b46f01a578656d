//! Voice subsystem error types.

/// Errors that can occur in the synthesis and playback components.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// Empty or whitespace-only text was submitted for synthesis.
    #[error("Nothing to synthesize: text is empty")]
    EmptyInput,

    /// The speech engine could not be reached or failed to enumerate voices.
    #[error("Speech engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine failed to synthesize one request.
    #[error("Speech synthesis failed: {0}")]
    SynthesisError(String),

    /// Synthesis did not complete within the configured window.
    #[error("Speech synthesis timed out after {seconds}s")]
    SynthesisTimeout {
        /// Configured timeout in seconds.
        seconds: u64,
    },

    /// The requested voice id is not in the engine's known set.
    #[error("Unknown speaker id: {0}")]
    InvalidSpeaker(i64),

    /// The playback queue is at capacity; the buffer was discarded.
    #[error("Playback queue full (capacity {capacity})")]
    QueueFull {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// Failed to open the audio output device.
    #[error("Failed to open audio output stream: {0}")]
    OutputStreamError(String),

    /// A buffer failed to play (device or decode failure).
    #[error("Playback failed: {0}")]
    PlaybackError(String),

    /// The dedicated audio thread exited unexpectedly.
    #[error("Audio thread is not running")]
    AudioThreadDied,

    /// Persisting the voice selection failed.
    #[error("Failed to persist voice selection: {source}")]
    Persistence {
        /// Underlying repository failure.
        source: anyhow::Error,
    },

    /// IO error (artifact files, model files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
