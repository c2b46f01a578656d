//! Chat connection error types.

/// Errors from the chat transport and connection supervisor.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// `start()` was called while a connection attempt or live
    /// connection already exists. No side effects.
    #[error("Chat reader is already connected")]
    AlreadyConnected,

    /// `stop()` was called with no connection to stop. No side effects.
    #[error("Chat reader is not connected")]
    NotConnected,

    /// No channel to join: the Twitch username is not configured.
    #[error("No Twitch username configured")]
    MissingChannel,

    /// The connection attempt did not complete within the configured
    /// window.
    #[error("Connection attempt timed out after {seconds}s")]
    ConnectTimeout {
        /// Configured timeout in seconds.
        seconds: u64,
    },

    /// The connection attempt was aborted by a concurrent `stop()`.
    #[error("Connection attempt aborted")]
    Aborted,

    /// Transport-level failure (socket, protocol).
    #[error("Chat transport error: {0}")]
    Transport(String),

    /// IO failure on the underlying stream.
    #[error("Chat IO error: {0}")]
    Io(#[from] std::io::Error),
}
