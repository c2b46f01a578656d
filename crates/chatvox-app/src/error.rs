//! Command-surface error type.
//!
//! Every command returns a human-readable message through `Display`
//! (the presentation layer only displays text), while the structured
//! error kinds stay available for programmatic branching — e.g. a UI
//! toggling its "connected" flag only on success.

use chatvox_chat::ChatError;
use chatvox_core::{CoreError, DownloadError};
use chatvox_voice::VoiceError;

/// Error returned by any orchestrator command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Synthesis, catalog, or playback failure.
    #[error(transparent)]
    Voice(#[from] VoiceError),

    /// Chat connection lifecycle or transport failure.
    #[error(transparent)]
    Connection(#[from] ChatError),

    /// Download failure.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Configuration persistence or validation failure.
    #[error(transparent)]
    Config(#[from] CoreError),
}
