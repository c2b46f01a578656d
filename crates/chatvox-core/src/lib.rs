//! Core domain types and port definitions for chatvox.
//!
//! This crate is the hub of the workspace: it owns the pure domain types
//! (speakers, connection state, audio buffers, download tasks), the
//! canonical [`AppEvent`] union published to presentation layers, the
//! [`EventBus`] that carries those events, and the port traits that the
//! adapter crates implement. It deliberately contains no transport,
//! audio, or network code.

pub mod domain;
pub mod download;
pub mod events;
pub mod ports;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{AudioBuffer, ConnectionState, Speaker, SynthesisRequest};
pub use download::{DownloadError, DownloadEvent, DownloadStatus, DownloadTask};
pub use events::{AppEvent, EventBus, DEFAULT_EVENT_CAPACITY};
pub use ports::{AppEventEmitter, CoreError, NoopEmitter, RepositoryError, SettingsRepository};
pub use services::SettingsService;
pub use settings::{
    DEFAULT_SPEAKER_ID, Settings, SettingsError, SettingsUpdate, validate_settings,
};
