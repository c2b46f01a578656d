//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.

mod event_emitter;
mod settings_repository;

use thiserror::Error;

pub use event_emitter::{AppEventEmitter, NoopEmitter};
pub use settings_repository::SettingsRepository;

/// Domain-specific errors for repository operations.
///
/// This error type abstracts away storage implementation details
/// (filesystem, database) and provides a clean interface for services
/// to handle persistence failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error (filesystem, database, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Umbrella error for core service operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Persistence failure from a repository.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Settings validation failure.
    #[error("{0}")]
    Settings(#[from] crate::settings::SettingsError),
}
