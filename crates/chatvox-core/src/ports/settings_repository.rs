//! Settings repository trait definition.
//!
//! This port defines the interface for settings persistence. The
//! storage format and location are the implementation's concern.

use async_trait::async_trait;

use super::RepositoryError;
use crate::settings::Settings;

/// Repository for application settings persistence.
///
/// The persisted identity (Twitch username) and selected voice are read
/// at process start and written on every successful `set_*` command.
///
/// # Design Rules
///
/// - Works with the domain [`Settings`] type directly
/// - Implementation handles serialization internally
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Load application settings.
    ///
    /// Returns default settings if none are stored.
    async fn load(&self) -> Result<Settings, RepositoryError>;

    /// Save application settings.
    async fn save(&self, settings: &Settings) -> Result<(), RepositoryError>;
}
