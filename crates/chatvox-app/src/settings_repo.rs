//! JSON-file settings repository.
//!
//! Persists [`Settings`] as a single JSON document. Writes go through a
//! temp file + rename so a crash mid-write can't leave a torn file.

use std::path::PathBuf;

use async_trait::async_trait;

use chatvox_core::{RepositoryError, Settings, SettingsRepository};

/// [`SettingsRepository`] backed by a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonSettingsRepository {
    path: PathBuf,
}

impl JsonSettingsRepository {
    /// Repository over an explicit file path.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The default settings location: `<config dir>/chatvox/settings.json`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("chatvox")
            .join("settings.json")
    }
}

#[async_trait]
impl SettingsRepository for JsonSettingsRepository {
    async fn load(&self) -> Result<Settings, RepositoryError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| RepositoryError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no settings file, using defaults");
                Ok(Settings::with_defaults())
            }
            Err(e) => Err(RepositoryError::Storage(e.to_string())),
        }
    }

    async fn save(&self, settings: &Settings) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string_pretty(settings)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw.as_bytes())
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}
