//! Settings domain types and validation.
//!
//! Pure domain types with no infrastructure dependencies. Persistence
//! goes through the [`SettingsRepository`](crate::ports::SettingsRepository)
//! port; the storage format is the repository implementation's concern.

use serde::{Deserialize, Serialize};

/// Voice id used until the user selects one.
pub const DEFAULT_SPEAKER_ID: i64 = 0;

/// Application settings structure.
///
/// All fields are optional to support partial updates and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Twitch channel/username whose chat is read aloud.
    pub twitch_username: Option<String>,

    /// Currently selected synthesis voice id.
    pub selected_speaker: Option<i64>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            twitch_username: None,
            selected_speaker: Some(DEFAULT_SPEAKER_ID),
        }
    }

    /// Get the configured username, or the empty string when unset.
    #[must_use]
    pub fn effective_username(&self) -> &str {
        self.twitch_username.as_deref().unwrap_or_default()
    }

    /// Get the effective selected voice (with default fallback).
    #[must_use]
    pub const fn effective_speaker(&self) -> i64 {
        match self.selected_speaker {
            Some(id) => id,
            None => DEFAULT_SPEAKER_ID,
        }
    }

    /// Merge an update into this settings value, only touching fields
    /// that are `Some` in the update.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(ref username) = other.twitch_username {
            self.twitch_username.clone_from(username);
        }
        if let Some(ref speaker) = other.selected_speaker {
            self.selected_speaker = *speaker;
        }
    }
}

/// Partial update to [`Settings`].
///
/// The outer `Option` means "change this field"; the inner value is the
/// new content (which may itself be `None` to clear the field).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    /// New Twitch username, if changing.
    pub twitch_username: Option<Option<String>>,
    /// New selected voice id, if changing.
    pub selected_speaker: Option<Option<i64>>,
}

/// Settings validation errors.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    /// The username is present but empty or whitespace.
    #[error("Twitch username must not be empty")]
    EmptyUsername,

    /// The selected voice id is out of the representable range.
    #[error("Invalid speaker id: {0}")]
    InvalidSpeaker(i64),
}

/// Validate a complete settings value.
///
/// Called before every save so that no invalid state is ever persisted.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(ref username) = settings.twitch_username {
        if username.trim().is_empty() {
            return Err(SettingsError::EmptyUsername);
        }
    }
    if let Some(id) = settings.selected_speaker {
        if id < 0 {
            return Err(SettingsError::InvalidSpeaker(id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_a_speaker_but_no_username() {
        let settings = Settings::with_defaults();
        assert_eq!(settings.twitch_username, None);
        assert_eq!(settings.effective_speaker(), DEFAULT_SPEAKER_ID);
        assert_eq!(settings.effective_username(), "");
    }

    #[test]
    fn merge_only_touches_updated_fields() {
        let mut settings = Settings::with_defaults();
        settings.merge(&SettingsUpdate {
            twitch_username: Some(Some("alice".into())),
            ..Default::default()
        });
        assert_eq!(settings.twitch_username.as_deref(), Some("alice"));
        assert_eq!(settings.selected_speaker, Some(DEFAULT_SPEAKER_ID));

        settings.merge(&SettingsUpdate {
            selected_speaker: Some(Some(7)),
            ..Default::default()
        });
        assert_eq!(settings.twitch_username.as_deref(), Some("alice"));
        assert_eq!(settings.selected_speaker, Some(7));
    }

    #[test]
    fn merge_can_clear_a_field() {
        let mut settings = Settings {
            twitch_username: Some("alice".into()),
            selected_speaker: Some(3),
        };
        settings.merge(&SettingsUpdate {
            twitch_username: Some(None),
            ..Default::default()
        });
        assert_eq!(settings.twitch_username, None);
    }

    #[test]
    fn validation_rejects_blank_username_and_negative_speaker() {
        let blank = Settings {
            twitch_username: Some("   ".into()),
            selected_speaker: None,
        };
        assert_eq!(validate_settings(&blank), Err(SettingsError::EmptyUsername));

        let negative = Settings {
            twitch_username: None,
            selected_speaker: Some(-1),
        };
        assert_eq!(
            validate_settings(&negative),
            Err(SettingsError::InvalidSpeaker(-1))
        );

        assert!(validate_settings(&Settings::with_defaults()).is_ok());
    }

    #[test]
    fn unknown_json_fields_are_ignored() {
        let parsed: Settings =
            serde_json::from_str(r#"{"twitch_username":"bob","legacy_field":true}"#).unwrap();
        assert_eq!(parsed.twitch_username.as_deref(), Some("bob"));
    }
}
