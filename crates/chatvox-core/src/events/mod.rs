//! Canonical event union for all asynchronous notifications.
//!
//! This module is the single source of truth for events consumed by the
//! presentation layer: connection lifecycle changes, download progress,
//! and non-fatal playback failures.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag for frontend compatibility:
//!
//! ```json
//! { "type": "connection_status", "state": "connected" }
//! ```

mod bus;

use serde::{Deserialize, Serialize};

use crate::domain::ConnectionState;
use crate::download::DownloadEvent;

pub use bus::{DEFAULT_EVENT_CAPACITY, EventBus};

/// Canonical event types published on the [`EventBus`].
///
/// Each variant includes all necessary context for the event to be
/// self-describing; consumers never need to issue a follow-up query to
/// interpret one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// The chat connection transitioned to a new state.
    ///
    /// Emitted exactly once per transition, in transition order.
    ConnectionStatus {
        /// The state just entered.
        state: ConnectionState,
        /// Error description when the transition was caused by a failure.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Download lifecycle + progress events.
    ///
    /// Wraps [`DownloadEvent`] verbatim to preserve all detail.
    #[serde(rename = "download")]
    Download {
        /// The download event payload.
        event: DownloadEvent,
    },

    /// A single audio buffer failed to play.
    ///
    /// Non-fatal: the playback queue continues with the next buffer.
    PlaybackError {
        /// Error description.
        error: String,
    },
}

impl AppEvent {
    /// Create a connection status event without an error.
    pub const fn connection_status(state: ConnectionState) -> Self {
        Self::ConnectionStatus { state, error: None }
    }

    /// Create a connection status event carrying a failure description.
    pub fn connection_failed(state: ConnectionState, error: impl Into<String>) -> Self {
        Self::ConnectionStatus {
            state,
            error: Some(error.into()),
        }
    }

    /// Create a playback error event.
    pub fn playback_error(error: impl Into<String>) -> Self {
        Self::PlaybackError {
            error: error.into(),
        }
    }

    /// Get the event name for wire protocols.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::ConnectionStatus { .. } => "connection:status",
            Self::Download { event } => event.event_name(),
            Self::PlaybackError { .. } => "playback:error",
        }
    }
}

impl From<DownloadEvent> for AppEvent {
    fn from(event: DownloadEvent) -> Self {
        Self::Download { event }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_event_serialization() {
        let event = AppEvent::connection_status(ConnectionState::Connected);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"connection_status\""));
        assert!(json.contains("\"state\":\"connected\""));
        assert!(!json.contains("\"error\""));

        let failed = AppEvent::connection_failed(ConnectionState::Failed, "read error");
        let json = serde_json::to_string(&failed).unwrap();
        assert!(json.contains("\"state\":\"failed\""));
        assert!(json.contains("\"error\":\"read error\""));
    }

    /// Lock down event names to prevent frontend subscription mismatches.
    #[test]
    fn event_names_are_stable() {
        assert_eq!(
            AppEvent::connection_status(ConnectionState::Idle).event_name(),
            "connection:status"
        );
        assert_eq!(
            AppEvent::from(DownloadEvent::progress(1, "u", 0, None)).event_name(),
            "download:progress"
        );
        assert_eq!(AppEvent::playback_error("x").event_name(), "playback:error");
    }
}
