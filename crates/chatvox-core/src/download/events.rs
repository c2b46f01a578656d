//! Download events - discriminated union for all download state changes.

use serde::{Deserialize, Serialize};

/// Single discriminated union for all download events.
///
/// The presentation layer handles this as a tagged union; progress
/// events for a given download carry non-decreasing `bytesDownloaded`
/// values and stop after a terminal event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadEvent {
    /// The response began streaming.
    DownloadStarted {
        /// Identifier of the download.
        #[serde(rename = "downloadId")]
        id: u64,
        /// Source URL.
        url: String,
    },

    /// Progress update; emitted at least on every received chunk boundary.
    DownloadProgress {
        /// Identifier of the download.
        #[serde(rename = "downloadId")]
        id: u64,
        /// Source URL.
        url: String,
        /// Bytes received so far.
        #[serde(rename = "bytesDownloaded")]
        bytes_downloaded: u64,
        /// Total size, when the server reported one.
        #[serde(rename = "contentLength")]
        content_length: Option<u64>,
    },

    /// Download completed successfully.
    DownloadCompleted {
        /// Identifier of the download.
        #[serde(rename = "downloadId")]
        id: u64,
        /// Source URL.
        url: String,
        /// Final byte count; equals `contentLength` when it was known.
        #[serde(rename = "bytesDownloaded")]
        bytes_downloaded: u64,
        /// Total size, when the server reported one.
        #[serde(rename = "contentLength")]
        content_length: Option<u64>,
    },

    /// Download failed with a transport or I/O error.
    DownloadFailed {
        /// Identifier of the download.
        #[serde(rename = "downloadId")]
        id: u64,
        /// Error message describing what went wrong.
        error: String,
    },

    /// Download was cancelled by the caller.
    DownloadCancelled {
        /// Identifier of the download.
        #[serde(rename = "downloadId")]
        id: u64,
    },
}

impl DownloadEvent {
    /// Create a download started event.
    pub fn started(id: u64, url: impl Into<String>) -> Self {
        Self::DownloadStarted {
            id,
            url: url.into(),
        }
    }

    /// Create a progress event.
    pub fn progress(
        id: u64,
        url: impl Into<String>,
        bytes_downloaded: u64,
        content_length: Option<u64>,
    ) -> Self {
        Self::DownloadProgress {
            id,
            url: url.into(),
            bytes_downloaded,
            content_length,
        }
    }

    /// Create a download completed event.
    pub fn completed(
        id: u64,
        url: impl Into<String>,
        bytes_downloaded: u64,
        content_length: Option<u64>,
    ) -> Self {
        Self::DownloadCompleted {
            id,
            url: url.into(),
            bytes_downloaded,
            content_length,
        }
    }

    /// Create a download failed event.
    pub fn failed(id: u64, error: impl Into<String>) -> Self {
        Self::DownloadFailed {
            id,
            error: error.into(),
        }
    }

    /// Create a download cancelled event.
    #[must_use]
    pub const fn cancelled(id: u64) -> Self {
        Self::DownloadCancelled { id }
    }

    /// Get the download ID from any event type.
    #[must_use]
    pub const fn id(&self) -> u64 {
        match self {
            Self::DownloadStarted { id, .. }
            | Self::DownloadProgress { id, .. }
            | Self::DownloadCompleted { id, .. }
            | Self::DownloadFailed { id, .. }
            | Self::DownloadCancelled { id } => *id,
        }
    }

    /// Whether this event ends the stream for its download.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::DownloadCompleted { .. }
                | Self::DownloadFailed { .. }
                | Self::DownloadCancelled { .. }
        )
    }

    /// Get the event name for wire protocols.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::DownloadStarted { .. } => "download:started",
            Self::DownloadProgress { .. } => "download:progress",
            Self::DownloadCompleted { .. } => "download:completed",
            Self::DownloadFailed { .. } => "download:failed",
            Self::DownloadCancelled { .. } => "download:cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_event_wire_format() {
        let event = DownloadEvent::progress(1, "https://host/file.mp3", 500, Some(1000));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"download_progress\""));
        assert!(json.contains("\"downloadId\":1"));
        assert!(json.contains("\"bytesDownloaded\":500"));
        assert!(json.contains("\"contentLength\":1000"));
    }

    #[test]
    fn event_id_extraction() {
        assert_eq!(DownloadEvent::started(3, "u").id(), 3);
        assert_eq!(DownloadEvent::cancelled(9).id(), 9);
    }

    #[test]
    fn terminal_classification() {
        assert!(DownloadEvent::completed(1, "u", 10, Some(10)).is_terminal());
        assert!(DownloadEvent::failed(1, "boom").is_terminal());
        assert!(DownloadEvent::cancelled(1).is_terminal());
        assert!(!DownloadEvent::progress(1, "u", 5, None).is_terminal());
    }
}
