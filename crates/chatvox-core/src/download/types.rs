//! Core domain types for downloads.

use serde::{Deserialize, Serialize};

/// Status of a download.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Created, transfer not yet streaming.
    Pending,
    /// Response received, bytes are streaming in.
    InProgress,
    /// All bytes received.
    Completed,
    /// Transport or I/O failure.
    Failed,
    /// Cancelled by the caller; partial data discarded.
    Cancelled,
}

impl DownloadStatus {
    /// Stable string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether this status is final — no further transitions or events.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a single download task, as returned by status queries.
///
/// `bytes_downloaded` is monotonically non-decreasing while the status
/// is [`DownloadStatus::InProgress`] and equals `content_length` (when
/// known) once [`DownloadStatus::Completed`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadTask {
    /// Unique, monotonically assigned identifier.
    #[serde(rename = "downloadId")]
    pub id: u64,
    /// Source URL.
    pub url: String,
    /// Total size in bytes, when the server reported one.
    pub content_length: Option<u64>,
    /// Bytes received so far.
    pub bytes_downloaded: u64,
    /// Current status.
    pub status: DownloadStatus,
    /// Error message if the status is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadTask {
    /// Create a fresh task in `Pending` state.
    pub fn new(id: u64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            content_length: None,
            bytes_downloaded: 0,
            status: DownloadStatus::Pending,
            error: None,
        }
    }
}
