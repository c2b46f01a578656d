//! Download error types.
//!
//! These errors are designed to be serializable and not depend on
//! external error types like `std::io::Error`. For I/O errors, we
//! capture the kind and message as strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for download operations.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadError {
    /// The given URL could not be parsed or uses an unsupported scheme.
    #[error("Malformed URL: {url}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
    },

    /// Network/HTTP error during download.
    #[error("Network error: {message}")]
    Network {
        /// Detailed error message.
        message: String,
        /// HTTP status code if available.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// I/O error while writing the downloaded data.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g. "not found", "permission denied").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// The server did not begin responding within the configured window.
    #[error("Download timed out after {seconds}s")]
    Timeout {
        /// Configured timeout in seconds.
        seconds: u64,
    },

    /// No live or recently-finished task with this id exists.
    #[error("Unknown download: {id}")]
    UnknownDownload {
        /// The id that was not found.
        id: u64,
    },

    /// Download was cancelled by the caller.
    #[error("Download cancelled")]
    Cancelled,
}

impl DownloadError {
    /// Build an `InvalidUrl` error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Build a `Network` error without a status code.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status_code: None,
        }
    }

    /// Build a `Network` error carrying an HTTP status code.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status_code: Some(status),
        }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_capture_kind_and_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = DownloadError::from(io);
        match err {
            DownloadError::Io { kind, message } => {
                assert_eq!(kind, "entity not found");
                assert!(message.contains("missing"));
            }
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn errors_are_serializable() {
        let err = DownloadError::http_status(404, "not found");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("404"));
    }
}
