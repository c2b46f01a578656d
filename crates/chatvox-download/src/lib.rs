//! Download manager for chatvox.
//!
//! Runs independent, cancellable, progress-reporting HTTP transfers,
//! keyed by a monotonically assigned download id. Each transfer is its
//! own tokio task; the only shared state is the id-keyed task map.
//! Progress and terminal events are published through the
//! [`AppEventEmitter`](chatvox_core::AppEventEmitter) port.

mod manager;
mod worker;

pub use manager::{DownloadConfig, DownloadManager};
