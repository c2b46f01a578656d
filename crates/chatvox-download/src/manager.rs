//! Download orchestration: id allocation, the task map, and cancellation.
//!
//! The manager owns no transfer logic — each `start()` spawns a worker
//! task (see [`crate::worker`]) that streams the resource and reports
//! through the task map and the event emitter. Locks on the task map
//! are never held across an `.await`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use url::Url;

use chatvox_core::{AppEventEmitter, DownloadError, DownloadTask};

use crate::worker::{self, TransferContext};

/// Configuration for the download manager.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Directory downloaded files land in.
    pub download_dir: PathBuf,

    /// Upper bound on waiting for the server to start responding.
    pub request_timeout: Duration,

    /// How long terminal tasks stay queryable before being pruned.
    pub retention: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: dirs::download_dir().unwrap_or_else(std::env::temp_dir),
            request_timeout: Duration::from_secs(30),
            retention: Duration::from_secs(300),
        }
    }
}

/// One entry in the live-task map.
pub(crate) struct TaskEntry {
    pub(crate) task: DownloadTask,
    pub(crate) cancel: CancellationToken,
    /// Set when the task reaches a terminal status; drives retention
    /// pruning.
    pub(crate) finished_at: Option<Instant>,
}

/// Concurrent, cancellable, progress-reporting file transfers.
pub struct DownloadManager {
    client: reqwest::Client,
    config: DownloadConfig,
    emitter: Arc<dyn AppEventEmitter>,
    tasks: Arc<Mutex<HashMap<u64, TaskEntry>>>,
    next_id: AtomicU64,
}

impl DownloadManager {
    /// Create a manager that publishes events through `emitter`.
    pub fn new(emitter: Arc<dyn AppEventEmitter>, config: DownloadConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            emitter,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Begin downloading `url`, returning the new download id
    /// immediately. The transfer runs asynchronously; progress arrives
    /// as `download:*` events.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, url: &str) -> Result<u64, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::invalid_url(url));
        }

        self.prune_expired();

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let cancel = CancellationToken::new();
        self.tasks.lock().unwrap().insert(
            id,
            TaskEntry {
                task: DownloadTask::new(id, url),
                cancel: cancel.clone(),
                finished_at: None,
            },
        );
        tracing::info!(id, url, "download queued");

        let dest = self.config.download_dir.join(format!(
            "{id}_{}",
            remote_file_name(&parsed).unwrap_or_else(|| "download.bin".to_owned())
        ));
        let ctx = TransferContext {
            id,
            url: parsed,
            dest,
            client: self.client.clone(),
            cancel,
            emitter: Arc::clone(&self.emitter),
            tasks: Arc::clone(&self.tasks),
            request_timeout: self.config.request_timeout,
        };
        tokio::spawn(worker::run_transfer(ctx));
        Ok(id)
    }

    /// Cancel a pending or in-progress download.
    ///
    /// Cancelling a task that already reached a terminal state is a
    /// no-op success, which keeps race-prone callers simple. Unknown
    /// ids fail with [`DownloadError::UnknownDownload`].
    pub fn cancel(&self, id: u64) -> Result<(), DownloadError> {
        let tasks = self.tasks.lock().unwrap();
        match tasks.get(&id) {
            None => Err(DownloadError::UnknownDownload { id }),
            Some(entry) if entry.task.status.is_terminal() => Ok(()),
            Some(entry) => {
                entry.cancel.cancel();
                tracing::info!(id, "download cancellation requested");
                Ok(())
            }
        }
    }

    /// Snapshot of a task for late status queries.
    ///
    /// Terminal tasks stay queryable for the configured retention
    /// window.
    pub fn status(&self, id: u64) -> Result<DownloadTask, DownloadError> {
        self.tasks
            .lock()
            .unwrap()
            .get(&id)
            .map(|entry| entry.task.clone())
            .ok_or(DownloadError::UnknownDownload { id })
    }

    /// Number of tasks that have not reached a terminal state.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.tasks
            .lock()
            .unwrap()
            .values()
            .filter(|entry| !entry.task.status.is_terminal())
            .count()
    }

    /// Drop terminal tasks whose retention window has elapsed.
    fn prune_expired(&self) {
        let retention = self.config.retention;
        self.tasks.lock().unwrap().retain(|_, entry| {
            entry
                .finished_at
                .is_none_or(|finished| finished.elapsed() < retention)
        });
    }
}

/// Last path segment of the URL, if it has a usable one.
fn remote_file_name(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(Iterator::last)
        .filter(|segment| !segment.is_empty())
        .map(ToOwned::to_owned)
}
