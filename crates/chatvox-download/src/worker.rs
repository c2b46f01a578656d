//! The streaming transfer worker.
//!
//! One worker task per download. The worker operates on a value-type
//! context with cloned `Arc` dependencies and never touches manager
//! internals beyond the shared task map. Cancellation is handled via
//! `tokio::select!` around every I/O suspension point, so a pending
//! network read unblocks promptly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::Url;

use chatvox_core::{AppEventEmitter, DownloadError, DownloadEvent, DownloadStatus};

use crate::manager::TaskEntry;

/// Everything a worker needs to run one transfer.
pub(crate) struct TransferContext {
    pub(crate) id: u64,
    pub(crate) url: Url,
    pub(crate) dest: PathBuf,
    pub(crate) client: reqwest::Client,
    pub(crate) cancel: CancellationToken,
    pub(crate) emitter: Arc<dyn AppEventEmitter>,
    pub(crate) tasks: Arc<Mutex<HashMap<u64, TaskEntry>>>,
    pub(crate) request_timeout: Duration,
}

impl TransferContext {
    fn update_task(&self, apply: impl FnOnce(&mut chatvox_core::DownloadTask)) {
        if let Some(entry) = self.tasks.lock().unwrap().get_mut(&self.id) {
            apply(&mut entry.task);
        }
    }

    /// Record a terminal status and stamp the retention clock.
    fn finish(&self, status: DownloadStatus, error: Option<String>) {
        if let Some(entry) = self.tasks.lock().unwrap().get_mut(&self.id) {
            entry.task.status = status;
            entry.task.error = error;
            entry.finished_at = Some(Instant::now());
        }
    }

    fn emit(&self, event: DownloadEvent) {
        self.emitter.emit(event.into());
    }
}

/// Run one transfer to its terminal state.
///
/// Every exit path records a terminal status in the task map and emits
/// a terminal event; failure of this transfer never affects siblings.
pub(crate) async fn run_transfer(ctx: TransferContext) {
    match stream_to_file(&ctx).await {
        Ok((bytes_downloaded, content_length)) => {
            ctx.finish(DownloadStatus::Completed, None);
            ctx.emit(DownloadEvent::completed(
                ctx.id,
                ctx.url.as_str(),
                bytes_downloaded,
                content_length,
            ));
            tracing::info!(
                id = ctx.id,
                bytes = bytes_downloaded,
                dest = %ctx.dest.display(),
                "download completed"
            );
        }
        Err(DownloadError::Cancelled) => {
            discard_partial(&ctx).await;
            ctx.finish(DownloadStatus::Cancelled, None);
            ctx.emit(DownloadEvent::cancelled(ctx.id));
            tracing::info!(id = ctx.id, "download cancelled");
        }
        Err(e) => {
            discard_partial(&ctx).await;
            ctx.finish(DownloadStatus::Failed, Some(e.to_string()));
            ctx.emit(DownloadEvent::failed(ctx.id, e.to_string()));
            tracing::warn!(id = ctx.id, error = %e, "download failed");
        }
    }
}

/// Stream the response body to the destination file.
///
/// Returns `(bytes_downloaded, content_length)` on success. Emits a
/// progress event for the transition into `InProgress` (0 bytes) and
/// after every received chunk, so the event sequence for a finished
/// download always ends at `content_length` when it was known.
async fn stream_to_file(ctx: &TransferContext) -> Result<(u64, Option<u64>), DownloadError> {
    let request = ctx.client.get(ctx.url.clone()).send();
    let response = tokio::select! {
        () = ctx.cancel.cancelled() => return Err(DownloadError::Cancelled),
        outcome = tokio::time::timeout(ctx.request_timeout, request) => match outcome {
            Err(_) => {
                return Err(DownloadError::Timeout {
                    seconds: ctx.request_timeout.as_secs(),
                });
            }
            Ok(Err(e)) => return Err(DownloadError::network(e.to_string())),
            Ok(Ok(response)) => response,
        },
    };

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::http_status(
            status.as_u16(),
            format!("server responded with {status}"),
        ));
    }

    let content_length = response.content_length();
    ctx.update_task(|task| {
        task.status = DownloadStatus::InProgress;
        task.content_length = content_length;
    });
    ctx.emit(DownloadEvent::started(ctx.id, ctx.url.as_str()));
    ctx.emit(DownloadEvent::progress(
        ctx.id,
        ctx.url.as_str(),
        0,
        content_length,
    ));

    if let Some(parent) = ctx.dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(&ctx.dest).await?;

    let mut stream = response.bytes_stream();
    let mut bytes_downloaded: u64 = 0;
    loop {
        let chunk = tokio::select! {
            () = ctx.cancel.cancelled() => return Err(DownloadError::Cancelled),
            chunk = stream.next() => chunk,
        };
        match chunk {
            Some(Ok(bytes)) => {
                file.write_all(&bytes).await?;
                bytes_downloaded += bytes.len() as u64;
                ctx.update_task(|task| task.bytes_downloaded = bytes_downloaded);
                ctx.emit(DownloadEvent::progress(
                    ctx.id,
                    ctx.url.as_str(),
                    bytes_downloaded,
                    content_length,
                ));
            }
            Some(Err(e)) => return Err(DownloadError::network(e.to_string())),
            None => break,
        }
    }
    file.flush().await?;

    if let Some(expected) = content_length {
        if bytes_downloaded != expected {
            return Err(DownloadError::network(format!(
                "truncated response: got {bytes_downloaded} of {expected} bytes"
            )));
        }
    }

    Ok((bytes_downloaded, content_length))
}

/// Best-effort removal of a partially written destination file.
async fn discard_partial(ctx: &TransferContext) {
    if tokio::fs::remove_file(&ctx.dest).await.is_ok() {
        tracing::debug!(dest = %ctx.dest.display(), "partial download discarded");
    }
}
