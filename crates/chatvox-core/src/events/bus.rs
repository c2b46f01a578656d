//! Bounded, non-blocking event bus.
//!
//! One broadcast channel per event kind. Publishing never blocks the
//! producing activity: when a channel is full, the oldest pending
//! notification of that kind is dropped — acceptable for progress and
//! status signals, which are naturally superseded by the next update.

use tokio::sync::broadcast;

use super::AppEvent;
use crate::ports::AppEventEmitter;

/// Default per-kind channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// The outbound notification channel consumed by the presentation layer.
///
/// Cloning is cheap; all clones publish into the same channels. The bus
/// implements [`AppEventEmitter`], so components hold it as
/// `Arc<dyn AppEventEmitter>` and stay unaware of channel types.
#[derive(Debug, Clone)]
pub struct EventBus {
    connection: broadcast::Sender<AppEvent>,
    download: broadcast::Sender<AppEvent>,
    playback: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// Create a bus with the given per-kind capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (connection, _) = broadcast::channel(capacity.max(1));
        let (download, _) = broadcast::channel(capacity.max(1));
        let (playback, _) = broadcast::channel(capacity.max(1));
        Self {
            connection,
            download,
            playback,
        }
    }

    /// Publish an event onto the channel for its kind.
    ///
    /// Never blocks. A send error only means no subscriber is currently
    /// listening, which is fine for fire-and-forget notifications.
    pub fn publish(&self, event: AppEvent) {
        let channel = match &event {
            AppEvent::ConnectionStatus { .. } => &self.connection,
            AppEvent::Download { .. } => &self.download,
            AppEvent::PlaybackError { .. } => &self.playback,
        };
        if channel.send(event).is_err() {
            tracing::trace!("event dropped: no subscribers");
        }
    }

    /// Subscribe to connection lifecycle events.
    #[must_use]
    pub fn subscribe_connection(&self) -> broadcast::Receiver<AppEvent> {
        self.connection.subscribe()
    }

    /// Subscribe to download lifecycle + progress events.
    #[must_use]
    pub fn subscribe_downloads(&self) -> broadcast::Receiver<AppEvent> {
        self.download.subscribe()
    }

    /// Subscribe to playback error events.
    #[must_use]
    pub fn subscribe_playback(&self) -> broadcast::Receiver<AppEvent> {
        self.playback.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl AppEventEmitter for EventBus {
    fn emit(&self, event: AppEvent) {
        self.publish(event);
    }

    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(self.clone())
    }
}
