//! Event emitter trait for cross-crate event broadcasting.
//!
//! This module defines the abstraction for emitting application events.
//! Implementations handle transport details (the in-process
//! [`EventBus`](crate::events::EventBus), IPC bridges, SSE, etc.).

use crate::events::AppEvent;

/// Trait for emitting application events.
///
/// This abstraction keeps event plumbing consistent across the
/// supervisor, playback, and download subsystems and prevents channel
/// types from becoming part of their public API surface.
///
/// # Implementations
///
/// - [`EventBus`](crate::events::EventBus) - the production bus
/// - [`NoopEmitter`] - for tests and contexts that don't need events
pub trait AppEventEmitter: Send + Sync {
    /// Emit an application event.
    ///
    /// Implementations must not block: long-running activities publish
    /// from their hot loops.
    fn emit(&self, event: AppEvent);

    /// Clone this emitter into a boxed trait object.
    ///
    /// This enables cloning of `Arc<dyn AppEventEmitter>` without
    /// requiring the underlying type to implement `Clone`.
    fn clone_box(&self) -> Box<dyn AppEventEmitter>;
}

/// A no-op event emitter for tests and headless contexts.
///
/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AppEventEmitter for NoopEmitter {
    fn emit(&self, _event: AppEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(self.clone())
    }
}
