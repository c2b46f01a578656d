//! Connection supervisor — owner of the single chat connection's lifecycle.
//!
//! The supervisor is a five-state machine (Idle, Connecting, Connected,
//! Disconnecting, Failed). State is mutated only by the transition
//! helpers in this module, each of which also emits a
//! `connection:status` event — so events are delivered in transition
//! order, exactly once per transition.
//!
//! Transport loss while Connected transitions to Failed and terminates
//! the read loop. There is no automatic reconnect: retrying against an
//! external chat service is the caller's decision, made explicit by a
//! new `start()`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use chatvox_core::{AppEvent, AppEventEmitter, ConnectionState};

use crate::error::ChatError;
use crate::irc::{ChatMessage, ChatSource, ChatStream};

/// Configuration for the connection supervisor.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Upper bound on a connection attempt.
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

struct Inner {
    source: Arc<dyn ChatSource>,
    emitter: Arc<dyn AppEventEmitter>,
    config: ConnectionConfig,
    /// The single connection-state instance.
    state: Mutex<ConnectionState>,
    /// Cancellation token of the live read loop, if any.
    cancel: Mutex<Option<CancellationToken>>,
    /// Inlet of the synthesis pipeline; incoming chat messages are
    /// forwarded here in arrival order.
    outlet: mpsc::Sender<ChatMessage>,
}

impl Inner {
    /// Transition to `next` if the current state is one of `allowed`,
    /// emitting the status event while the state lock is held so that
    /// events can never be observed out of transition order.
    fn transition_if(
        &self,
        allowed: &[ConnectionState],
        next: ConnectionState,
        error: Option<String>,
    ) -> bool {
        let mut state = self.state.lock().unwrap();
        if !allowed.contains(&*state) {
            return false;
        }
        *state = next;
        match error {
            Some(e) => {
                tracing::warn!(state = %next, error = %e, "chat connection state changed");
                self.emitter.emit(AppEvent::connection_failed(next, e));
            }
            None => {
                tracing::info!(state = %next, "chat connection state changed");
                self.emitter.emit(AppEvent::connection_status(next));
            }
        }
        true
    }
}

/// Owner of the single chat-stream connection's lifecycle.
pub struct ConnectionSupervisor {
    inner: Arc<Inner>,
}

impl ConnectionSupervisor {
    /// Create a supervisor in the Idle state.
    ///
    /// `outlet` is where incoming chat messages are pushed; the
    /// synthesis pipeline reads from the other half of the channel.
    pub fn new(
        source: Arc<dyn ChatSource>,
        emitter: Arc<dyn AppEventEmitter>,
        outlet: mpsc::Sender<ChatMessage>,
        config: ConnectionConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                emitter,
                config,
                state: Mutex::new(ConnectionState::Idle),
                cancel: Mutex::new(None),
                outlet,
            }),
        }
    }

    /// Open the chat connection and begin forwarding messages.
    ///
    /// Allowed from Idle and Failed. Fails with
    /// [`ChatError::AlreadyConnected`] — with no side effects — when a
    /// connection attempt or live connection already exists.
    pub async fn start(&self, channel: &str) -> Result<(), ChatError> {
        let channel = channel.trim().trim_start_matches('#');
        if channel.is_empty() {
            return Err(ChatError::MissingChannel);
        }

        if !self.inner.transition_if(
            &[ConnectionState::Idle, ConnectionState::Failed],
            ConnectionState::Connecting,
            None,
        ) {
            return Err(ChatError::AlreadyConnected);
        }

        let connecting = &[ConnectionState::Connecting];
        let stream = match tokio::time::timeout(
            self.inner.config.connect_timeout,
            self.inner.source.connect(channel),
        )
        .await
        {
            Err(_) => {
                let seconds = self.inner.config.connect_timeout.as_secs();
                self.inner.transition_if(
                    connecting,
                    ConnectionState::Failed,
                    Some(format!("connection attempt timed out after {seconds}s")),
                );
                return Err(ChatError::ConnectTimeout { seconds });
            }
            Ok(Err(e)) => {
                self.inner
                    .transition_if(connecting, ConnectionState::Failed, Some(e.to_string()));
                return Err(e);
            }
            Ok(Ok(stream)) => stream,
        };

        let token = CancellationToken::new();
        {
            // Promote under the state lock; store the token in the same
            // critical section so a racing stop() always finds it.
            let mut state = self.inner.state.lock().unwrap();
            if *state != ConnectionState::Connecting {
                // stop() won the race while we were connecting.
                return Err(ChatError::Aborted);
            }
            *state = ConnectionState::Connected;
            *self.inner.cancel.lock().unwrap() = Some(token.clone());
            tracing::info!(channel, "chat connection established");
            self.inner
                .emitter
                .emit(AppEvent::connection_status(ConnectionState::Connected));
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(read_loop(inner, stream, token));
        Ok(())
    }

    /// Cancel the read loop and release the connection.
    ///
    /// Allowed from Connecting and Connected. Fails with
    /// [`ChatError::NotConnected`] — with no side effects — otherwise.
    pub fn stop(&self) -> Result<(), ChatError> {
        if !self.inner.transition_if(
            &[ConnectionState::Connecting, ConnectionState::Connected],
            ConnectionState::Disconnecting,
            None,
        ) {
            return Err(ChatError::NotConnected);
        }

        if let Some(token) = self.inner.cancel.lock().unwrap().take() {
            token.cancel();
        }
        self.inner
            .transition_if(&[ConnectionState::Disconnecting], ConnectionState::Idle, None);
        Ok(())
    }

    /// Current connection state. Non-blocking, no side effects.
    #[must_use]
    pub fn status(&self) -> ConnectionState {
        *self.inner.state.lock().unwrap()
    }
}

/// The background read loop: pulls messages off the stream and pushes
/// them into the pipeline inlet until cancelled or the transport dies.
async fn read_loop(inner: Arc<Inner>, mut stream: Box<dyn ChatStream>, token: CancellationToken) {
    let connected = &[ConnectionState::Connected];
    loop {
        tokio::select! {
            () = token.cancelled() => {
                tracing::debug!("chat read loop cancelled");
                return;
            }
            next = stream.next_message() => match next {
                Ok(Some(message)) => {
                    if inner.outlet.send(message).await.is_err() {
                        // The pipeline side is gone; a connection nobody
                        // listens to is not worth keeping.
                        inner.transition_if(
                            connected,
                            ConnectionState::Failed,
                            Some("speech pipeline closed".to_owned()),
                        );
                        return;
                    }
                }
                Ok(None) => {
                    inner.transition_if(
                        connected,
                        ConnectionState::Failed,
                        Some("connection closed by server".to_owned()),
                    );
                    return;
                }
                Err(e) => {
                    inner.transition_if(connected, ConnectionState::Failed, Some(e.to_string()));
                    return;
                }
            }
        }
    }
}
