//! Audio output via `rodio`, confined to a dedicated OS thread.
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so the stream
//! lives on its own thread and the rest of the crate talks to it
//! through a small command channel. `Sink` *is* shareable in rodio
//! 0.20+, which lets [`RodioSink::stop`] interrupt a play from any
//! thread: `sink.stop()` drops the queued source and the blocked
//! `sleep_until_end` returns promptly.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use async_trait::async_trait;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};

use chatvox_core::AudioBuffer;

use crate::error::VoiceError;
use crate::playback::AudioSink;

enum ActorRequest {
    /// Create a fresh sink on the device thread.
    NewSink {
        reply: mpsc::Sender<Result<Arc<Sink>, VoiceError>>,
    },
    /// Shut down the device thread, releasing the output stream.
    Shutdown,
}

/// [`AudioSink`] implementation over the default output device.
pub struct RodioSink {
    requests: mpsc::Sender<ActorRequest>,
    /// Sink of the buffer currently playing, if any. `stop()` takes it.
    current: Mutex<Option<Arc<Sink>>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RodioSink {
    /// Open the default output device.
    ///
    /// Spawns the device thread and waits for it to finish
    /// initialisation; device errors are propagated back to the caller.
    pub fn new() -> Result<Self, VoiceError> {
        let (requests, request_rx) = mpsc::channel::<ActorRequest>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), VoiceError>>();

        let thread = thread::Builder::new()
            .name("chatvox-audio".into())
            .spawn(move || Self::run(&request_rx, &init_tx))
            .map_err(|e| {
                VoiceError::OutputStreamError(format!("failed to spawn audio thread: {e}"))
            })?;

        init_rx.recv().map_err(|_| VoiceError::AudioThreadDied)??;

        Ok(Self {
            requests,
            current: Mutex::new(None),
            thread: Some(thread),
        })
    }

    /// Device thread body: owns the `!Send` output stream and creates
    /// sinks on request.
    fn run(requests: &mpsc::Receiver<ActorRequest>, init_tx: &mpsc::Sender<Result<(), VoiceError>>) {
        let (stream, handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                let _ = init_tx.send(Err(VoiceError::OutputStreamError(e.to_string())));
                return;
            }
        };
        let _ = init_tx.send(Ok(()));
        tracing::info!("audio output initialized on default device");

        // The stream must stay alive for as long as sinks exist.
        let _keep_alive = stream;

        while let Ok(request) = requests.recv() {
            match request {
                ActorRequest::NewSink { reply } => {
                    let result = Sink::try_new(&handle)
                        .map(Arc::new)
                        .map_err(|e| VoiceError::OutputStreamError(e.to_string()));
                    let _ = reply.send(result);
                }
                ActorRequest::Shutdown => break,
            }
        }
        tracing::debug!("audio thread shut down");
    }

    fn new_sink(&self) -> Result<Arc<Sink>, VoiceError> {
        let (reply, reply_rx) = mpsc::channel();
        self.requests
            .send(ActorRequest::NewSink { reply })
            .map_err(|_| VoiceError::AudioThreadDied)?;
        // The round trip is local channel I/O plus a sink allocation —
        // microseconds, acceptable to block on.
        reply_rx.recv().map_err(|_| VoiceError::AudioThreadDied)?
    }
}

#[async_trait]
impl AudioSink for RodioSink {
    async fn play(&self, buffer: AudioBuffer) -> Result<(), VoiceError> {
        if buffer.is_empty() || buffer.sample_rate == 0 {
            return Ok(());
        }

        let sink = self.new_sink()?;
        sink.append(SamplesBuffer::new(1, buffer.sample_rate, buffer.samples));
        *self.current.lock().unwrap() = Some(Arc::clone(&sink));

        let waiter = Arc::clone(&sink);
        let joined = tokio::task::spawn_blocking(move || waiter.sleep_until_end()).await;

        // Clear the handle unless stop() already took it (or a newer
        // play replaced it).
        {
            let mut current = self.current.lock().unwrap();
            if current.as_ref().is_some_and(|c| Arc::ptr_eq(c, &sink)) {
                *current = None;
            }
        }

        joined.map_err(|e| VoiceError::PlaybackError(format!("playback watcher failed: {e}")))?;
        Ok(())
    }

    fn stop(&self) {
        if let Some(sink) = self.current.lock().unwrap().take() {
            sink.stop();
            tracing::debug!("active playback stopped");
        }
    }
}

impl Drop for RodioSink {
    fn drop(&mut self) {
        self.stop();
        let _ = self.requests.send(ActorRequest::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
