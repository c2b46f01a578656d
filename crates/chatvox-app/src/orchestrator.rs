//! The orchestrator: a stateless router over the service's components.
//!
//! Each inbound command translates into exactly one call on the
//! appropriate component (or the synthesize→enqueue pair for
//! "synthesize and play"). The orchestrator never blocks longer than
//! the called operation; chat reading, playback, and downloads run as
//! background activities that report via the event bus.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use chatvox_chat::{ChatError, ChatMessage, ChatSource, ConnectionConfig, ConnectionSupervisor};
use chatvox_core::{
    AppEvent, AppEventEmitter, ConnectionState, DownloadTask, EventBus, SettingsRepository,
    SettingsService, SettingsUpdate, Speaker, DEFAULT_EVENT_CAPACITY,
};
use chatvox_download::{DownloadConfig, DownloadManager};
use chatvox_voice::{
    AudioSink, PlaybackConfig, PlaybackQueue, SpeakerCatalog, SynthesisConfig,
    SynthesisDispatcher, TtsBackend,
};

use crate::error::CommandError;

/// Configuration for the orchestrator and its components.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Synthesis admission limit, timeout, and artifact directory.
    pub synthesis: SynthesisConfig,
    /// Playback queue capacity.
    pub playback: PlaybackConfig,
    /// Chat connection timeout.
    pub connection: ConnectionConfig,
    /// Download directory, request timeout, and retention window.
    pub downloads: DownloadConfig,
    /// Per-kind event channel capacity.
    pub event_capacity: usize,
    /// Capacity of the chat→synthesis inlet channel.
    pub pipeline_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            synthesis: SynthesisConfig::default(),
            playback: PlaybackConfig::default(),
            connection: ConnectionConfig::default(),
            downloads: DownloadConfig::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            pipeline_capacity: 64,
        }
    }
}

/// Composition root routing commands to components.
pub struct Orchestrator {
    events: EventBus,
    settings: SettingsService,
    catalog: Arc<SpeakerCatalog>,
    dispatcher: Arc<SynthesisDispatcher>,
    playback: Arc<PlaybackQueue>,
    downloads: DownloadManager,
    supervisor: ConnectionSupervisor,
    pipeline: tokio::task::JoinHandle<()>,
}

impl Orchestrator {
    /// Construct the service from its collaborators.
    ///
    /// Reads persisted settings to seed the voice selection, wires
    /// every component to the event bus, and spawns the chat→synthesis
    /// pipeline task. Must be called from within a tokio runtime.
    pub async fn new(
        engine: Arc<dyn TtsBackend>,
        sink: Arc<dyn AudioSink>,
        chat: Arc<dyn ChatSource>,
        repo: Arc<dyn SettingsRepository>,
        config: OrchestratorConfig,
    ) -> Self {
        let events = EventBus::new(config.event_capacity);
        let emitter: Arc<dyn AppEventEmitter> = Arc::new(events.clone());

        let settings = SettingsService::new(Arc::clone(&repo));
        let persisted = match settings.get().await {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load settings, using defaults");
                chatvox_core::Settings::with_defaults()
            }
        };

        let catalog = Arc::new(SpeakerCatalog::new(
            Arc::clone(&engine),
            repo,
            persisted.effective_speaker(),
        ));
        let dispatcher = Arc::new(SynthesisDispatcher::new(engine, config.synthesis));
        let playback = Arc::new(PlaybackQueue::new(
            sink,
            Arc::clone(&emitter),
            config.playback,
        ));
        let downloads = DownloadManager::new(Arc::clone(&emitter), config.downloads);

        let (inlet_tx, inlet_rx) = mpsc::channel(config.pipeline_capacity.max(1));
        let supervisor = ConnectionSupervisor::new(chat, emitter, inlet_tx, config.connection);

        let pipeline = tokio::spawn(run_chat_pipeline(
            inlet_rx,
            Arc::clone(&catalog),
            Arc::clone(&dispatcher),
            Arc::clone(&playback),
        ));

        tracing::info!("orchestrator ready");
        Self {
            events,
            settings,
            catalog,
            dispatcher,
            playback,
            downloads,
            supervisor,
            pipeline,
        }
    }

    // ── Identity ───────────────────────────────────────────────────

    /// Current Twitch username (possibly empty).
    pub async fn get_twitch_username(&self) -> Result<String, CommandError> {
        let settings = self.settings.get().await?;
        Ok(settings.effective_username().to_owned())
    }

    /// Persist a new Twitch username.
    pub async fn set_twitch_username(&self, username: &str) -> Result<String, CommandError> {
        let trimmed = username.trim();
        self.settings
            .update(SettingsUpdate {
                twitch_username: Some(Some(trimmed.to_owned())),
                ..Default::default()
            })
            .await?;
        Ok(format!("Twitch username set to {trimmed}"))
    }

    // ── Speakers ───────────────────────────────────────────────────

    /// Ordered voice list, capped for display.
    pub fn get_available_speakers(&self) -> Result<Vec<Speaker>, CommandError> {
        Ok(self.catalog.display_list()?)
    }

    /// Validate and persist a new voice selection.
    pub async fn set_selected_speaker(&self, speaker_id: i64) -> Result<String, CommandError> {
        self.catalog.select(speaker_id).await?;
        Ok(format!("Selected speaker {speaker_id}"))
    }

    /// Currently selected voice id.
    #[must_use]
    pub fn selected_speaker(&self) -> i64 {
        self.catalog.current()
    }

    // ── Chat reader ────────────────────────────────────────────────

    /// Connect to the configured channel's chat and start reading it
    /// aloud.
    pub async fn start_twitch_chat_reader(&self) -> Result<String, CommandError> {
        let settings = self.settings.get().await?;
        let channel = settings.effective_username().trim().to_owned();
        if channel.is_empty() {
            return Err(ChatError::MissingChannel.into());
        }
        self.supervisor.start(&channel).await?;
        Ok("Connected".to_owned())
    }

    /// Disconnect from chat.
    pub fn kill_twitch_chat_reader(&self) -> Result<String, CommandError> {
        self.supervisor.stop()?;
        Ok("Disconnected".to_owned())
    }

    /// Current connection state. Non-blocking.
    #[must_use]
    pub fn connection_status(&self) -> ConnectionState {
        self.supervisor.status()
    }

    // ── Synthesis ──────────────────────────────────────────────────

    /// Synthesize text to a temporary WAV artifact, without playback.
    pub async fn synth_text(&self, text: &str) -> Result<PathBuf, CommandError> {
        let path = self
            .dispatcher
            .synthesize_to_file(text, self.catalog.current())
            .await?;
        Ok(path)
    }

    /// Synthesize text and queue it for playback.
    pub async fn synth_and_play_text(&self, text: &str) -> Result<String, CommandError> {
        let buffer = self
            .dispatcher
            .synthesize(text, self.catalog.current())
            .await?;
        self.playback.enqueue(buffer)?;
        Ok("Queued for playback".to_owned())
    }

    /// Stop the active buffer and discard everything pending.
    pub fn stop_playback(&self) -> String {
        self.playback.clear();
        "Playback stopped".to_owned()
    }

    /// Number of buffers waiting to play.
    #[must_use]
    pub fn playback_backlog(&self) -> usize {
        self.playback.len()
    }

    // ── Downloads ──────────────────────────────────────────────────

    /// Begin a download; progress arrives as `download:*` events.
    pub fn download(&self, url: &str) -> Result<u64, CommandError> {
        Ok(self.downloads.start(url)?)
    }

    /// Late status query for a download.
    pub fn download_status(&self, download_id: u64) -> Result<DownloadTask, CommandError> {
        Ok(self.downloads.status(download_id)?)
    }

    /// Cancel a pending or in-progress download.
    pub fn cancel_download(&self, download_id: u64) -> Result<String, CommandError> {
        self.downloads.cancel(download_id)?;
        Ok(format!("Download {download_id} cancelled"))
    }

    // ── Events ─────────────────────────────────────────────────────

    /// Subscribe to connection lifecycle events.
    #[must_use]
    pub fn subscribe_connection(&self) -> broadcast::Receiver<AppEvent> {
        self.events.subscribe_connection()
    }

    /// Subscribe to download events.
    #[must_use]
    pub fn subscribe_downloads(&self) -> broadcast::Receiver<AppEvent> {
        self.events.subscribe_downloads()
    }

    /// Subscribe to playback error events.
    #[must_use]
    pub fn subscribe_playback(&self) -> broadcast::Receiver<AppEvent> {
        self.events.subscribe_playback()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if self.supervisor.status().is_active() {
            let _ = self.supervisor.stop();
        }
        self.pipeline.abort();
    }
}

/// The chat→speech pipeline task.
///
/// Pulls chat messages off the supervisor's inlet in arrival order and
/// runs each through synthesize→enqueue with the *current* voice
/// selection. Failures are contained per message: a synthesis error or
/// a full playback queue drops that message and the loop continues.
async fn run_chat_pipeline(
    mut inlet: mpsc::Receiver<ChatMessage>,
    catalog: Arc<SpeakerCatalog>,
    dispatcher: Arc<SynthesisDispatcher>,
    playback: Arc<PlaybackQueue>,
) {
    while let Some(message) = inlet.recv().await {
        let text = message.speech_text();
        match dispatcher.synthesize(&text, catalog.current()).await {
            Ok(buffer) => {
                if let Err(e) = playback.enqueue(buffer) {
                    tracing::warn!(error = %e, "dropping chat speech: playback queue full");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, from = %message.username, "chat message synthesis failed");
            }
        }
    }
    tracing::debug!("chat pipeline stopped");
}
