//! Integration tests for the orchestrator command surface.
//!
//! A fresh orchestrator is constructed per case from mock
//! collaborators: a canned speech engine, a counting audio sink, a
//! scripted chat source, and an in-memory settings repository. No
//! audio hardware, model files, or external network access is
//! required; downloads run against an in-process TCP fixture serving
//! canned HTTP.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use chatvox_app::{CommandError, Orchestrator, OrchestratorConfig};
use chatvox_chat::{ChatError, ChatMessage, ChatSource, ChatStream};
use chatvox_core::{
    AppEvent, AudioBuffer, ConnectionState, DownloadError, DownloadEvent, DownloadStatus,
    RepositoryError, Settings, SettingsRepository, Speaker,
};
use chatvox_download::DownloadConfig;
use chatvox_voice::{AudioSink, SynthesisConfig, TtsBackend, VoiceError};

// ── Mock collaborators ─────────────────────────────────────────────

/// Engine with a fixed voice list that records every synthesized text.
struct CannedEngine {
    voice_count: i64,
    synthesized: Mutex<Vec<String>>,
}

impl CannedEngine {
    fn with_voices(voice_count: i64) -> Arc<Self> {
        Arc::new(Self {
            voice_count,
            synthesized: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TtsBackend for CannedEngine {
    async fn synthesize(&self, text: &str, _speaker: i64) -> Result<AudioBuffer, VoiceError> {
        self.synthesized.lock().unwrap().push(text.to_owned());
        Ok(AudioBuffer::new(vec![0.25; 64], 22_050))
    }

    fn voices(&self) -> Result<Vec<Speaker>, VoiceError> {
        Ok((0..self.voice_count)
            .map(|id| Speaker::new(id, format!("voice-{id}")))
            .collect())
    }
}

/// Sink that plays instantly and counts what it played.
#[derive(Default)]
struct CountingSink {
    played: AtomicUsize,
}

#[async_trait]
impl AudioSink for CountingSink {
    async fn play(&self, _buffer: AudioBuffer) -> Result<(), VoiceError> {
        self.played.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {}
}

/// Stream that yields scripted messages, then pends forever.
struct ScriptedStream {
    messages: VecDeque<ChatMessage>,
}

#[async_trait]
impl ChatStream for ScriptedStream {
    async fn next_message(&mut self) -> Result<Option<ChatMessage>, ChatError> {
        match self.messages.pop_front() {
            Some(message) => Ok(Some(message)),
            None => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// Source handing out one scripted stream per connect.
struct ScriptedSource {
    streams: Mutex<VecDeque<Vec<ChatMessage>>>,
}

impl ScriptedSource {
    fn quiet() -> Arc<Self> {
        Self::with_scripts(vec![Vec::new()])
    }

    fn with_scripts(scripts: Vec<Vec<ChatMessage>>) -> Arc<Self> {
        Arc::new(Self {
            streams: Mutex::new(scripts.into_iter().collect()),
        })
    }
}

#[async_trait]
impl ChatSource for ScriptedSource {
    async fn connect(&self, _channel: &str) -> Result<Box<dyn ChatStream>, ChatError> {
        match self.streams.lock().unwrap().pop_front() {
            Some(messages) => Ok(Box::new(ScriptedStream {
                messages: messages.into(),
            })),
            None => Err(ChatError::Transport("connection refused".to_owned())),
        }
    }
}

/// In-memory settings repository.
#[derive(Default)]
struct MemoryRepo {
    settings: Mutex<Option<Settings>>,
}

#[async_trait]
impl SettingsRepository for MemoryRepo {
    async fn load(&self) -> Result<Settings, RepositoryError> {
        Ok(self
            .settings
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(Settings::with_defaults))
    }

    async fn save(&self, settings: &Settings) -> Result<(), RepositoryError> {
        *self.settings.lock().unwrap() = Some(settings.clone());
        Ok(())
    }
}

// ── Fixture ────────────────────────────────────────────────────────

struct Fixture {
    orchestrator: Orchestrator,
    engine: Arc<CannedEngine>,
    sink: Arc<CountingSink>,
    _artifacts: tempfile::TempDir,
    _downloads: tempfile::TempDir,
}

async fn fixture_with(engine: Arc<CannedEngine>, chat: Arc<ScriptedSource>) -> Fixture {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let artifacts = tempfile::tempdir().unwrap();
    let downloads = tempfile::tempdir().unwrap();
    let sink = Arc::new(CountingSink::default());

    let config = OrchestratorConfig {
        synthesis: SynthesisConfig {
            artifact_dir: artifacts.path().to_path_buf(),
            ..Default::default()
        },
        downloads: DownloadConfig {
            download_dir: downloads.path().to_path_buf(),
            ..Default::default()
        },
        ..Default::default()
    };

    let orchestrator = Orchestrator::new(
        Arc::clone(&engine) as Arc<dyn TtsBackend>,
        Arc::clone(&sink) as Arc<dyn AudioSink>,
        chat,
        Arc::new(MemoryRepo::default()),
        config,
    )
    .await;

    Fixture {
        orchestrator,
        engine,
        sink,
        _artifacts: artifacts,
        _downloads: downloads,
    }
}

async fn fixture() -> Fixture {
    fixture_with(CannedEngine::with_voices(55), ScriptedSource::quiet()).await
}

async fn wait_until(mut probe: impl FnMut() -> bool) {
    for _ in 0..400 {
        if probe() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

// ── Identity ───────────────────────────────────────────────────────

#[tokio::test]
async fn username_set_then_get_roundtrips() {
    let f = fixture().await;

    assert_eq!(f.orchestrator.get_twitch_username().await.unwrap(), "");

    let ack = f.orchestrator.set_twitch_username("alice").await.unwrap();
    assert!(ack.contains("alice"));
    assert_eq!(f.orchestrator.get_twitch_username().await.unwrap(), "alice");
}

#[tokio::test]
async fn empty_username_is_rejected_and_previous_value_kept() {
    let f = fixture().await;

    f.orchestrator.set_twitch_username("alice").await.unwrap();
    let err = f.orchestrator.set_twitch_username("   ").await.unwrap_err();
    assert!(matches!(err, CommandError::Config(_)));
    assert_eq!(f.orchestrator.get_twitch_username().await.unwrap(), "alice");
}

// ── Speakers ───────────────────────────────────────────────────────

#[tokio::test]
async fn speaker_catalog_scenario() {
    // Engine knows 55 voices; the display list is capped to 50.
    let f = fixture().await;

    let speakers = f.orchestrator.get_available_speakers().unwrap();
    assert_eq!(speakers.len(), 50);
    let ids: Vec<i64> = speakers.iter().map(|s| s.id).collect();
    assert_eq!(ids, (0..50).collect::<Vec<i64>>());

    f.orchestrator.set_selected_speaker(7).await.unwrap();
    assert_eq!(f.orchestrator.selected_speaker(), 7);

    let err = f.orchestrator.set_selected_speaker(9999).await.unwrap_err();
    assert!(matches!(
        err,
        CommandError::Voice(VoiceError::InvalidSpeaker(9999))
    ));
    assert_eq!(f.orchestrator.selected_speaker(), 7);
}

// ── Chat reader lifecycle ──────────────────────────────────────────

#[tokio::test]
async fn chat_reader_lifecycle_scenario() {
    let f = fixture().await;
    f.orchestrator
        .set_twitch_username("somechannel")
        .await
        .unwrap();

    let status = f.orchestrator.start_twitch_chat_reader().await.unwrap();
    assert_eq!(status, "Connected");
    assert_eq!(
        f.orchestrator.connection_status(),
        ConnectionState::Connected
    );

    let err = f.orchestrator.start_twitch_chat_reader().await.unwrap_err();
    assert!(matches!(
        err,
        CommandError::Connection(ChatError::AlreadyConnected)
    ));

    let status = f.orchestrator.kill_twitch_chat_reader().unwrap();
    assert_eq!(status, "Disconnected");
    assert_eq!(f.orchestrator.connection_status(), ConnectionState::Idle);

    let err = f.orchestrator.kill_twitch_chat_reader().unwrap_err();
    assert!(matches!(
        err,
        CommandError::Connection(ChatError::NotConnected)
    ));
}

#[tokio::test]
async fn chat_reader_requires_a_configured_username() {
    let f = fixture().await;
    let err = f.orchestrator.start_twitch_chat_reader().await.unwrap_err();
    assert!(matches!(
        err,
        CommandError::Connection(ChatError::MissingChannel)
    ));
    assert_eq!(f.orchestrator.connection_status(), ConnectionState::Idle);
}

#[tokio::test]
async fn chat_messages_are_synthesized_and_played_in_order() {
    let engine = CannedEngine::with_voices(5);
    let chat = ScriptedSource::with_scripts(vec![vec![
        ChatMessage::new("alice", "hello"),
        ChatMessage::new("bob", "world"),
    ]]);
    let f = fixture_with(Arc::clone(&engine), chat).await;

    f.orchestrator
        .set_twitch_username("somechannel")
        .await
        .unwrap();
    f.orchestrator.start_twitch_chat_reader().await.unwrap();

    wait_until(|| f.sink.played.load(Ordering::SeqCst) == 2).await;
    assert_eq!(
        *engine.synthesized.lock().unwrap(),
        vec!["user alice said hello", "user bob said world"]
    );
}

// ── Synthesis ──────────────────────────────────────────────────────

#[tokio::test]
async fn synth_and_play_rejects_empty_input_without_touching_the_queue() {
    let f = fixture().await;

    let err = f.orchestrator.synth_and_play_text("").await.unwrap_err();
    assert!(matches!(err, CommandError::Voice(VoiceError::EmptyInput)));
    assert_eq!(f.orchestrator.playback_backlog(), 0);
    assert_eq!(f.sink.played.load(Ordering::SeqCst), 0);
    assert!(f.engine.synthesized.lock().unwrap().is_empty());
}

#[tokio::test]
async fn synth_and_play_queues_audio() {
    let f = fixture().await;

    let status = f
        .orchestrator
        .synth_and_play_text("read this aloud")
        .await
        .unwrap();
    assert_eq!(status, "Queued for playback");
    wait_until(|| f.sink.played.load(Ordering::SeqCst) == 1).await;
}

#[tokio::test]
async fn synth_text_writes_a_wav_artifact() {
    let f = fixture().await;

    let path = f.orchestrator.synth_text("artifact please").await.unwrap();
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("wav"));
    assert!(path.exists());
    assert!(std::fs::metadata(&path).unwrap().len() > 44);
}

#[tokio::test]
async fn stop_playback_reports_a_status_string() {
    let f = fixture().await;
    assert_eq!(f.orchestrator.stop_playback(), "Playback stopped");
}

// ── Downloads ──────────────────────────────────────────────────────

/// Serve one canned HTTP response on a random local port.
async fn spawn_http_fixture(body: Vec<u8>, chunk: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 2048];
        let mut head = Vec::new();
        loop {
            let n = sock.read(&mut buf).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            head.extend_from_slice(&buf[..n]);
            if head.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let header = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        if sock.write_all(header.as_bytes()).await.is_err() {
            return;
        }
        for part in body.chunks(chunk.max(1)) {
            if sock.write_all(part).await.is_err() {
                return;
            }
            let _ = sock.flush().await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });
    format!("http://{addr}/file.mp3")
}

#[tokio::test]
async fn download_scenario_reports_monotonic_progress_to_completion() {
    let f = fixture().await;
    let mut events = f.orchestrator.subscribe_downloads();
    let url = spawn_http_fixture(vec![9u8; 1000], 500).await;

    let id = f.orchestrator.download(&url).unwrap();
    assert_eq!(id, 1);

    let mut last = 0u64;
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("no event within 5s")
            .expect("event channel closed");
        let AppEvent::Download { event } = event else {
            panic!("unexpected event kind");
        };
        match event {
            DownloadEvent::DownloadProgress {
                bytes_downloaded,
                content_length,
                ..
            } => {
                assert!(bytes_downloaded >= last);
                assert_eq!(content_length, Some(1000));
                last = bytes_downloaded;
            }
            DownloadEvent::DownloadCompleted {
                bytes_downloaded,
                content_length,
                ..
            } => {
                assert_eq!(bytes_downloaded, 1000);
                assert_eq!(content_length, Some(1000));
                break;
            }
            DownloadEvent::DownloadStarted { .. } => {}
            other => panic!("unexpected download event: {other:?}"),
        }
    }
    assert_eq!(last, 1000, "final progress equals content length");

    let task = f.orchestrator.download_status(id).unwrap();
    assert_eq!(task.status, DownloadStatus::Completed);
}

#[tokio::test]
async fn malformed_download_urls_fail_synchronously() {
    let f = fixture().await;
    let err = f.orchestrator.download("definitely not a url").unwrap_err();
    assert!(matches!(
        err,
        CommandError::Download(DownloadError::InvalidUrl { .. })
    ));
}

#[tokio::test]
async fn cancelling_an_unknown_download_fails() {
    let f = fixture().await;
    let err = f.orchestrator.cancel_download(404).unwrap_err();
    assert!(matches!(
        err,
        CommandError::Download(DownloadError::UnknownDownload { id: 404 })
    ));
}
