//! Synthesis dispatcher — bounded, FIFO admission to the speech engine.
//!
//! Requests beyond the concurrency limit wait in submission order on a
//! fair semaphore rather than being rejected; each request is bounded
//! by a configurable timeout so a wedged engine cannot hang callers
//! indefinitely. One request's failure never affects the others.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use uuid::Uuid;

use chatvox_core::AudioBuffer;

use crate::backend::TtsBackend;
use crate::error::VoiceError;

/// Configuration for the synthesis dispatcher.
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    /// Maximum number of in-flight synthesis calls. The default of 1
    /// serializes synthesis, which keeps chat speech in arrival order.
    pub max_concurrency: usize,

    /// Upper bound on a single synthesis call.
    pub timeout: Duration,

    /// Directory for `synthesize_to_file` artifacts.
    pub artifact_dir: PathBuf,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            timeout: Duration::from_secs(30),
            artifact_dir: std::env::temp_dir(),
        }
    }
}

/// Turns text + voice selection into audio buffers.
pub struct SynthesisDispatcher {
    engine: Arc<dyn TtsBackend>,
    gate: Semaphore,
    config: SynthesisConfig,
}

impl SynthesisDispatcher {
    /// Create a dispatcher over the given engine.
    pub fn new(engine: Arc<dyn TtsBackend>, config: SynthesisConfig) -> Self {
        let permits = config.max_concurrency.max(1);
        Self {
            engine,
            gate: Semaphore::new(permits),
            config,
        }
    }

    /// Synthesize text into an audio buffer.
    ///
    /// Rejects empty (or whitespace-only) text with
    /// [`VoiceError::EmptyInput`] before taking a permit. Admission is
    /// FIFO: waiters are released in submission order.
    pub async fn synthesize(&self, text: &str, speaker: i64) -> Result<AudioBuffer, VoiceError> {
        if text.trim().is_empty() {
            return Err(VoiceError::EmptyInput);
        }

        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| VoiceError::SynthesisError("dispatcher shut down".into()))?;

        tracing::debug!(speaker, chars = text.len(), "synthesizing text");
        match tokio::time::timeout(self.config.timeout, self.engine.synthesize(text, speaker)).await
        {
            Ok(result) => result,
            Err(_) => Err(VoiceError::SynthesisTimeout {
                seconds: self.config.timeout.as_secs(),
            }),
        }
    }

    /// Synthesize text to a temporary WAV artifact and return its path.
    ///
    /// The artifact mode for callers that want the audio without
    /// immediate playback; files are named `<uuid>.wav` and live in the
    /// configured artifact directory.
    pub async fn synthesize_to_file(
        &self,
        text: &str,
        speaker: i64,
    ) -> Result<PathBuf, VoiceError> {
        let audio = self.synthesize(text, speaker).await?;

        let path = self
            .config
            .artifact_dir
            .join(format!("{}.wav", Uuid::new_v4()));
        let dest = path.clone();
        tokio::task::spawn_blocking(move || write_wav(&dest, &audio))
            .await
            .map_err(|e| VoiceError::SynthesisError(format!("artifact writer panicked: {e}")))??;

        tracing::debug!(path = %path.display(), "synthesis artifact written");
        Ok(path)
    }
}

/// Write an audio buffer as a mono 32-bit float WAV file.
fn write_wav(path: &std::path::Path, audio: &AudioBuffer) -> Result<(), VoiceError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| VoiceError::SynthesisError(format!("failed to create artifact: {e}")))?;
    for &sample in &audio.samples {
        writer
            .write_sample(sample)
            .map_err(|e| VoiceError::SynthesisError(format!("failed to write artifact: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| VoiceError::SynthesisError(format!("failed to finalize artifact: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatvox_core::Speaker;
    use std::sync::Mutex;

    /// Engine that records the order requests finish in and can be told
    /// to fail or stall for specific marker texts.
    struct ScriptedEngine {
        completed: Mutex<Vec<String>>,
        delay: Duration,
    }

    impl ScriptedEngine {
        fn new(delay: Duration) -> Self {
            Self {
                completed: Mutex::new(Vec::new()),
                delay,
            }
        }
    }

    #[async_trait]
    impl TtsBackend for ScriptedEngine {
        async fn synthesize(&self, text: &str, _speaker: i64) -> Result<AudioBuffer, VoiceError> {
            if text == "stall" {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            tokio::time::sleep(self.delay).await;
            if text == "broken" {
                return Err(VoiceError::SynthesisError("bad phonemes".into()));
            }
            self.completed.lock().unwrap().push(text.to_owned());
            Ok(AudioBuffer::new(vec![0.0; 32], 22_050))
        }

        fn voices(&self) -> Result<Vec<Speaker>, VoiceError> {
            Ok(vec![Speaker::new(0, "scripted")])
        }
    }

    fn dispatcher(engine: Arc<ScriptedEngine>, config: SynthesisConfig) -> SynthesisDispatcher {
        SynthesisDispatcher::new(engine, config)
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_admission() {
        let engine = Arc::new(ScriptedEngine::new(Duration::ZERO));
        let d = dispatcher(Arc::clone(&engine), SynthesisConfig::default());

        assert!(matches!(
            d.synthesize("", 0).await,
            Err(VoiceError::EmptyInput)
        ));
        assert!(matches!(
            d.synthesize("   \n", 0).await,
            Err(VoiceError::EmptyInput)
        ));
        assert!(engine.completed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn requests_complete_in_submission_order() {
        let engine = Arc::new(ScriptedEngine::new(Duration::from_millis(20)));
        let d = Arc::new(dispatcher(Arc::clone(&engine), SynthesisConfig::default()));

        let mut handles = Vec::new();
        for text in ["first", "second", "third"] {
            let d = Arc::clone(&d);
            handles.push(tokio::spawn(
                async move { d.synthesize(text, 0).await },
            ));
            // Give each task time to reach the semaphore in order.
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(
            *engine.completed.lock().unwrap(),
            vec!["first", "second", "third"]
        );
    }

    #[tokio::test]
    async fn one_failed_request_does_not_affect_others() {
        let engine = Arc::new(ScriptedEngine::new(Duration::ZERO));
        let d = dispatcher(Arc::clone(&engine), SynthesisConfig::default());

        assert!(matches!(
            d.synthesize("broken", 0).await,
            Err(VoiceError::SynthesisError(_))
        ));
        d.synthesize("fine", 0).await.unwrap();
        assert_eq!(*engine.completed.lock().unwrap(), vec!["fine"]);
    }

    #[tokio::test]
    async fn stalled_engine_calls_time_out() {
        let engine = Arc::new(ScriptedEngine::new(Duration::ZERO));
        let config = SynthesisConfig {
            timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let d = dispatcher(engine, config);

        assert!(matches!(
            d.synthesize("stall", 0).await,
            Err(VoiceError::SynthesisTimeout { .. })
        ));
        // The permit was released by the timeout; later requests run.
        d.synthesize("after", 0).await.unwrap();
    }

    #[tokio::test]
    async fn artifact_mode_writes_a_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::new(Duration::ZERO));
        let config = SynthesisConfig {
            artifact_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let d = dispatcher(engine, config);

        let path = d.synthesize_to_file("hello", 0).await.unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("wav"));
        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 44, "artifact should contain audio data");

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 22_050);
        assert_eq!(reader.spec().channels, 1);
    }
}
