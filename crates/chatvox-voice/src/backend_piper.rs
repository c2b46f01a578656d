//! Piper TTS engine adapter (feature `piper`).
//!
//! Wraps `piper-rs` behind the [`TtsBackend`] trait. The voice catalog
//! is read from the model's `.onnx.json` config (`speaker_id_map`)
//! rather than from the engine, which keeps the adapter independent of
//! engine-side catalog APIs.
//!
//! Synthesis here is CPU-bound and runs on the calling task; the
//! dispatcher's admission gate is what bounds engine pressure.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use piper_rs::synth::PiperSpeechSynthesizer;

use chatvox_core::{AudioBuffer, Speaker};

use crate::backend::TtsBackend;
use crate::error::VoiceError;

/// Sample rate Piper voices commonly synthesize at, used when the model
/// config does not state one.
const FALLBACK_SAMPLE_RATE: u32 = 22_050;

/// [`TtsBackend`] over a local Piper ONNX voice model.
pub struct PiperBackend {
    /// Kept for per-request speaker switching.
    model: std::sync::Arc<dyn piper_rs::PiperModel>,
    /// Guards set-speaker + synthesize so two requests can't interleave
    /// a voice switch.
    synth: Mutex<PiperSpeechSynthesizer>,
    speakers: Vec<Speaker>,
    sample_rate: u32,
}

impl PiperBackend {
    /// Load a Piper voice from its `.onnx.json` config path.
    pub fn from_config_path(config_path: &Path) -> Result<Self, VoiceError> {
        let (speakers, sample_rate) = read_model_config(config_path)?;

        let model = piper_rs::from_config_path(config_path)
            .map_err(|e| VoiceError::EngineUnavailable(e.to_string()))?;
        let synth = PiperSpeechSynthesizer::new(model.clone())
            .map_err(|e| VoiceError::EngineUnavailable(e.to_string()))?;

        tracing::info!(
            config = %config_path.display(),
            voices = speakers.len(),
            sample_rate,
            "piper model loaded"
        );

        Ok(Self {
            model,
            synth: Mutex::new(synth),
            speakers,
            sample_rate,
        })
    }
}

#[async_trait]
impl TtsBackend for PiperBackend {
    async fn synthesize(&self, text: &str, speaker: i64) -> Result<AudioBuffer, VoiceError> {
        let samples = {
            let synth = self.synth.lock().unwrap();
            let _ = self.model.set_speaker(speaker);
            let chunks = synth
                .synthesize_parallel(text.to_owned(), None)
                .map_err(|e| VoiceError::SynthesisError(e.to_string()))?;

            let mut samples: Vec<f32> = Vec::new();
            for chunk in chunks {
                let chunk = chunk.map_err(|e| VoiceError::SynthesisError(e.to_string()))?;
                samples.append(&mut chunk.into_vec());
            }
            samples
        };

        if samples.is_empty() {
            return Err(VoiceError::SynthesisError(
                "engine produced no audio".into(),
            ));
        }
        Ok(AudioBuffer::new(samples, self.sample_rate))
    }

    fn voices(&self) -> Result<Vec<Speaker>, VoiceError> {
        Ok(self.speakers.clone())
    }
}

/// Read the speaker map and sample rate from a Piper model config.
///
/// Single-speaker models have an empty `speaker_id_map`; those expose
/// one voice with id 0.
fn read_model_config(config_path: &Path) -> Result<(Vec<Speaker>, u32), VoiceError> {
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| VoiceError::EngineUnavailable(format!("cannot read model config: {e}")))?;
    let config: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| VoiceError::EngineUnavailable(format!("invalid model config: {e}")))?;

    let sample_rate = config
        .pointer("/audio/sample_rate")
        .and_then(serde_json::Value::as_u64)
        .map_or(FALLBACK_SAMPLE_RATE, |rate| rate as u32);

    let mut speakers: Vec<Speaker> = config
        .get("speaker_id_map")
        .and_then(serde_json::Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(name, id)| id.as_i64().map(|id| Speaker::new(id, name.clone())))
                .collect()
        })
        .unwrap_or_default();

    if speakers.is_empty() {
        speakers.push(Speaker::new(0, "default"));
    }
    speakers.sort_by_key(|s| s.id);

    Ok((speakers, sample_rate))
}
