//! Speaker catalog — cached, validated set of available synthesis voices.
//!
//! The catalog fetches the voice list from the engine once per process
//! (re-fetchable on demand), caps the *display* list to a bounded size,
//! and owns the single validated voice selection, persisting it through
//! the settings repository on every successful change.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chatvox_core::{Speaker, SettingsRepository};

use crate::backend::TtsBackend;
use crate::error::VoiceError;

/// Maximum number of speakers returned to the presentation layer.
///
/// Ids beyond the cap stay selectable: validation runs against the full
/// uncapped set.
pub const SPEAKER_DISPLAY_CAP: usize = 50;

/// Cached voice catalog plus the active selection.
pub struct SpeakerCatalog {
    engine: Arc<dyn TtsBackend>,
    repo: Arc<dyn SettingsRepository>,
    /// Full uncapped voice set, keyed by id. Replaced atomically on
    /// refresh; a failed refresh leaves the previous cache unchanged.
    known: RwLock<HashMap<i64, Speaker>>,
    /// The validated selection. Only [`select`](Self::select) writes it.
    selected: AtomicI64,
}

impl SpeakerCatalog {
    /// Create a catalog seeded with a previously persisted selection.
    ///
    /// The voice list itself is fetched lazily on the first
    /// [`refresh`](Self::refresh) / [`display_list`](Self::display_list).
    pub fn new(
        engine: Arc<dyn TtsBackend>,
        repo: Arc<dyn SettingsRepository>,
        initial_selection: i64,
    ) -> Self {
        Self {
            engine,
            repo,
            known: RwLock::new(HashMap::new()),
            selected: AtomicI64::new(initial_selection),
        }
    }

    /// Fetch the voice list from the engine and replace the cache.
    ///
    /// Returns the capped-for-display list. On engine failure the
    /// previous cache is retained unchanged and the error propagates.
    pub fn refresh(&self) -> Result<Vec<Speaker>, VoiceError> {
        let voices = self.engine.voices()?;
        tracing::debug!(count = voices.len(), "speaker catalog refreshed");

        let map: HashMap<i64, Speaker> = voices.into_iter().map(|s| (s.id, s)).collect();
        let display = capped_display(&map);
        *self.known.write().unwrap() = map;
        Ok(display)
    }

    /// Return the display list, fetching from the engine on first use.
    pub fn display_list(&self) -> Result<Vec<Speaker>, VoiceError> {
        {
            let known = self.known.read().unwrap();
            if !known.is_empty() {
                return Ok(capped_display(&known));
            }
        }
        self.refresh()
    }

    /// Validate and persist a new voice selection.
    ///
    /// The id must exist in the full (uncapped) known set. On success
    /// the selection is persisted via the settings repository and then
    /// cached; on any failure the current selection is left untouched.
    pub async fn select(&self, id: i64) -> Result<(), VoiceError> {
        {
            let known = self.known.read().unwrap();
            if known.is_empty() {
                drop(known);
                self.refresh()?;
            }
        }
        if !self.known.read().unwrap().contains_key(&id) {
            return Err(VoiceError::InvalidSpeaker(id));
        }

        let mut settings = self
            .repo
            .load()
            .await
            .map_err(|e| VoiceError::Persistence { source: e.into() })?;
        settings.selected_speaker = Some(id);
        self.repo
            .save(&settings)
            .await
            .map_err(|e| VoiceError::Persistence { source: e.into() })?;

        self.selected.store(id, Ordering::SeqCst);
        tracing::info!(speaker = id, "voice selection changed");
        Ok(())
    }

    /// Current selection, non-blocking.
    #[must_use]
    pub fn current(&self) -> i64 {
        self.selected.load(Ordering::SeqCst)
    }
}

/// Sort the full set by id and truncate to the display cap.
fn capped_display(known: &HashMap<i64, Speaker>) -> Vec<Speaker> {
    let mut list: Vec<Speaker> = known.values().cloned().collect();
    list.sort_by_key(|s| s.id);
    list.truncate(SPEAKER_DISPLAY_CAP);
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatvox_core::{AudioBuffer, RepositoryError, Settings};
    use std::sync::Mutex;
    use std::sync::atomic::AtomicBool;

    struct FakeEngine {
        voice_count: i64,
        unavailable: AtomicBool,
    }

    impl FakeEngine {
        fn with_voices(voice_count: i64) -> Self {
            Self {
                voice_count,
                unavailable: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl TtsBackend for FakeEngine {
        async fn synthesize(&self, _text: &str, _speaker: i64) -> Result<AudioBuffer, VoiceError> {
            Ok(AudioBuffer::new(vec![0.0; 16], 22_050))
        }

        fn voices(&self) -> Result<Vec<Speaker>, VoiceError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(VoiceError::EngineUnavailable("engine offline".into()));
            }
            Ok((0..self.voice_count)
                .map(|id| Speaker::new(id, format!("voice-{id}")))
                .collect())
        }
    }

    struct MemoryRepo {
        settings: Mutex<Settings>,
        fail_saves: AtomicBool,
    }

    impl MemoryRepo {
        fn new() -> Self {
            Self {
                settings: Mutex::new(Settings::with_defaults()),
                fail_saves: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl SettingsRepository for MemoryRepo {
        async fn load(&self) -> Result<Settings, RepositoryError> {
            Ok(self.settings.lock().unwrap().clone())
        }

        async fn save(&self, settings: &Settings) -> Result<(), RepositoryError> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(RepositoryError::Storage("disk full".into()));
            }
            *self.settings.lock().unwrap() = settings.clone();
            Ok(())
        }
    }

    fn catalog_with(engine: FakeEngine, repo: Arc<MemoryRepo>) -> SpeakerCatalog {
        SpeakerCatalog::new(Arc::new(engine), repo, 0)
    }

    #[tokio::test]
    async fn display_list_is_capped_but_selection_is_not() {
        let catalog = catalog_with(FakeEngine::with_voices(60), Arc::new(MemoryRepo::new()));

        let display = catalog.display_list().unwrap();
        assert_eq!(display.len(), SPEAKER_DISPLAY_CAP);
        assert_eq!(display.first().unwrap().id, 0);
        assert_eq!(display.last().unwrap().id, 49);

        // Id 55 is beyond the display cap but still valid.
        catalog.select(55).await.unwrap();
        assert_eq!(catalog.current(), 55);
    }

    #[tokio::test]
    async fn invalid_selection_leaves_current_untouched() {
        let repo = Arc::new(MemoryRepo::new());
        let catalog = catalog_with(FakeEngine::with_voices(50), Arc::clone(&repo));

        catalog.select(7).await.unwrap();
        let err = catalog.select(9999).await.unwrap_err();
        assert!(matches!(err, VoiceError::InvalidSpeaker(9999)));
        assert_eq!(catalog.current(), 7);
        assert_eq!(
            repo.settings.lock().unwrap().selected_speaker,
            Some(7),
            "persisted selection must not change on a failed select"
        );
    }

    #[tokio::test]
    async fn failed_refresh_retains_previous_cache() {
        let engine = FakeEngine::with_voices(5);
        let engine = Arc::new(engine);
        let catalog =
            SpeakerCatalog::new(Arc::clone(&engine) as Arc<dyn TtsBackend>, Arc::new(MemoryRepo::new()), 0);

        assert_eq!(catalog.refresh().unwrap().len(), 5);

        engine.unavailable.store(true, Ordering::SeqCst);
        assert!(matches!(
            catalog.refresh(),
            Err(VoiceError::EngineUnavailable(_))
        ));
        // Cache survives the failure; selection against it still works.
        catalog.select(3).await.unwrap();
        assert_eq!(catalog.current(), 3);
    }

    #[tokio::test]
    async fn persistence_failure_leaves_selection_untouched() {
        let repo = Arc::new(MemoryRepo::new());
        let catalog = catalog_with(FakeEngine::with_voices(10), Arc::clone(&repo));

        catalog.select(2).await.unwrap();
        repo.fail_saves.store(true, Ordering::SeqCst);

        let err = catalog.select(5).await.unwrap_err();
        assert!(matches!(err, VoiceError::Persistence { .. }));
        assert_eq!(catalog.current(), 2);
    }

    #[tokio::test]
    async fn selection_persists_through_repository() {
        let repo = Arc::new(MemoryRepo::new());
        let catalog = catalog_with(FakeEngine::with_voices(10), Arc::clone(&repo));

        catalog.select(4).await.unwrap();
        assert_eq!(repo.settings.lock().unwrap().selected_speaker, Some(4));
    }
}
