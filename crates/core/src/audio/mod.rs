use std::{
    fmt,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
    thread::JoinHandle,
};

use serde::Serialize;

use crate::{registry::SimEvent, HanabiError, Result};

/// Which of the two pre-loaded buffers a cue plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CueStage {
    /// The boom layered on a secondary burst.
    Primary,
    /// The launch / first burst sound.
    Secondary,
}

impl CueStage {
    /// Buffer played for a simulation event.
    ///
    /// Burn-out and the burst it produces both play the secondary buffer; a
    /// second-stage burst and its trigger both play the primary buffer.
    pub fn for_event(event: &SimEvent) -> Self {
        match event {
            SimEvent::AscentBurnedOut { .. } => CueStage::Secondary,
            SimEvent::SphereBurst {
                second_stage: false,
                ..
            } => CueStage::Secondary,
            SimEvent::SphereBurst {
                second_stage: true, ..
            } => CueStage::Primary,
            SimEvent::SecondaryTriggered { .. } => CueStage::Primary,
        }
    }
}

/// Decoded audio owned by the backend. The engine never inspects the data.
#[derive(Clone)]
pub struct AudioBuffer {
    pub label: String,
    pub data: Arc<[u8]>,
}

impl AudioBuffer {
    pub fn new(label: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

impl fmt::Debug for AudioBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioBuffer")
            .field("label", &self.label)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Audio subsystem consumed by the dispatcher.
pub trait AudioBackend: Send + Sync + 'static {
    /// Decodes an encoded file into a playable buffer. Called off the frame
    /// thread.
    fn decode(&self, label: &str, bytes: &[u8]) -> Result<AudioBuffer>;
    /// Resumes the output device after the user grants audio.
    fn resume(&self) -> Result<()>;
    /// Starts playback and returns immediately.
    fn play(&self, buffer: &AudioBuffer);
}

/// Counters of cues played and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CueStats {
    pub played: u64,
    pub dropped: u64,
}

type BufferSlot = Arc<Mutex<Option<AudioBuffer>>>;

/// Maps lifecycle events to sound cues, gated on consent and load completion.
///
/// A cue that cannot play is dropped and never retried.
pub struct SoundCueDispatcher<B: AudioBackend> {
    backend: Arc<B>,
    primary: BufferSlot,
    secondary: BufferSlot,
    enabled: bool,
    stats: CueStats,
}

impl<B: AudioBackend> SoundCueDispatcher<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            primary: Arc::new(Mutex::new(None)),
            secondary: Arc::new(Mutex::new(None)),
            enabled: false,
            stats: CueStats::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn stats(&self) -> CueStats {
        self.stats
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_loaded(&self, stage: CueStage) -> bool {
        self.lock_slot(stage)
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Reads and decodes `path` on a background thread. Failures are logged
    /// and leave the stage silent.
    pub fn load_from_path(&self, stage: CueStage, path: impl Into<PathBuf>) -> JoinHandle<()> {
        let path = path.into();
        let backend = Arc::clone(&self.backend);
        let slot = Arc::clone(self.slot(stage));

        std::thread::spawn(move || {
            let label = path.display().to_string();
            let loaded = std::fs::read(&path)
                .map_err(HanabiError::from)
                .and_then(|bytes| backend.decode(&label, &bytes));
            store(stage, &slot, loaded);
        })
    }

    /// Decodes in-memory bytes on a background thread.
    pub fn load_from_bytes(
        &self,
        stage: CueStage,
        label: impl Into<String>,
        bytes: Vec<u8>,
    ) -> JoinHandle<()> {
        let label = label.into();
        let backend = Arc::clone(&self.backend);
        let slot = Arc::clone(self.slot(stage));

        std::thread::spawn(move || {
            let loaded = backend.decode(&label, &bytes);
            store(stage, &slot, loaded);
        })
    }

    /// One-shot consent action. Resumes the output device and enables cues
    /// for the rest of the session.
    pub fn grant_consent(&mut self) -> bool {
        if self.enabled {
            return true;
        }
        match self.backend.resume() {
            Ok(()) => {
                tracing::info!("audio enabled");
                self.enabled = true;
            }
            Err(err) => tracing::warn!(%err, "audio device refused to resume, staying muted"),
        }
        self.enabled
    }

    pub fn dispatch(&mut self, event: &SimEvent) -> bool {
        self.play(CueStage::for_event(event))
    }

    /// Plays the stage's buffer if audio is enabled and loaded. Otherwise the
    /// cue is dropped.
    pub fn play(&mut self, stage: CueStage) -> bool {
        if !self.enabled {
            self.stats.dropped += 1;
            return false;
        }

        let buffer = match self.lock_slot(stage) {
            Ok(slot) => slot.clone(),
            Err(err) => {
                tracing::warn!(?stage, %err, "cue slot unavailable");
                None
            }
        };

        match buffer {
            Some(buffer) => {
                self.backend.play(&buffer);
                self.stats.played += 1;
                true
            }
            None => {
                tracing::trace!(?stage, "cue dropped, buffer not loaded");
                self.stats.dropped += 1;
                false
            }
        }
    }

    fn slot(&self, stage: CueStage) -> &BufferSlot {
        match stage {
            CueStage::Primary => &self.primary,
            CueStage::Secondary => &self.secondary,
        }
    }

    fn lock_slot(&self, stage: CueStage) -> Result<MutexGuard<'_, Option<AudioBuffer>>> {
        self.slot(stage)
            .lock()
            .map_err(|_| HanabiError::audio("cue buffer slot has been poisoned"))
    }
}

impl<B: AudioBackend> fmt::Debug for SoundCueDispatcher<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundCueDispatcher")
            .field("enabled", &self.enabled)
            .field("primary", &self.is_loaded(CueStage::Primary))
            .field("secondary", &self.is_loaded(CueStage::Secondary))
            .field("stats", &self.stats)
            .finish()
    }
}

fn store(stage: CueStage, slot: &BufferSlot, loaded: Result<AudioBuffer>) {
    match loaded {
        Ok(buffer) => match slot.lock() {
            Ok(mut guard) => {
                tracing::debug!(?stage, label = %buffer.label, "cue buffer ready");
                *guard = Some(buffer);
            }
            Err(_) => tracing::warn!(?stage, "cue buffer slot has been poisoned"),
        },
        Err(err) => tracing::warn!(?stage, %err, "cue buffer failed to load"),
    }
}
