//! Core library for the Hanabi fireworks engine.
//!
//! The crate simulates staged fireworks: ascending bodies that burn out into
//! sphere bursts, optional secondary bursts, and heart and rosette bursts
//! launched straight into the background. Each module owns one subsystem;
//! [`Simulation`] ties them together behind a single per-frame call. The
//! render surface, the audio device and the backdrop video feed are supplied
//! by the host through traits.

pub mod ascent;
pub mod assets;
pub mod audio;
pub mod backdrop;
pub mod burst;
pub mod color;
pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod launcher;
pub mod random;
pub mod registry;
pub mod render;
pub mod timeline;

pub use ascent::{AscendingBody, TrailBuffer};
pub use assets::{AssetStore, GlowTexture, Sprite};
pub use audio::{AudioBackend, AudioBuffer, CueStage, CueStats, SoundCueDispatcher};
pub use backdrop::{start_backdrop, DeviceFeed, VideoFeed};
pub use burst::{BurstKind, ParticleCloud, Shape, ShapedBurst, SphereBurst};
pub use color::Rgb;
pub use config::{
    AscentConfig, AudioConfig, EngineConfig, LauncherConfig, RenderConfig, ShapedBurstConfig,
    SphereBurstConfig, SpawnRegion,
};
pub use engine::{FrameReport, Simulation};
pub use error::{HanabiError, Result};
pub use launcher::{LaunchReport, Launcher};
pub use random::RandomSource;
pub use registry::{Entity, EntityId, Lineage, SimEvent, SimulationRegistry, TickContext};
pub use render::{
    FrameSummary, RenderGraph, RenderStats, RenderSurface, VisualFrame, VisualHandle, VisualKind,
    NewVisual,
};
pub use timeline::{CancellationToken, FrameClock, IntervalTimer, Task, TaskQueue};
