use std::thread::JoinHandle;

use glam::Vec3;
use serde::Serialize;

use crate::{
    ascent::AscendingBody,
    audio::{AudioBackend, CueStage, CueStats, SoundCueDispatcher},
    backdrop::{start_backdrop, VideoFeed},
    config::EngineConfig,
    launcher::{LaunchReport, Launcher},
    registry::{Entity, EntityId, Lineage, SimulationRegistry},
    render::RenderSurface,
    timeline::FrameClock,
    RandomSource, Result,
};

/// What happened during one [`Simulation::frame`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameReport {
    pub tick: u64,
    pub launched: LaunchReport,
    pub spawned: usize,
    pub disposed: usize,
    pub cues_played: usize,
    pub live_main: usize,
    pub live_background: usize,
}

/// Top-level frame loop. Owns the registry, the schedulers, the cue
/// dispatcher and the render surface.
pub struct Simulation<S: RenderSurface, B: AudioBackend> {
    config: EngineConfig,
    rng: RandomSource,
    clock: FrameClock,
    launcher: Launcher,
    registry: SimulationRegistry,
    cues: SoundCueDispatcher<B>,
    surface: S,
    backdrop: bool,
}

impl<S: RenderSurface, B: AudioBackend> Simulation<S, B> {
    pub fn new(config: EngineConfig, surface: S, backend: B) -> Result<Self> {
        config.validate()?;
        let rng = RandomSource::from_optional_seed(config.seed);
        tracing::debug!(seed = ?config.seed, "simulation created");

        Ok(Self {
            launcher: Launcher::new(&config),
            rng,
            clock: FrameClock::default(),
            registry: SimulationRegistry::new(),
            cues: SoundCueDispatcher::new(backend),
            surface,
            backdrop: false,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn registry(&self) -> &SimulationRegistry {
        &self.registry
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn cues(&self) -> &SoundCueDispatcher<B> {
        &self.cues
    }

    pub fn cue_stats(&self) -> CueStats {
        self.cues.stats()
    }

    pub fn has_backdrop(&self) -> bool {
        self.backdrop
    }

    /// Starts background decoding of the configured cue files. Frames keep
    /// running whether or not the loads ever finish.
    pub fn load_audio(&self) -> Vec<JoinHandle<()>> {
        let audio = &self.config.audio;
        [
            (CueStage::Primary, audio.primary.as_deref()),
            (CueStage::Secondary, audio.secondary.as_deref()),
        ]
        .into_iter()
        .filter_map(|(stage, path)| path.map(|path| self.cues.load_from_path(stage, path)))
        .collect()
    }

    /// The user's one-shot consent to play sound.
    pub fn grant_audio_consent(&mut self) -> bool {
        self.cues.grant_consent()
    }

    pub fn attach_backdrop(&mut self, feed: &mut dyn VideoFeed) -> bool {
        self.backdrop = start_backdrop(feed);
        self.backdrop
    }

    /// Launches one ascending body from an explicit origin on the main path.
    pub fn launch_at(&mut self, origin: Vec3) -> EntityId {
        let body = AscendingBody::new(Some(origin), &self.config.ascent, &mut self.rng, &mut self.surface);
        self.registry.insert(Lineage::Main, Entity::Ascending(body))
    }

    /// Advances simulated time by `delta_ms` and runs one tick.
    pub fn frame(&mut self, delta_ms: f64) -> FrameReport {
        self.clock.advance(delta_ms);

        let launched = self.launcher.poll(
            self.clock.elapsed_ms,
            &mut self.registry,
            &self.config,
            &mut self.rng,
            &mut self.surface,
        );

        let tick = self
            .registry
            .tick(&self.config, &mut self.rng, &mut self.surface);

        let cues_played = tick
            .events
            .iter()
            .filter(|event| self.cues.dispatch(event))
            .count();

        FrameReport {
            tick: tick.tick,
            launched,
            spawned: tick.spawned,
            disposed: tick.disposed,
            cues_played,
            live_main: self.registry.count(Lineage::Main),
            live_background: self.registry.count(Lineage::Background),
        }
    }

    /// Disposes every entity and flushes pending ghost removals.
    pub fn shutdown(&mut self) {
        tracing::debug!(live = self.registry.len(), "simulation shutting down");
        self.registry.clear(&mut self.surface);
    }

    pub fn into_surface(mut self) -> S {
        self.shutdown();
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{ready_dispatcher, RecordingBackend};
    use crate::render::VisualKind;
    use crate::RenderGraph;

    fn config(seed: u64) -> EngineConfig {
        let mut config = EngineConfig {
            seed: Some(seed),
            ..Default::default()
        };
        config.sphere.particle_count = 16;
        config.shaped.particle_count = 16;
        config
    }

    fn simulation(config: EngineConfig) -> Simulation<RenderGraph, RecordingBackend> {
        Simulation::new(config, RenderGraph::new(), RecordingBackend::default()).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = config(1);
        config.sphere.lifespan = 0;
        assert!(Simulation::new(config, RenderGraph::new(), RecordingBackend::default()).is_err());
    }

    #[test]
    fn runs_without_audio_or_backdrop() {
        let mut sim = simulation(config(71));
        let frame = sim.config().render.frame_millis();
        let mut launched = 0;
        for _ in 0..600 {
            launched += sim.frame(frame).launched.total();
        }

        assert!(launched > 0);
        assert!(!sim.has_backdrop());
        assert_eq!(sim.cue_stats().played, 0);
        assert!(sim.cue_stats().dropped > 0);
        assert!(sim.clock().tick == 600);
    }

    #[test]
    fn burn_out_plays_two_secondary_cues() {
        let mut cfg = config(72);
        cfg.sphere.secondary_probability = 0.0;
        cfg.launcher.main_interval_ms = u64::MAX / 2;
        cfg.launcher.background_probability = 0.0;

        let mut sim = simulation(cfg);
        sim.cues = ready_dispatcher();
        sim.launch_at(Vec3::new(0.0, -2.0, -5.0));

        let mut played = 0;
        for _ in 0..50 {
            played += sim.frame(16.0).cues_played;
        }

        assert_eq!(played, 2);
        assert_eq!(
            sim.cues().backend().played(),
            vec!["secondary".to_string(), "secondary".to_string()]
        );
    }

    #[test]
    fn secondary_burst_layers_primary_cues() {
        let mut cfg = config(73);
        cfg.launcher.main_interval_ms = u64::MAX / 2;
        cfg.launcher.background_probability = 0.0;
        cfg.ascent.lifespan = 1;
        cfg.sphere.secondary_probability = 1.0;
        cfg.sphere.secondary_tick = 30;

        let mut sim = simulation(cfg);
        sim.cues = ready_dispatcher();
        sim.launch_at(Vec3::ZERO);

        // Tick 1 burns out; the sphere reaches age 30 on tick 31.
        for _ in 0..31 {
            sim.frame(16.0);
        }

        let played = sim.cues().backend().played();
        assert_eq!(played[..2], ["secondary".to_string(), "secondary".to_string()]);
        assert_eq!(played[2..], ["primary".to_string(), "primary".to_string()]);
    }

    #[test]
    fn stalled_frame_does_not_replay_missed_launches() {
        let mut sim = simulation(config(76));
        sim.frame(16.0);
        let report = sim.frame(3_600_000.0);

        assert!(report.launched.bodies <= 4);
        assert!(report.launched.shaped <= 4);
        assert!(report.live_background <= 4);
    }

    #[test]
    fn shutdown_releases_all_visuals() {
        let mut sim = simulation(config(74));
        for _ in 0..300 {
            sim.frame(16.0);
        }
        assert!(sim.surface().live_count() > 0);

        let surface = sim.into_surface();
        assert_eq!(surface.live_count(), 0);
        assert_eq!(surface.live_of_kind(VisualKind::TrailGhost), 0);
        assert_eq!(surface.stats().stale_handles, 0);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let run = |seed| {
            let mut sim = simulation(config(seed));
            (0..400)
                .map(|_| {
                    let r = sim.frame(16.0);
                    (r.live_main, r.live_background)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(75), run(75));
    }
}
