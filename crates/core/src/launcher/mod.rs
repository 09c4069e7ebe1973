//! Periodic spawning of ascending bodies and background shaped bursts.
//!
//! The main and background schedulers are independent: only entities that
//! descend from the main scheduler count against its cap.

use serde::Serialize;

use crate::{
    ascent::AscendingBody,
    burst::{Shape, ShapedBurst},
    config::EngineConfig,
    registry::{Entity, Lineage, SimulationRegistry},
    render::RenderSurface,
    timeline::IntervalTimer,
    RandomSource,
};

/// Entities spawned by one [`Launcher::poll`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LaunchReport {
    pub bodies: usize,
    pub shaped: usize,
    /// Main scheduler firings skipped because the cap was reached.
    pub capped: usize,
}

impl LaunchReport {
    pub fn total(&self) -> usize {
        self.bodies + self.shaped
    }
}

#[derive(Debug, Clone)]
pub struct Launcher {
    main: IntervalTimer,
    background: IntervalTimer,
}

impl Launcher {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            main: IntervalTimer::new(config.launcher.main_interval_ms),
            background: IntervalTimer::new(config.launcher.background_interval_ms),
        }
    }

    /// Fires each scheduler whose period has elapsed by `now_ms`, at most
    /// once per call.
    pub fn poll(
        &mut self,
        now_ms: f64,
        registry: &mut SimulationRegistry,
        config: &EngineConfig,
        rng: &mut RandomSource,
        surface: &mut dyn RenderSurface,
    ) -> LaunchReport {
        let mut report = LaunchReport::default();

        if self.main.poll(now_ms) {
            match launch_main_group(registry, config, rng, surface) {
                Some(n) => report.bodies += n,
                None => report.capped += 1,
            }
        }
        if self.background.poll(now_ms) {
            report.shaped += launch_background_batch(registry, config, rng, surface);
        }

        if report.total() > 0 {
            tracing::debug!(
                bodies = report.bodies,
                shaped = report.shaped,
                live = registry.len(),
                "launch"
            );
        }
        report
    }
}

/// Spawns a group of ascending bodies if the main lineage is below its cap.
/// The group is trimmed so the launch itself never crosses the cap.
///
/// Returns `None` when the cap was already reached.
pub fn launch_main_group(
    registry: &mut SimulationRegistry,
    config: &EngineConfig,
    rng: &mut RandomSource,
    surface: &mut dyn RenderSurface,
) -> Option<usize> {
    let launcher = &config.launcher;
    let live = registry.count(Lineage::Main);
    if live >= launcher.max_main {
        tracing::trace!(live, cap = launcher.max_main, "main launch skipped at cap");
        return None;
    }

    let group = rng.count(launcher.main_batch_min, launcher.main_batch_max) as usize;
    let group = group.min(launcher.max_main - live);
    for _ in 0..group {
        let origin = rng.point_in(&launcher.main_region);
        let body = AscendingBody::new(Some(origin), &config.ascent, rng, surface);
        registry.insert(Lineage::Main, Entity::Ascending(body));
    }
    Some(group)
}

/// With the configured probability, spawns a batch of heart and rosette
/// bursts directly, with no ascent phase.
pub fn launch_background_batch(
    registry: &mut SimulationRegistry,
    config: &EngineConfig,
    rng: &mut RandomSource,
    surface: &mut dyn RenderSurface,
) -> usize {
    let launcher = &config.launcher;
    if !rng.chance(launcher.background_probability) {
        return 0;
    }

    let mut batch = rng.count(launcher.background_batch_min, launcher.background_batch_max) as usize;
    if let Some(cap) = launcher.max_background {
        batch = batch.min(cap.saturating_sub(registry.count(Lineage::Background)));
    }

    for _ in 0..batch {
        let shape = Shape::random(rng);
        let origin = rng.point_in(&launcher.background_region);
        let burst = ShapedBurst::new(origin, shape, &config.shaped, rng, surface);
        registry.insert(Lineage::Background, Entity::Shaped(burst));
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RenderGraph;

    struct Rig {
        config: EngineConfig,
        rng: RandomSource,
        surface: RenderGraph,
        registry: SimulationRegistry,
    }

    impl Rig {
        fn new(seed: u64) -> Self {
            let mut config = EngineConfig::default();
            config.sphere.particle_count = 8;
            config.shaped.particle_count = 8;
            Self {
                config,
                rng: RandomSource::seeded(seed),
                surface: RenderGraph::new(),
                registry: SimulationRegistry::new(),
            }
        }
    }

    #[test]
    fn main_group_respects_batch_bounds() {
        let mut rig = Rig::new(61);
        for _ in 0..20 {
            let mut registry = SimulationRegistry::new();
            let n = launch_main_group(&mut registry, &rig.config, &mut rig.rng, &mut rig.surface)
                .unwrap();
            assert!((2..=4).contains(&n));
            assert_eq!(registry.count(Lineage::Main), n);
        }
    }

    #[test]
    fn main_group_skips_at_cap() {
        let mut rig = Rig::new(62);
        rig.config.launcher.max_main = 3;
        let first = launch_main_group(&mut rig.registry, &rig.config, &mut rig.rng, &mut rig.surface);
        assert!(first.is_some_and(|n| n <= 3));
        while rig.registry.count(Lineage::Main) < 3 {
            launch_main_group(&mut rig.registry, &rig.config, &mut rig.rng, &mut rig.surface);
        }
        assert_eq!(rig.registry.count(Lineage::Main), 3);
        assert_eq!(
            launch_main_group(&mut rig.registry, &rig.config, &mut rig.rng, &mut rig.surface),
            None
        );
    }

    #[test]
    fn background_bursts_do_not_consume_main_cap() {
        let mut rig = Rig::new(63);
        rig.config.launcher.background_probability = 1.0;
        rig.config.launcher.max_main = 4;
        for _ in 0..5 {
            launch_background_batch(&mut rig.registry, &rig.config, &mut rig.rng, &mut rig.surface);
        }
        assert!(rig.registry.count(Lineage::Background) >= 10);

        let n = launch_main_group(&mut rig.registry, &rig.config, &mut rig.rng, &mut rig.surface);
        assert!(n.is_some_and(|n| n >= 2));
    }

    #[test]
    fn background_probability_zero_never_spawns() {
        let mut rig = Rig::new(64);
        rig.config.launcher.background_probability = 0.0;
        for _ in 0..50 {
            assert_eq!(
                launch_background_batch(&mut rig.registry, &rig.config, &mut rig.rng, &mut rig.surface),
                0
            );
        }
        assert!(rig.registry.is_empty());
    }

    #[test]
    fn background_mixes_both_shapes() {
        let mut rig = Rig::new(65);
        rig.config.launcher.background_probability = 1.0;
        for _ in 0..10 {
            launch_background_batch(&mut rig.registry, &rig.config, &mut rig.rng, &mut rig.surface);
        }

        let shapes: Vec<Shape> = rig
            .registry
            .iter()
            .filter_map(|(_, _, entity)| match entity {
                Entity::Shaped(burst) => Some(burst.shape()),
                _ => None,
            })
            .collect();
        assert!(shapes.contains(&Shape::Heart));
        assert!(shapes.contains(&Shape::Rosette));

        let region = rig.config.launcher.background_region;
        for (_, _, entity) in rig.registry.iter() {
            if let Entity::Shaped(burst) = entity {
                let origin = burst.cloud().origin();
                assert!(origin.cmpge(region.min).all() && origin.cmplt(region.max).all());
            }
        }
    }

    #[test]
    fn optional_background_cap_limits_batches() {
        let mut rig = Rig::new(66);
        rig.config.launcher.background_probability = 1.0;
        rig.config.launcher.max_background = Some(5);
        for _ in 0..10 {
            launch_background_batch(&mut rig.registry, &rig.config, &mut rig.rng, &mut rig.surface);
        }
        assert_eq!(rig.registry.count(Lineage::Background), 5);
    }

    #[test]
    fn poll_follows_timer_periods() {
        let mut rig = Rig::new(67);
        rig.config.launcher.background_probability = 0.0;
        let mut launcher = Launcher::new(&rig.config);

        let early = launcher.poll(1000.0, &mut rig.registry, &rig.config, &mut rig.rng, &mut rig.surface);
        assert_eq!(early.bodies, 0);

        let due = launcher.poll(1500.0, &mut rig.registry, &rig.config, &mut rig.rng, &mut rig.surface);
        assert!((2..=4).contains(&due.bodies));
        assert_eq!(due.shaped, 0);
    }

    #[test]
    fn empty_group_is_not_reported_as_capped() {
        let mut rig = Rig::new(69);
        rig.config.launcher.main_batch_min = 0;
        rig.config.launcher.main_batch_max = 0;
        rig.config.launcher.background_probability = 0.0;
        let mut launcher = Launcher::new(&rig.config);

        let report = launcher.poll(1500.0, &mut rig.registry, &rig.config, &mut rig.rng, &mut rig.surface);
        assert_eq!(report, LaunchReport::default());
    }

    #[test]
    fn full_cap_is_reported() {
        let mut rig = Rig::new(70);
        rig.config.launcher.max_main = 0;
        let mut launcher = Launcher::new(&rig.config);

        let report = launcher.poll(1500.0, &mut rig.registry, &rig.config, &mut rig.rng, &mut rig.surface);
        assert_eq!(report.capped, 1);
        assert_eq!(report.bodies, 0);
    }

    #[test]
    fn stalled_frame_launches_one_batch_per_scheduler() {
        let mut rig = Rig::new(71);
        rig.config.launcher.background_probability = 1.0;
        let mut launcher = Launcher::new(&rig.config);

        let report = launcher.poll(
            3_600_000.0,
            &mut rig.registry,
            &rig.config,
            &mut rig.rng,
            &mut rig.surface,
        );
        assert!((2..=4).contains(&report.bodies));
        assert!((2..=4).contains(&report.shaped));
        assert_eq!(rig.registry.len(), report.total());
    }

    #[test]
    fn cap_holds_whenever_a_launch_is_decided() {
        let mut rig = Rig::new(68);
        rig.config.sphere.secondary_probability = 0.0;
        rig.config.launcher.max_main = 6;
        let mut launcher = Launcher::new(&rig.config);

        let frame_ms = rig.config.render.frame_millis();
        let mut now = 0.0;
        for _ in 0..3000 {
            now += frame_ms;
            assert!(rig.registry.count(Lineage::Main) <= 6);
            launcher.poll(now, &mut rig.registry, &rig.config, &mut rig.rng, &mut rig.surface);
            assert!(rig.registry.count(Lineage::Main) <= 6);
            rig.registry.tick(&rig.config, &mut rig.rng, &mut rig.surface);
        }
    }
}
