use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{fade, CloudMotion, ParticleCloud};
use crate::{
    color::Rgb,
    config::ShapedBurstConfig,
    distribution::{heart_point, rosette_point, rotate, tilt_angle},
    registry::TickContext,
    render::RenderSurface,
    BurstKind, RandomSource,
};

const PINK_HUE: f32 = 0.95;
const PINK_HUE_JITTER: f32 = 0.02;

/// Silhouette traced by a shaped burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Heart,
    Rosette,
}

impl Shape {
    pub fn kind(self) -> BurstKind {
        match self {
            Shape::Heart => BurstKind::Heart,
            Shape::Rosette => BurstKind::Rosette,
        }
    }

    /// Heart or rosette with equal probability.
    pub fn random(rng: &mut RandomSource) -> Self {
        if rng.chance(0.5) {
            Shape::Heart
        } else {
            Shape::Rosette
        }
    }

    fn particle_color(self, rng: &mut RandomSource) -> Rgb {
        let hue = PINK_HUE + rng.unit() * PINK_HUE_JITTER;
        match self {
            Shape::Heart => Rgb::from_hsl(hue, 0.7 + rng.unit() * 0.2, 0.55 + rng.unit() * 0.15),
            Shape::Rosette => Rgb::from_hsl(hue, 0.9 + rng.unit() * 0.1, 0.45 + rng.unit() * 0.1),
        }
    }
}

/// Burst whose initial velocities trace a planar curve, colored per particle
/// from a pink band.
#[derive(Debug)]
pub struct ShapedBurst {
    cloud: ParticleCloud,
    shape: Shape,
    fade_exponent: f32,
}

impl ShapedBurst {
    pub fn new(
        origin: Vec3,
        shape: Shape,
        config: &ShapedBurstConfig,
        rng: &mut RandomSource,
        surface: &mut dyn RenderSurface,
    ) -> Self {
        let tilt = tilt_angle(rng, config.max_tilt);

        let velocities: Vec<Vec3> = (0..config.particle_count)
            .map(|_| {
                let planar = match shape {
                    Shape::Heart => heart_point(rng) * config.heart_velocity_scale,
                    Shape::Rosette => {
                        rosette_point(
                            rng,
                            config.rosette_lobes,
                            config.rosette_radius_min,
                            config.rosette_radius_max,
                        ) * config.rosette_velocity_scale
                    }
                };
                rotate(planar, tilt).extend(rng.symmetric(config.depth_jitter))
            })
            .collect();

        let colors = (0..velocities.len())
            .map(|_| shape.particle_color(rng))
            .collect();

        let (drag, size) = match shape {
            Shape::Heart => (config.heart_drag, config.heart_size),
            Shape::Rosette => (config.rosette_drag, config.rosette_size),
        };

        let cloud = ParticleCloud::new(
            shape.kind(),
            origin,
            velocities,
            Some(colors),
            Rgb::from_hsl(PINK_HUE + PINK_HUE_JITTER * 0.5, 0.85, 0.55),
            CloudMotion {
                drag,
                gravity: config.gravity,
                lifespan: config.lifespan,
                size,
            },
            surface,
        );

        Self {
            cloud,
            shape,
            fade_exponent: config.fade_exponent,
        }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn cloud(&self) -> &ParticleCloud {
        &self.cloud
    }

    pub fn update(&mut self, ctx: &mut TickContext<'_>) {
        self.cloud.integrate();
        let opacity = fade(self.cloud.progress(), self.fade_exponent);
        let size = self.cloud.size();
        self.cloud.set_appearance(opacity, size);
        self.cloud.sync(ctx.surface);
    }

    pub fn is_dead(&self) -> bool {
        self.cloud.is_dead()
    }

    pub(crate) fn dispose(self, surface: &mut dyn RenderSurface) {
        self.cloud.dispose(surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::testing::Harness;

    fn shaped(harness: &mut Harness, shape: Shape) -> ShapedBurst {
        let config = harness.config.shaped.clone();
        ShapedBurst::new(
            Vec3::new(0.0, 2.0, -8.0),
            shape,
            &config,
            &mut harness.rng,
            &mut harness.surface,
        )
    }

    #[test]
    fn rosette_holds_wider_than_heart() {
        let mut harness = Harness::new(31);
        let mut heart = shaped(&mut harness, Shape::Heart);
        let mut rosette = shaped(&mut harness, Shape::Rosette);
        assert_eq!(heart.cloud().len(), rosette.cloud().len());

        let half = harness.config.shaped.lifespan / 2;
        for _ in 0..half {
            heart.update(&mut harness.ctx());
            rosette.update(&mut harness.ctx());
        }

        assert_eq!(heart.cloud().age(), half);
        let heart_spread = heart.cloud().planar_spread();
        let rosette_spread = rosette.cloud().planar_spread();
        assert!(
            rosette_spread > heart_spread * 1.5,
            "rosette {rosette_spread} vs heart {heart_spread}"
        );
    }

    #[test]
    fn particles_are_individually_pink() {
        let mut harness = Harness::new(32);
        for shape in [Shape::Heart, Shape::Rosette] {
            let burst = shaped(&mut harness, shape);
            let colors = burst.cloud().colors().expect("shaped bursts carry colors");
            assert_eq!(colors.len(), burst.cloud().len());
            assert!(colors.iter().all(|c| c.r > c.g && c.b > c.g));
            assert!(colors.windows(2).any(|w| w[0] != w[1]));
        }
    }

    #[test]
    fn rosette_velocities_follow_five_lobes() {
        let mut harness = Harness::new(33);
        let burst = shaped(&mut harness, Shape::Rosette);

        let mut directions: Vec<f32> = burst
            .cloud()
            .velocities()
            .iter()
            .map(|v| (v.y.atan2(v.x) * 100.0).round() / 100.0)
            .collect();
        directions.sort_by(|a, b| a.partial_cmp(b).unwrap());
        directions.dedup();
        assert_eq!(directions.len(), 5);
    }

    #[test]
    fn fade_is_slower_than_cubic() {
        let mut harness = Harness::new(34);
        let mut burst = shaped(&mut harness, Shape::Heart);
        for _ in 0..40 {
            burst.update(&mut harness.ctx());
        }
        let expected = 0.5f32.powf(1.5);
        assert!((burst.cloud().opacity() - expected).abs() < 1e-5);

        for _ in 40..80 {
            burst.update(&mut harness.ctx());
        }
        assert_eq!(burst.cloud().opacity(), 0.0);
        assert!(!burst.is_dead());
        burst.update(&mut harness.ctx());
        assert!(burst.is_dead());
    }

    #[test]
    fn heart_collapses_quickly() {
        let mut harness = Harness::new(35);
        let mut burst = shaped(&mut harness, Shape::Heart);
        for _ in 0..30 {
            burst.update(&mut harness.ctx());
        }
        let planar_speed = burst
            .cloud()
            .velocities()
            .iter()
            .map(|v| v.x.abs())
            .fold(0.0f32, f32::max);
        assert!(planar_speed < 1e-3, "heart still moving at {planar_speed}");
    }
}
