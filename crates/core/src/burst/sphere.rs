use glam::Vec3;

use super::{fade, CloudMotion, ParticleCloud};
use crate::{
    color::Rgb,
    config::SphereBurstConfig,
    distribution::sphere_velocity,
    registry::{SimEvent, TickContext},
    render::RenderSurface,
    BurstKind, RandomSource,
};

/// One-shot trigger for a sphere's secondary burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondaryFuse {
    armed: bool,
    trigger_tick: u32,
    fired: bool,
}

impl SecondaryFuse {
    pub fn new(armed: bool, trigger_tick: u32) -> Self {
        Self {
            armed,
            trigger_tick,
            fired: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn trigger_tick(&self) -> u32 {
        self.trigger_tick
    }

    /// True exactly once: the first call at the trigger age on an armed fuse.
    fn ignite(&mut self, age: u32) -> bool {
        if self.armed && !self.fired && age == self.trigger_tick {
            self.fired = true;
            true
        } else {
            false
        }
    }
}

/// Radial burst with uniform surface density and a single hue.
#[derive(Debug)]
pub struct SphereBurst {
    cloud: ParticleCloud,
    second_stage: bool,
    fuse: SecondaryFuse,
    flash_ticks: u32,
    flash_size: f32,
    steady_size: f32,
    fade_exponent: f32,
}

impl SphereBurst {
    pub fn new(
        origin: Vec3,
        second_stage: bool,
        config: &SphereBurstConfig,
        rng: &mut RandomSource,
        surface: &mut dyn RenderSurface,
    ) -> Self {
        let velocities = (0..config.particle_count)
            .map(|_| sphere_velocity(rng, config.speed_min, config.speed_max))
            .collect();
        let tint = Rgb::from_hsl(rng.unit(), config.saturation, config.lightness);
        let armed = rng.chance(config.secondary_probability);

        let cloud = ParticleCloud::new(
            BurstKind::Sphere,
            origin,
            velocities,
            None,
            tint,
            CloudMotion {
                drag: config.drag,
                gravity: config.gravity,
                lifespan: config.lifespan,
                size: config.flash_size,
            },
            surface,
        );

        Self {
            cloud,
            second_stage,
            fuse: SecondaryFuse::new(armed, config.secondary_tick),
            flash_ticks: config.flash_ticks,
            flash_size: config.flash_size,
            steady_size: config.size,
            fade_exponent: config.fade_exponent,
        }
    }

    /// Overrides the drawn secondary flag.
    pub fn with_secondary(mut self, armed: bool) -> Self {
        self.fuse = SecondaryFuse::new(armed, self.fuse.trigger_tick);
        self
    }

    pub fn cloud(&self) -> &ParticleCloud {
        &self.cloud
    }

    pub fn is_second_stage(&self) -> bool {
        self.second_stage
    }

    pub fn fuse(&self) -> SecondaryFuse {
        self.fuse
    }

    pub fn update(&mut self, ctx: &mut TickContext<'_>) {
        self.cloud.integrate();

        let age = self.cloud.age();
        if age < self.flash_ticks {
            self.cloud.set_appearance(1.0, self.flash_size);
        } else {
            let opacity = fade(self.cloud.progress(), self.fade_exponent);
            self.cloud.set_appearance(opacity, self.steady_size);
        }

        self.fire_secondary_if_due(ctx);
        self.cloud.sync(ctx.surface);
    }

    /// Spawns the secondary burst when the fuse is due. Calling it again at
    /// the same age is a no-op.
    pub fn fire_secondary_if_due(&mut self, ctx: &mut TickContext<'_>) -> bool {
        if !self.fuse.ignite(self.cloud.age()) {
            return false;
        }

        let origin = self.cloud.origin();
        tracing::debug!(?origin, age = self.cloud.age(), "secondary burst");
        ctx.spawn_sphere(origin, true);
        ctx.emit(SimEvent::SecondaryTriggered { origin });
        true
    }

    pub fn is_dead(&self) -> bool {
        self.cloud.is_dead()
    }

    pub(crate) fn dispose(self, surface: &mut dyn RenderSurface) {
        self.cloud.dispose(surface);
    }
}
