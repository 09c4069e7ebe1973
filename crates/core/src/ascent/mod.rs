//! Rising lights that detonate into a sphere burst when their burn time runs
//! out.

mod trail;

pub use trail::{TrailBuffer, TrailPoint};

use glam::Vec3;

use crate::{
    color::Rgb,
    config::AscentConfig,
    registry::{SimEvent, TickContext},
    render::{RenderSurface, VisualFrame, VisualHandle, VisualKind, NewVisual},
    timeline::Task,
    RandomSource,
};

#[derive(Debug)]
pub struct AscendingBody {
    position: Vec3,
    velocity: Vec3,
    age: u32,
    lifespan: u32,
    gravity: f32,
    head_size: f32,
    ghost_size: f32,
    head: Option<VisualHandle>,
    trail: TrailBuffer,
}

impl AscendingBody {
    /// Creates a body at `origin`, or at a random point of the configured
    /// spawn region when no origin is given.
    pub fn new(
        origin: Option<Vec3>,
        config: &AscentConfig,
        rng: &mut RandomSource,
        surface: &mut dyn RenderSurface,
    ) -> Self {
        let origin = origin.unwrap_or_else(|| rng.point_in(&config.spawn_region));
        let velocity = Vec3::new(
            rng.symmetric(config.lateral_jitter),
            rng.range(config.rise_speed_min, config.rise_speed_max),
            rng.symmetric(config.depth_jitter),
        );
        Self::with_velocity(origin, velocity, config, surface)
    }

    /// Creates a body with a fixed launch velocity.
    pub fn with_velocity(
        origin: Vec3,
        velocity: Vec3,
        config: &AscentConfig,
        surface: &mut dyn RenderSurface,
    ) -> Self {
        let head = surface.add(NewVisual {
            kind: VisualKind::AscentHead,
            position: origin,
            point_count: 1,
            tint: Rgb::WHITE,
            size: config.head_size,
            opacity: 1.0,
        });

        Self {
            position: origin,
            velocity,
            age: 0,
            lifespan: config.lifespan,
            gravity: config.gravity,
            head_size: config.head_size,
            ghost_size: config.ghost_size,
            head: Some(head),
            trail: TrailBuffer::new(config.trail_length, config.trail_opacity),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn lifespan(&self) -> u32 {
        self.lifespan
    }

    pub fn trail(&self) -> &TrailBuffer {
        &self.trail
    }

    pub fn update(&mut self, ctx: &mut TickContext<'_>) {
        if self.is_dead() {
            tracing::warn!(age = self.age, "update after burn-out ignored");
            return;
        }

        self.age += 1;
        self.position += self.velocity;
        self.velocity.y -= self.gravity;

        self.leave_ghost(ctx);
        self.trail.sync(ctx.surface, self.ghost_size);
        if let Some(head) = self.head {
            ctx.surface
                .sync(head, VisualFrame::point(self.position, 1.0, self.head_size));
        }

        if self.age >= self.lifespan {
            self.burn_out(ctx);
        }
    }

    /// Drops a ghost point at the current position. It is removed by the
    /// task queue once it is as old as the trail is long, whether or not this
    /// body is still alive.
    fn leave_ghost(&mut self, ctx: &mut TickContext<'_>) {
        let ghost = ctx.surface.add(NewVisual {
            kind: VisualKind::TrailGhost,
            position: self.position,
            point_count: 1,
            tint: Rgb::WHITE,
            size: self.ghost_size,
            opacity: 0.0,
        });
        let due = ctx.tick + self.trail.capacity() as u64;
        let removal = ctx.tasks.schedule(due, Task::RemoveVisual(ghost));
        self.trail.push(self.position, ghost, removal);
    }

    fn burn_out(&mut self, ctx: &mut TickContext<'_>) {
        tracing::debug!(position = ?self.position, age = self.age, "ascent burned out");
        ctx.spawn_sphere(self.position, false);

        if let Some(head) = self.head.take() {
            ctx.surface.remove(head);
        }
        self.trail.clear();
        ctx.emit(SimEvent::AscentBurnedOut {
            position: self.position,
        });
    }

    pub fn is_dead(&self) -> bool {
        self.age >= self.lifespan
    }

    /// Releases the head and, for a body still in flight, the ghosts in its
    /// ring. Ghosts of a burned-out body are left to their scheduled removal.
    pub(crate) fn dispose(mut self, surface: &mut dyn RenderSurface) {
        if let Some(head) = self.head.take() {
            surface.remove(head);
        }
        self.trail.release(surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::testing::Harness;
    use crate::registry::Entity;

    #[test]
    fn random_origin_stays_in_spawn_region() {
        let mut harness = Harness::new(41);
        let config = harness.config.ascent.clone();
        for _ in 0..100 {
            let body = AscendingBody::new(None, &config, &mut harness.rng, &mut harness.surface);
            let p = body.position();
            assert!(p.cmpge(config.spawn_region.min).all());
            assert!(p.cmplt(config.spawn_region.max).all());

            let v = body.velocity();
            assert!((0.08..0.13).contains(&v.y));
            assert!(v.x.abs() <= 0.01 && v.z.abs() <= 0.005);
        }
    }

    #[test]
    fn explicit_origin_is_used() {
        let mut harness = Harness::new(42);
        let config = harness.config.ascent.clone();
        let origin = Vec3::new(1.0, -2.0, -3.0);
        let body = AscendingBody::new(Some(origin), &config, &mut harness.rng, &mut harness.surface);
        assert_eq!(body.position(), origin);
    }

    #[test]
    fn burns_out_into_exactly_one_sphere() {
        let mut harness = Harness::new(43);
        let config = harness.config.ascent.clone();
        let mut body = AscendingBody::with_velocity(
            Vec3::new(0.0, -2.0, -5.0),
            Vec3::new(0.0, 0.1, 0.0),
            &config,
            &mut harness.surface,
        );

        for tick in 1..50 {
            harness.tick = tick;
            body.update(&mut harness.ctx());
            assert!(!body.is_dead());
            assert!(harness.spawned.is_empty(), "burst before burn-out at {tick}");
        }

        harness.tick = 50;
        body.update(&mut harness.ctx());
        assert!(body.is_dead());
        assert!(body.velocity().y.abs() < 1e-5);
        assert_eq!(harness.spawned.len(), 1);

        match &harness.spawned[0] {
            Entity::Sphere(burst) => {
                assert!(!burst.is_second_stage());
                assert_eq!(burst.cloud().origin(), body.position());
            }
            other => panic!("unexpected spawn {other:?}"),
        }
        assert!(matches!(
            harness.events.last(),
            Some(SimEvent::AscentBurnedOut { .. })
        ));
        assert!(body.trail().is_empty());

        body.update(&mut harness.ctx());
        assert_eq!(harness.spawned.len(), 1);
        assert_eq!(body.age(), 50);
    }

    #[test]
    fn burn_out_releases_head() {
        let mut harness = Harness::new(44);
        harness.config.ascent.lifespan = 3;
        let config = harness.config.ascent.clone();
        let mut body = AscendingBody::new(None, &config, &mut harness.rng, &mut harness.surface);

        for _ in 0..3 {
            body.update(&mut harness.ctx());
        }
        assert_eq!(harness.surface.live_of_kind(VisualKind::AscentHead), 0);

        body.dispose(&mut harness.surface);
        assert_eq!(harness.surface.stats().stale_handles, 0);
    }

    #[test]
    fn dispose_in_flight_cancels_ghost_removals() {
        let mut harness = Harness::new(46);
        let config = harness.config.ascent.clone();
        let mut body = AscendingBody::new(None, &config, &mut harness.rng, &mut harness.surface);

        for tick in 1..=5 {
            harness.tick = tick;
            body.update(&mut harness.ctx());
        }
        assert_eq!(harness.surface.live_of_kind(VisualKind::TrailGhost), 5);
        assert_eq!(harness.tasks.len(), 5);

        body.dispose(&mut harness.surface);
        assert_eq!(harness.surface.live_count(), 0);
        assert!(harness.tasks.is_empty());
        assert!(harness.tasks.drain_all().is_empty());
        assert_eq!(harness.surface.stats().stale_handles, 0);
    }

    #[test]
    fn trail_follows_the_head() {
        let mut harness = Harness::new(45);
        let config = harness.config.ascent.clone();
        let mut body = AscendingBody::with_velocity(
            Vec3::ZERO,
            Vec3::new(0.0, 0.1, 0.0),
            &config,
            &mut harness.surface,
        );

        for _ in 0..20 {
            body.update(&mut harness.ctx());
        }
        let trail = body.trail();
        assert_eq!(trail.len(), 12);
        let newest = trail.iter().next().unwrap();
        assert_eq!(newest.position, body.position());
        assert!((newest.opacity - 0.8).abs() < 1e-6);
        let heights: Vec<f32> = trail.iter().map(|p| p.position.y).collect();
        assert!(heights.windows(2).all(|w| w[0] > w[1]));
    }
}
