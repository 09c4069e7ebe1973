//! Particle bursts: a fixed set of points sharing one origin, one color law
//! and one decay law.

mod shaped;
mod sphere;

pub use shaped::{Shape, ShapedBurst};
pub use sphere::{SecondaryFuse, SphereBurst};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    color::Rgb,
    render::{RenderSurface, VisualFrame, VisualHandle, VisualKind, NewVisual},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BurstKind {
    Sphere,
    Heart,
    Rosette,
}

/// Per-particle arrays plus the shared motion and decay state of a burst.
///
/// Positions are offsets from `origin`. The arrays are sized once and never
/// resized.
#[derive(Debug)]
pub struct ParticleCloud {
    kind: BurstKind,
    origin: Vec3,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    colors: Option<Vec<Rgb>>,
    drag: f32,
    gravity: Vec3,
    age: u32,
    lifespan: u32,
    opacity: f32,
    size: f32,
    handle: VisualHandle,
}

impl ParticleCloud {
    pub(crate) fn new(
        kind: BurstKind,
        origin: Vec3,
        velocities: Vec<Vec3>,
        colors: Option<Vec<Rgb>>,
        tint: Rgb,
        motion: CloudMotion,
        surface: &mut dyn RenderSurface,
    ) -> Self {
        let positions = vec![Vec3::ZERO; velocities.len()];
        let handle = surface.add(NewVisual {
            kind: VisualKind::Burst(kind),
            position: origin,
            point_count: velocities.len(),
            tint,
            size: motion.size,
            opacity: 1.0,
        });

        Self {
            kind,
            origin,
            positions,
            velocities,
            colors,
            drag: motion.drag,
            gravity: Vec3::new(0.0, -motion.gravity, 0.0),
            age: 0,
            lifespan: motion.lifespan,
            opacity: 1.0,
            size: motion.size,
            handle,
        }
    }

    pub fn kind(&self) -> BurstKind {
        self.kind
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn lifespan(&self) -> u32 {
        self.lifespan
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn colors(&self) -> Option<&[Rgb]> {
        self.colors.as_deref()
    }

    pub fn handle(&self) -> VisualHandle {
        self.handle
    }

    /// Fraction of the lifespan consumed so far.
    pub fn progress(&self) -> f32 {
        self.age as f32 / self.lifespan.max(1) as f32
    }

    pub fn is_dead(&self) -> bool {
        self.age > self.lifespan
    }

    /// Mean distance of the particles from their centroid in the image plane.
    pub fn planar_spread(&self) -> f32 {
        if self.positions.is_empty() {
            return 0.0;
        }
        let count = self.positions.len() as f32;
        let centroid = self.positions.iter().copied().sum::<Vec3>() / count;
        self.positions
            .iter()
            .map(|p| (*p - centroid).truncate().length())
            .sum::<f32>()
            / count
    }

    /// Advances the age and integrates every particle by one tick.
    pub(crate) fn integrate(&mut self) {
        self.age += 1;
        for (position, velocity) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            *velocity = *velocity * self.drag + self.gravity;
            *position += *velocity;
        }
    }

    pub(crate) fn set_appearance(&mut self, opacity: f32, size: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.size = size.max(0.0);
    }

    pub(crate) fn sync(&self, surface: &mut dyn RenderSurface) {
        surface.sync(
            self.handle,
            VisualFrame {
                position: self.origin,
                points: &self.positions,
                colors: self.colors.as_deref(),
                opacity: self.opacity,
                size: self.size,
            },
        );
    }

    /// Releases the render handle. Consuming `self` keeps this single-shot.
    pub(crate) fn dispose(self, surface: &mut dyn RenderSurface) {
        surface.remove(self.handle);
    }
}

/// Shared motion and lifetime parameters of a new cloud.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CloudMotion {
    pub drag: f32,
    pub gravity: f32,
    pub lifespan: u32,
    pub size: f32,
}

/// `(1 - progress)^exponent`, clamped to `[0, 1]`.
pub fn fade(progress: f32, exponent: f32) -> f32 {
    (1.0 - progress).clamp(0.0, 1.0).powf(exponent)
}
