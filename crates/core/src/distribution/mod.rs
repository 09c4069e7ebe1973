//! Stateless sampling of burst directions, speeds and shape curves.
//!
//! Every function draws from the [`RandomSource`] it is handed and keeps no
//! state between calls.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use crate::RandomSource;

/// Unit vector distributed uniformly over the sphere surface.
///
/// The polar angle is drawn through `acos(2u - 1)` so that density does not
/// bunch up at the poles.
pub fn sphere_direction(rng: &mut RandomSource) -> Vec3 {
    let theta = rng.range(0.0, TAU);
    let phi = (2.0 * rng.unit() - 1.0).clamp(-1.0, 1.0).acos();
    Vec3::new(
        phi.sin() * theta.cos(),
        phi.sin() * theta.sin(),
        phi.cos(),
    )
}

/// Isotropic velocity with speed in `[speed_min, speed_max)`.
pub fn sphere_velocity(rng: &mut RandomSource, speed_min: f32, speed_max: f32) -> Vec3 {
    let speed = rng.range(speed_min, speed_max);
    sphere_direction(rng) * speed
}

/// Point on the classic heart curve at parameter `t`, scaled to 0.8 of the
/// textbook coefficients.
pub fn heart_curve(t: f32) -> Vec2 {
    let x = 11.2 * t.sin().powi(3);
    let y = 8.8 * t.cos() - 3.2 * (2.0 * t).cos() - 1.28 * (3.0 * t).cos() - 0.64 * (4.0 * t).cos();
    Vec2::new(x, y)
}

/// Heart curve sample at a uniformly drawn parameter.
pub fn heart_point(rng: &mut RandomSource) -> Vec2 {
    heart_curve(rng.range(0.0, TAU))
}

/// Point on one of `lobes` evenly spaced spokes at a jittered radius.
pub fn rosette_point(rng: &mut RandomSource, lobes: u32, radius_min: f32, radius_max: f32) -> Vec2 {
    let lobe = rng.index(lobes);
    let angle = lobe as f32 * TAU / lobes.max(1) as f32;
    let radius = rng.range(radius_min, radius_max);
    Vec2::from_angle(angle) * radius
}

/// Burst-wide tilt in `[-max_tilt, max_tilt)` radians.
pub fn tilt_angle(rng: &mut RandomSource, max_tilt: f32) -> f32 {
    rng.symmetric(max_tilt)
}

/// Rotates `point` counter-clockwise by `angle` radians.
pub fn rotate(point: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(point)
}
