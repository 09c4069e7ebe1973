use std::{f32::consts::PI, path::Path};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{HanabiError, Result};

/// Top-level configuration structure for the engine.
///
/// Every section falls back to its reference defaults, so a JSON file only
/// needs to name the values it wants to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed seed for the random source. `None` seeds from entropy.
    pub seed: Option<u64>,
    pub launcher: LauncherConfig,
    pub ascent: AscentConfig,
    pub sphere: SphereBurstConfig,
    pub shaped: ShapedBurstConfig,
    pub audio: AudioConfig,
    pub render: RenderConfig,
}

impl EngineConfig {
    /// Reads a JSON configuration file and validates it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.launcher.validate()?;
        self.ascent.validate()?;
        self.sphere.validate()?;
        self.shaped.validate()?;
        self.render.validate()
    }
}

/// Axis-aligned box that spawn positions are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRegion {
    pub min: Vec3,
    pub max: Vec3,
}

impl SpawnRegion {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.min.cmpgt(self.max).any() {
            return Err(HanabiError::invalid_config(format!(
                "{name}: region min {} exceeds max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Scheduling policy for the main and background launch paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub main_interval_ms: u64,
    /// Cap on live entities descending from the main scheduler.
    pub max_main: usize,
    pub main_batch_min: u32,
    pub main_batch_max: u32,
    pub main_region: SpawnRegion,
    pub background_interval_ms: u64,
    pub background_probability: f64,
    pub background_batch_min: u32,
    pub background_batch_max: u32,
    /// Optional cap on live background bursts. Unbounded when `None`.
    pub max_background: Option<usize>,
    pub background_region: SpawnRegion,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            main_interval_ms: 1500,
            max_main: 24,
            main_batch_min: 2,
            main_batch_max: 4,
            main_region: SpawnRegion::new(Vec3::new(-3.0, -3.0, -6.0), Vec3::new(3.0, -1.0, 0.0)),
            background_interval_ms: 1000,
            background_probability: 0.6,
            background_batch_min: 2,
            background_batch_max: 4,
            max_background: None,
            background_region: SpawnRegion::new(
                Vec3::new(-3.0, -1.0, -10.0),
                Vec3::new(3.0, 5.0, -6.0),
            ),
        }
    }
}

impl LauncherConfig {
    fn validate(&self) -> Result<()> {
        if self.main_interval_ms == 0 || self.background_interval_ms == 0 {
            return Err(HanabiError::invalid_config(
                "launcher intervals must be non-zero",
            ));
        }
        if self.main_batch_min > self.main_batch_max
            || self.background_batch_min > self.background_batch_max
        {
            return Err(HanabiError::invalid_config(
                "launcher batch minimum exceeds maximum",
            ));
        }
        check_probability("launcher.background_probability", self.background_probability)?;
        self.main_region.validate("launcher.main_region")?;
        self.background_region.validate("launcher.background_region")
    }
}

/// Ascending body tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AscentConfig {
    /// Burn time in ticks.
    pub lifespan: u32,
    /// Subtracted from vertical velocity every tick.
    pub gravity: f32,
    /// Used when a body is created without an explicit origin.
    pub spawn_region: SpawnRegion,
    pub rise_speed_min: f32,
    pub rise_speed_max: f32,
    /// Half-width of the horizontal velocity jitter.
    pub lateral_jitter: f32,
    /// Half-width of the depth velocity jitter.
    pub depth_jitter: f32,
    pub trail_length: usize,
    /// Opacity of the newest ghost point.
    pub trail_opacity: f32,
    pub head_size: f32,
    pub ghost_size: f32,
}

impl Default for AscentConfig {
    fn default() -> Self {
        Self {
            lifespan: 50,
            gravity: 0.002,
            spawn_region: SpawnRegion::new(Vec3::new(-3.0, -2.5, -4.5), Vec3::new(3.0, 0.0, -3.5)),
            rise_speed_min: 0.08,
            rise_speed_max: 0.13,
            lateral_jitter: 0.01,
            depth_jitter: 0.005,
            trail_length: 12,
            trail_opacity: 0.8,
            head_size: 0.18,
            ghost_size: 0.06,
        }
    }
}

impl AscentConfig {
    fn validate(&self) -> Result<()> {
        if self.lifespan == 0 {
            return Err(HanabiError::invalid_config("ascent.lifespan must be non-zero"));
        }
        if self.trail_length == 0 {
            return Err(HanabiError::invalid_config(
                "ascent.trail_length must be non-zero",
            ));
        }
        check_range("ascent rise speed", self.rise_speed_min, self.rise_speed_max)?;
        self.spawn_region.validate("ascent.spawn_region")
    }
}

/// Radial sphere burst tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereBurstConfig {
    pub particle_count: usize,
    pub lifespan: u32,
    pub speed_min: f32,
    pub speed_max: f32,
    /// Velocity multiplier applied every tick.
    pub drag: f32,
    pub gravity: f32,
    /// Ticks during which the burst holds full opacity and the larger size.
    pub flash_ticks: u32,
    pub flash_size: f32,
    pub size: f32,
    pub fade_exponent: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub secondary_probability: f64,
    /// Age at which a pending secondary burst fires.
    pub secondary_tick: u32,
}

impl Default for SphereBurstConfig {
    fn default() -> Self {
        Self {
            particle_count: 700,
            lifespan: 90,
            speed_min: 0.04,
            speed_max: 0.13,
            drag: 0.983,
            gravity: 0.002,
            flash_ticks: 10,
            flash_size: 0.10,
            size: 0.085,
            fade_exponent: 3.0,
            saturation: 1.0,
            lightness: 0.55,
            secondary_probability: 0.4,
            secondary_tick: 30,
        }
    }
}

impl SphereBurstConfig {
    fn validate(&self) -> Result<()> {
        if self.lifespan == 0 {
            return Err(HanabiError::invalid_config("sphere.lifespan must be non-zero"));
        }
        if self.secondary_tick == 0 {
            return Err(HanabiError::invalid_config(
                "sphere.secondary_tick must be non-zero",
            ));
        }
        check_range("sphere speed", self.speed_min, self.speed_max)?;
        check_drag("sphere.drag", self.drag)?;
        check_probability("sphere.secondary_probability", self.secondary_probability)
    }
}

/// Heart and rosette burst tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapedBurstConfig {
    pub particle_count: usize,
    pub lifespan: u32,
    pub gravity: f32,
    pub fade_exponent: f32,
    /// Half-width of the shared tilt applied to the whole burst.
    pub max_tilt: f32,
    pub depth_jitter: f32,
    pub heart_drag: f32,
    pub heart_velocity_scale: f32,
    pub heart_size: f32,
    pub rosette_drag: f32,
    pub rosette_velocity_scale: f32,
    pub rosette_size: f32,
    pub rosette_lobes: u32,
    pub rosette_radius_min: f32,
    pub rosette_radius_max: f32,
}

impl Default for ShapedBurstConfig {
    fn default() -> Self {
        Self {
            particle_count: 500,
            lifespan: 80,
            gravity: 0.0015,
            fade_exponent: 1.5,
            max_tilt: PI / 12.0,
            depth_jitter: 0.01,
            heart_drag: 0.80,
            heart_velocity_scale: 0.020,
            heart_size: 0.17,
            rosette_drag: 0.99,
            rosette_velocity_scale: 0.14,
            rosette_size: 0.20,
            rosette_lobes: 5,
            rosette_radius_min: 0.35,
            rosette_radius_max: 0.45,
        }
    }
}

impl ShapedBurstConfig {
    fn validate(&self) -> Result<()> {
        if self.lifespan == 0 {
            return Err(HanabiError::invalid_config("shaped.lifespan must be non-zero"));
        }
        if self.rosette_lobes == 0 {
            return Err(HanabiError::invalid_config(
                "shaped.rosette_lobes must be non-zero",
            ));
        }
        if !(0.0..=PI / 6.0).contains(&self.max_tilt) {
            return Err(HanabiError::invalid_config(
                "shaped.max_tilt must lie within 30 degrees",
            ));
        }
        check_range(
            "rosette radius",
            self.rosette_radius_min,
            self.rosette_radius_max,
        )?;
        check_drag("shaped.heart_drag", self.heart_drag)?;
        check_drag("shaped.rosette_drag", self.rosette_drag)
    }
}

/// Sound cue sources. Missing files only disable the matching cue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            primary: Some("sounds/firework.mp3".to_string()),
            secondary: Some("sounds/firework2.mp3".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Glow sprite applied to every point. Falls back to flat color.
    pub glow_texture: Option<String>,
    pub frame_rate: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            glow_texture: Some("textures/glow.png".to_string()),
            frame_rate: 60,
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.frame_rate == 0 {
            return Err(HanabiError::invalid_config("render.frame_rate must be non-zero"));
        }
        Ok(())
    }

    /// Duration of one frame in milliseconds.
    pub fn frame_millis(&self) -> f64 {
        1000.0 / self.frame_rate as f64
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(HanabiError::invalid_config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

fn check_drag(name: &str, value: f32) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(HanabiError::invalid_config(format!(
            "{name} must be within (0, 1], got {value}"
        )))
    }
}

fn check_range(name: &str, min: f32, max: f32) -> Result<()> {
    if min < max {
        Ok(())
    } else {
        Err(HanabiError::invalid_config(format!(
            "{name} range is empty: {min}..{max}"
        )))
    }
}
