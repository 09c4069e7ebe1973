use std::collections::HashMap;

use glam::Vec3;
use serde::Serialize;

use crate::{assets::Sprite, burst::BurstKind, color::Rgb, Result};

/// Opaque handle to a visual registered with a [`RenderSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VisualKind {
    AscentHead,
    TrailGhost,
    Burst(BurstKind),
}

/// Everything a surface needs to allocate a visual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewVisual {
    pub kind: VisualKind,
    pub position: Vec3,
    pub point_count: usize,
    pub tint: Rgb,
    pub size: f32,
    pub opacity: f32,
}

/// Per-frame state pushed to an existing visual.
///
/// `points` are offsets from `position`; an empty slice means the visual is a
/// single point at `position`.
#[derive(Debug, Clone, Copy)]
pub struct VisualFrame<'a> {
    pub position: Vec3,
    pub points: &'a [Vec3],
    pub colors: Option<&'a [Rgb]>,
    pub opacity: f32,
    pub size: f32,
}

impl<'a> VisualFrame<'a> {
    pub fn point(position: Vec3, opacity: f32, size: f32) -> Self {
        Self {
            position,
            points: &[],
            colors: None,
            opacity,
            size,
        }
    }
}

/// Rendering backend abstraction consumed by the simulation.
pub trait RenderSurface {
    fn add(&mut self, visual: NewVisual) -> VisualHandle;
    fn sync(&mut self, handle: VisualHandle, frame: VisualFrame<'_>);
    fn remove(&mut self, handle: VisualHandle);
}

#[derive(Debug, Clone, Copy)]
struct LiveVisual {
    kind: VisualKind,
    position: Vec3,
    point_count: usize,
    opacity: f32,
    size: f32,
}

/// Running totals kept by [`RenderGraph`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub added: u64,
    pub removed: u64,
    /// Removals or syncs that named a handle no longer alive.
    pub stale_handles: u64,
}

/// Snapshot produced by [`RenderGraph::draw`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameSummary {
    pub heads: usize,
    pub ghosts: usize,
    pub bursts: usize,
    pub points: usize,
    pub peak_opacity: f32,
    pub flat_shaded: bool,
}

/// In-memory render surface. Keeps the latest state of every live visual so
/// a host can draw it, and tracks allocation totals.
#[derive(Debug)]
pub struct RenderGraph {
    sprite: Sprite,
    next_handle: u64,
    visuals: HashMap<VisualHandle, LiveVisual>,
    stats: RenderStats,
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::with_sprite(Sprite::Flat)
    }

    pub fn with_sprite(sprite: Sprite) -> Self {
        Self {
            sprite,
            next_handle: 0,
            visuals: HashMap::new(),
            stats: RenderStats::default(),
        }
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn live_count(&self) -> usize {
        self.visuals.len()
    }

    pub fn live_of_kind(&self, kind: VisualKind) -> usize {
        self.visuals.values().filter(|v| v.kind == kind).count()
    }

    pub fn contains(&self, handle: VisualHandle) -> bool {
        self.visuals.contains_key(&handle)
    }

    pub fn position_of(&self, handle: VisualHandle) -> Option<Vec3> {
        self.visuals.get(&handle).map(|v| v.position)
    }

    pub fn opacity_of(&self, handle: VisualHandle) -> Option<f32> {
        self.visuals.get(&handle).map(|v| v.opacity)
    }

    pub fn size_of(&self, handle: VisualHandle) -> Option<f32> {
        self.visuals.get(&handle).map(|v| v.size)
    }

    /// Summarises the live visuals for one presented frame.
    pub fn draw(&self) -> Result<FrameSummary> {
        let mut summary = FrameSummary {
            flat_shaded: matches!(self.sprite, Sprite::Flat),
            ..Default::default()
        };

        for visual in self.visuals.values() {
            match visual.kind {
                VisualKind::AscentHead => summary.heads += 1,
                VisualKind::TrailGhost => summary.ghosts += 1,
                VisualKind::Burst(_) => summary.bursts += 1,
            }
            summary.points += visual.point_count.max(1);
            summary.peak_opacity = summary.peak_opacity.max(visual.opacity);
        }

        tracing::trace!(?summary, "frame drawn");
        Ok(summary)
    }
}

impl RenderSurface for RenderGraph {
    fn add(&mut self, visual: NewVisual) -> VisualHandle {
        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        self.visuals.insert(
            handle,
            LiveVisual {
                kind: visual.kind,
                position: visual.position,
                point_count: visual.point_count,
                opacity: visual.opacity,
                size: visual.size,
            },
        );
        self.stats.added += 1;
        handle
    }

    fn sync(&mut self, handle: VisualHandle, frame: VisualFrame<'_>) {
        match self.visuals.get_mut(&handle) {
            Some(visual) => {
                visual.position = frame.position;
                visual.opacity = frame.opacity;
                visual.size = frame.size;
            }
            None => self.stats.stale_handles += 1,
        }
    }

    fn remove(&mut self, handle: VisualHandle) {
        if self.visuals.remove(&handle).is_some() {
            self.stats.removed += 1;
        } else {
            tracing::warn!(?handle, "release of a visual that is not alive");
            self.stats.stale_handles += 1;
        }
    }
}
