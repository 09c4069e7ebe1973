use std::collections::VecDeque;

use glam::Vec3;

use crate::{
    render::{RenderSurface, VisualFrame, VisualHandle},
    timeline::CancellationToken,
};

#[derive(Debug, Clone)]
pub struct TrailPoint {
    pub position: Vec3,
    pub opacity: f32,
    pub handle: VisualHandle,
    /// Cancels the queued removal of `handle`.
    pub removal: CancellationToken,
}

/// Ring of the most recent positions of an ascending body, newest first.
///
/// The ring only tracks ghost points. Their removal from the surface is
/// scheduled independently, so clearing the ring never releases visuals;
/// [`TrailBuffer::release`] does, and cancels the scheduled removals.
#[derive(Debug, Clone)]
pub struct TrailBuffer {
    points: VecDeque<TrailPoint>,
    capacity: usize,
    peak_opacity: f32,
}

impl TrailBuffer {
    pub fn new(capacity: usize, peak_opacity: f32) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
            peak_opacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Newest point first.
    pub fn iter(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    /// Records a new head position and returns the entry that fell off the
    /// end once the ring is full.
    pub fn push(
        &mut self,
        position: Vec3,
        handle: VisualHandle,
        removal: CancellationToken,
    ) -> Option<TrailPoint> {
        let evicted = if self.points.len() == self.capacity {
            self.points.pop_back()
        } else {
            None
        };

        self.points.push_front(TrailPoint {
            position,
            opacity: self.peak_opacity,
            handle,
            removal,
        });
        self.recompute_opacity();
        evicted
    }

    /// Opacity falls linearly with recency: `(1 - i / N) * peak`.
    fn recompute_opacity(&mut self) {
        let capacity = self.capacity as f32;
        for (i, point) in self.points.iter_mut().enumerate() {
            point.opacity = ((1.0 - i as f32 / capacity) * self.peak_opacity).clamp(0.0, 1.0);
        }
    }

    pub fn sync(&self, surface: &mut dyn RenderSurface, size: f32) {
        for point in &self.points {
            surface.sync(
                point.handle,
                VisualFrame::point(point.position, point.opacity, size),
            );
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Removes every ghost still in the ring from the surface now.
    pub fn release(&mut self, surface: &mut dyn RenderSurface) {
        for point in self.points.drain(..) {
            point.removal.cancel();
            surface.remove(point.handle);
        }
    }
}
