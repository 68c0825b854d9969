//! Track - Straight-line course shared by every actor
//!
//! The track never changes after startup; lanes are spread laterally
//! along the z axis around the centerline.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Straight course from `start` to `end`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub start: Vec3,
    pub end: Vec3,
    /// Lateral width shared by all lanes
    pub width: f32,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            start: Vec3::new(-200.0, 0.0, 0.0),
            end: Vec3::new(200.0, 0.0, 0.0),
            width: 25.0,
        }
    }
}

impl Track {
    /// Unit direction of travel
    pub fn direction(&self) -> Vec3 {
        (self.end - self.start).normalize_or_zero()
    }

    /// Index of the axis (0 = x, 1 = y, 2 = z) the track mostly runs along
    pub fn primary_axis(&self) -> usize {
        let span = (self.end - self.start).abs();
        if span.x >= span.y && span.x >= span.z {
            0
        } else if span.y >= span.z {
            1
        } else {
            2
        }
    }

    /// Whether `position` has reached or passed the end on the primary axis
    pub fn has_arrived(&self, position: Vec3) -> bool {
        let axis = self.primary_axis();
        let heading = (self.end[axis] - self.start[axis]).signum();
        (position[axis] - self.end[axis]) * heading >= 0.0
    }

    /// Lateral offset of lane `index` when `count` lanes share the track
    pub fn lateral_offset(&self, index: usize, count: usize) -> f32 {
        let spacing = self.width / (count as f32 + 1.0);
        (index as f32 + 1.0) * spacing - self.width / 2.0
    }

    /// Starting position of lane `index`
    pub fn lane_start(&self, index: usize, count: usize) -> Vec3 {
        self.start + Vec3::new(0.0, 0.0, self.lateral_offset(index, count))
    }

    pub fn is_degenerate(&self) -> bool {
        self.start.distance_squared(self.end) <= f32::EPSILON
    }
}
