//! Camera rig following the lead actor
//!
//! Orbit input is handled by the renderer; the rig only pins the camera
//! alongside actor 0 and aims it at that actor.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Camera settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub initial_position: Vec3,
    /// Distance kept ahead of actor 0 on the track's primary axis
    pub follow_offset: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            initial_position: Vec3::new(-200.0, 10.0, 20.0),
            follow_offset: 20.0,
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Current camera placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    pub position: Vec3,
    pub target: Vec3,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    #[serde(skip)]
    follow_offset: f32,
}

impl CameraRig {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            position: config.initial_position,
            target: Vec3::ZERO,
            fov: config.fov,
            near: config.near,
            far: config.far,
            follow_offset: config.follow_offset,
        }
    }

    /// Track `subject` along `axis`, leaving the other coordinates alone
    pub fn follow(&mut self, subject: Vec3, axis: usize) {
        self.position[axis] = subject[axis] + self.follow_offset;
        self.target = subject;
    }
}
