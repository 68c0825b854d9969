//! Actor - Individual horse state and per-frame motion
//!
//! Each actor has a position on the track, a base speed rolled once at
//! creation, and an optional animation handle bound to the gallop clip.
//! The race updates every actor that has a handle each active frame.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::race_server::track::Track;

/// Playback state of one animation clip instance
///
/// The renderer owns the skinned mesh and blending; this only keeps the
/// clip clock so every frame tells the renderer which pose to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationHandle {
    /// Clip name as found in the model
    pub clip: String,
    /// Clip length in seconds (0 when unknown)
    pub duration: f32,
    /// Current clip time in seconds
    pub time: f32,
    /// Multiplier applied to the frame delta
    pub time_scale: f32,
    pub playing: bool,
    pub paused: bool,
}

impl AnimationHandle {
    pub fn new(clip: impl Into<String>, duration: f32, time_scale: f32) -> Self {
        Self {
            clip: clip.into(),
            duration,
            time: 0.0,
            time_scale,
            playing: false,
            paused: false,
        }
    }

    /// Start playback; an already playing clip keeps its time
    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_running(&self) -> bool {
        self.playing && !self.paused
    }

    /// Advance the clip clock, looping over the clip duration
    pub fn update(&mut self, delta: f32) {
        if !self.is_running() {
            return;
        }
        self.time += delta * self.time_scale;
        if self.duration > 0.0 {
            self.time %= self.duration;
        }
    }
}

/// Actor state flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorFlags {
    /// Reached the track end and waits for the next start
    pub finished: bool,
}

/// Complete state for a single actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// Lane index, also the spawn order
    pub id: u32,
    pub position: Vec3,
    /// Rotation about the vertical axis in radians
    pub yaw: f32,
    /// Uniform model scale
    pub scale: f32,
    /// Base speed in units per second
    pub speed: f32,
    /// Time spent running since the last reset
    pub elapsed_time: f32,
    pub animation: Option<AnimationHandle>,
    pub flags: ActorFlags,
}

impl Actor {
    pub fn new(id: u32, position: Vec3, speed: f32, yaw: f32, scale: f32) -> Self {
        Self {
            id,
            position,
            yaw,
            scale,
            speed,
            elapsed_time: 0.0,
            animation: None,
            flags: ActorFlags::default(),
        }
    }

    /// Attach a clip that is started and immediately paused
    pub fn with_animation(mut self, mut handle: AnimationHandle) -> Self {
        handle.play();
        handle.set_paused(true);
        self.animation = Some(handle);
        self
    }

    /// Whether the frame step should move this actor
    pub fn is_active(&self) -> bool {
        self.animation.is_some() && !self.flags.finished
    }

    /// Send the actor back to `start` and idle it until the next race start
    pub fn retire(&mut self, start: Vec3) {
        self.position = start;
        self.elapsed_time = 0.0;
        self.flags.finished = true;
        if let Some(handle) = &mut self.animation {
            handle.set_paused(true);
        }
    }

    /// Wake the actor for a (re)started race
    pub fn release(&mut self) {
        self.flags.finished = false;
        if let Some(handle) = &mut self.animation {
            handle.set_paused(false);
            handle.play();
        }
    }
}

/// What a single motion step did to an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    Arrived,
}

/// Per-frame motion parameters
#[derive(Debug, Clone, Copy)]
pub struct Gait {
    /// Peak-to-peak width of the per-frame speed jitter
    pub noise_amplitude: f32,
    /// Heading forced onto every moving actor
    pub race_yaw: f32,
}

impl Gait {
    /// Advance one actor by `delta` seconds along `track`
    pub fn step<R: Rng + ?Sized>(
        &self,
        actor: &mut Actor,
        track: &Track,
        delta: f32,
        rng: &mut R,
    ) -> StepOutcome {
        if let Some(handle) = &mut actor.animation {
            handle.update(delta);
        }

        let noise = (rng.gen::<f32>() - 0.5) * self.noise_amplitude;
        let effective_speed = actor.speed + noise;

        actor.position += track.direction() * effective_speed * delta;
        actor.yaw = self.race_yaw;

        if track.has_arrived(actor.position) {
            actor.retire(track.start);
            StepOutcome::Arrived
        } else {
            actor.elapsed_time += delta;
            StepOutcome::Moved
        }
    }
}

/// Compact actor state for IPC transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub id: u32,
    pub position: Vec3,
    pub yaw: f32,
    pub scale: f32,
    pub elapsed_time: f32,
    pub animation: Option<AnimationHandle>,
    pub finished: bool,
}

impl From<&Actor> for ActorSnapshot {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.id,
            position: actor.position,
            yaw: actor.yaw,
            scale: actor.scale,
            elapsed_time: actor.elapsed_time,
            animation: actor.animation.clone(),
            finished: actor.flags.finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::FRAC_PI_2;

    fn gait() -> Gait {
        Gait {
            noise_amplitude: 0.4,
            race_yaw: -FRAC_PI_2,
        }
    }

    fn running_actor(x: f32) -> Actor {
        let mut actor = Actor::new(0, Vec3::new(x, 0.0, 2.0), 15.5, FRAC_PI_2, 0.6)
            .with_animation(AnimationHandle::new("Gallop", 1.0, 3.0));
        actor.release();
        actor
    }

    #[test]
    fn new_handle_is_started_then_paused() {
        let actor = Actor::new(0, Vec3::ZERO, 15.0, 0.0, 1.0)
            .with_animation(AnimationHandle::new("Gallop", 1.0, 3.0));
        let handle = actor.animation.as_ref().unwrap();
        assert!(handle.playing);
        assert!(handle.paused);
        assert!(!handle.is_running());
    }

    #[test]
    fn paused_handle_keeps_its_time() {
        let mut handle = AnimationHandle::new("Gallop", 2.0, 3.0);
        handle.play();
        handle.update(0.1);
        let frozen = handle.time;
        handle.set_paused(true);
        handle.update(0.5);
        assert_eq!(handle.time, frozen);
    }

    #[test]
    fn handle_time_scales_and_loops() {
        let mut handle = AnimationHandle::new("Gallop", 1.0, 3.0);
        handle.play();
        handle.update(0.1);
        assert_relative_eq!(handle.time, 0.3, epsilon = 1e-6);
        handle.update(0.3);
        assert_relative_eq!(handle.time, 0.2, epsilon = 1e-5);
    }

    #[test]
    fn unknown_duration_never_wraps() {
        let mut handle = AnimationHandle::new("Gallop", 0.0, 1.0);
        handle.play();
        handle.update(5.0);
        assert_relative_eq!(handle.time, 5.0);
    }

    #[test]
    fn step_moves_forward_within_noise_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let track = Track::default();
        let mut actor = running_actor(-200.0);

        let outcome = gait().step(&mut actor, &track, 0.1, &mut rng);

        assert_eq!(outcome, StepOutcome::Moved);
        let travelled = actor.position.x + 200.0;
        assert!(travelled >= (15.5 - 0.2) * 0.1 - 1e-3);
        assert!(travelled < (15.5 + 0.2) * 0.1 + 1e-3);
        assert_eq!(actor.position.z, 2.0);
        assert_eq!(actor.yaw, -FRAC_PI_2);
        assert_relative_eq!(actor.elapsed_time, 0.1);
        assert_relative_eq!(actor.animation.as_ref().unwrap().time, 0.3, epsilon = 1e-6);
    }

    #[test]
    fn step_past_end_retires_actor_at_start() {
        let mut rng = StdRng::seed_from_u64(3);
        let track = Track::default();
        let mut actor = running_actor(199.5);
        actor.elapsed_time = 25.0;

        let outcome = gait().step(&mut actor, &track, 0.1, &mut rng);

        assert_eq!(outcome, StepOutcome::Arrived);
        assert_eq!(actor.position, track.start);
        assert_eq!(actor.elapsed_time, 0.0);
        assert!(actor.flags.finished);
        assert!(actor.animation.as_ref().unwrap().paused);
        assert!(!actor.is_active());
    }

    #[test]
    fn release_wakes_a_finished_actor() {
        let mut actor = running_actor(0.0);
        actor.retire(Vec3::ZERO);
        actor.release();
        assert!(actor.is_active());
        assert!(actor.animation.as_ref().unwrap().is_running());
    }

    #[test]
    fn actor_without_clip_is_never_active() {
        let actor = Actor::new(1, Vec3::ZERO, 15.0, 0.0, 0.6);
        assert!(!actor.is_active());
    }
}
