//! Race - Race configuration and state management
//!
//! Handles actor spawning, start/pause transitions, per-frame motion and
//! arrival detection.

use std::f32::consts::FRAC_PI_2;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::race_server::actor::{Actor, ActorSnapshot, AnimationHandle, Gait, StepOutcome};
use crate::race_server::assets::{AssetKind, AssetPaths, ModelSummary};
use crate::race_server::camera::{CameraConfig, CameraRig};
use crate::race_server::input::KeyBindings;
use crate::race_server::track::Track;

/// Race configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Number of horses
    pub actor_count: u32,
    pub track: Track,
    /// Lowest base speed an actor can roll
    pub base_speed_min: f32,
    /// Width of the base speed range above the minimum
    pub base_speed_range: f32,
    /// Peak-to-peak per-frame speed jitter
    pub noise_amplitude: f32,
    /// Uniform scale applied to every horse model
    pub actor_scale: f32,
    /// Heading of freshly spawned horses (radians)
    pub start_yaw: f32,
    /// Heading forced while racing (radians)
    pub race_yaw: f32,
    /// Playback rate of the gallop clip
    pub animation_time_scale: f32,
    pub camera: CameraConfig,
    pub assets: AssetPaths,
    pub keys: KeyBindings,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            actor_count: 10,
            track: Track::default(),
            base_speed_min: 15.0,
            base_speed_range: 1.0,
            noise_amplitude: 0.4,
            actor_scale: 0.6,
            start_yaw: FRAC_PI_2,
            race_yaw: -FRAC_PI_2,
            animation_time_scale: 3.0,
            camera: CameraConfig::default(),
            assets: AssetPaths::default(),
            keys: KeyBindings::default(),
        }
    }
}

/// Invalid race configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("a race needs at least one actor")]
    NoActors,
    #[error("track start and end coincide")]
    DegenerateTrack,
    #[error("track width must be positive, got {0}")]
    TrackWidth(f32),
    #[error("actor scale must be positive, got {0}")]
    ActorScale(f32),
    #[error("base speed must stay above the jitter, got {min} with noise {noise}")]
    BaseSpeed { min: f32, noise: f32 },
}

impl RaceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actor_count == 0 {
            return Err(ConfigError::NoActors);
        }
        if self.track.is_degenerate() {
            return Err(ConfigError::DegenerateTrack);
        }
        if self.track.width <= 0.0 {
            return Err(ConfigError::TrackWidth(self.track.width));
        }
        if self.actor_scale <= 0.0 {
            return Err(ConfigError::ActorScale(self.actor_scale));
        }
        if self.base_speed_min - self.noise_amplitude / 2.0 <= 0.0 {
            return Err(ConfigError::BaseSpeed {
                min: self.base_speed_min,
                noise: self.noise_amplitude,
            });
        }
        Ok(())
    }

    fn gait(&self) -> Gait {
        Gait {
            noise_amplitude: self.noise_amplitude,
            race_yaw: self.race_yaw,
        }
    }
}

/// Global race flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceFlags {
    pub started: bool,
    pub paused: bool,
}

/// Coarse race phase for the frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    Loading,
    Ready,
    Racing,
    Paused,
}

/// One track-end arrival
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrival {
    pub actor_id: u32,
    /// Active race time at the arrival frame
    pub race_time: f32,
    /// 1-based arrival order
    pub order: u32,
}

/// Complete race state
#[derive(Debug, Clone)]
pub struct Race {
    pub config: RaceConfig,
    pub flags: RaceFlags,
    /// Empty until the character model has loaded
    pub actors: Vec<Actor>,
    pub camera: CameraRig,
    pub character_model: Option<ModelSummary>,
    pub track_model: Option<ModelSummary>,
    /// Sum of the deltas of all active frames
    pub race_time: f32,
    pub arrivals: Vec<Arrival>,
}

impl Race {
    pub fn new(config: RaceConfig) -> Self {
        let camera = CameraRig::new(&config.camera);
        Self {
            config,
            flags: RaceFlags::default(),
            actors: Vec::new(),
            camera,
            character_model: None,
            track_model: None,
            race_time: 0.0,
            arrivals: Vec::new(),
        }
    }

    /// Clone the character model into one actor per lane
    pub fn spawn_actors<R: Rng + ?Sized>(&mut self, model: ModelSummary, rng: &mut R) {
        if !self.actors.is_empty() {
            log::warn!("Character model delivered twice, keeping existing actors");
            return;
        }

        let count = self.config.actor_count as usize;
        let clip = model.first_clip().cloned();

        for i in 0..count {
            let speed = self.config.base_speed_min + rng.gen::<f32>() * self.config.base_speed_range;
            let actor = Actor::new(
                i as u32,
                self.config.track.lane_start(i, count),
                speed,
                self.config.start_yaw,
                self.config.actor_scale,
            );
            let actor = match &clip {
                Some(clip) => actor.with_animation(AnimationHandle::new(
                    clip.name.clone(),
                    clip.duration,
                    self.config.animation_time_scale,
                )),
                None => actor,
            };
            self.actors.push(actor);
        }

        if clip.is_none() {
            log::warn!("{} has no animation clips, horses will stay still", model.path.display());
        }
        self.character_model = Some(model);
    }

    /// Register the static course model
    pub fn register_track(&mut self, model: ModelSummary) {
        self.track_model = Some(model);
    }

    /// Start (or restart) the race, waking every actor
    pub fn start(&mut self) {
        self.flags.started = true;
        for actor in &mut self.actors {
            actor.release();
        }
    }

    /// Flip the pause flag and apply it to every actor's clip
    ///
    /// Finished actors stay at the start regardless; only `start` moves them.
    pub fn toggle_pause(&mut self) -> bool {
        self.flags.paused = !self.flags.paused;
        let paused = self.flags.paused;
        for actor in &mut self.actors {
            if let Some(handle) = &mut actor.animation {
                handle.set_paused(paused);
            }
        }
        paused
    }

    pub fn is_running(&self) -> bool {
        self.flags.started && !self.flags.paused
    }

    pub fn phase(&self) -> RacePhase {
        if self.actors.is_empty() {
            RacePhase::Loading
        } else if !self.flags.started {
            RacePhase::Ready
        } else if self.flags.paused {
            RacePhase::Paused
        } else {
            RacePhase::Racing
        }
    }

    /// Update race state
    pub fn update<R: Rng + ?Sized>(&mut self, delta: f32, rng: &mut R) {
        if !self.is_running() {
            return;
        }

        self.race_time += delta;
        let gait = self.config.gait();
        let track = self.config.track;
        let axis = track.primary_axis();

        for actor in &mut self.actors {
            if !actor.is_active() {
                continue;
            }

            if gait.step(actor, &track, delta, rng) == StepOutcome::Arrived {
                let arrival = Arrival {
                    actor_id: actor.id,
                    race_time: self.race_time,
                    order: self.arrivals.len() as u32 + 1,
                };
                log::debug!(
                    "Actor {} reached the end at {:.2}s (#{})",
                    arrival.actor_id,
                    arrival.race_time,
                    arrival.order
                );
                self.arrivals.push(arrival);
            }
        }

        // Actor 0 leads the camera even while it idles at the start
        if let Some(lead) = self.actors.first().filter(|a| a.animation.is_some()) {
            self.camera.follow(lead.position, axis);
        }
    }

    /// Get compact snapshot for IPC transfer
    pub fn get_snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            phase: self.phase(),
            flags: self.flags,
            race_time: self.race_time,
            actors: self.actors.iter().map(ActorSnapshot::from).collect(),
            camera: self.camera,
            track_loaded: self.track_model.is_some(),
            arrival_count: self.arrivals.len() as u32,
        }
    }

    /// Summary of a loaded model, if it has arrived
    pub fn model(&self, kind: AssetKind) -> Option<&ModelSummary> {
        match kind {
            AssetKind::Character => self.character_model.as_ref(),
            AssetKind::Track => self.track_model.as_ref(),
        }
    }
}

/// Compact race snapshot for IPC transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub phase: RacePhase,
    pub flags: RaceFlags,
    pub race_time: f32,
    pub actors: Vec<ActorSnapshot>,
    pub camera: CameraRig,
    pub track_loaded: bool,
    pub arrival_count: u32,
}
