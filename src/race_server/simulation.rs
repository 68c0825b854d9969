//! Simulation - Race server and frame loop
//!
//! Owns the race, applies asset and keyboard events in arrival order, and
//! steps the race once per rendered frame.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::race_server::assets::{AssetKind, AssetStatus, ModelSummary};
use crate::race_server::input::RaceKey;
use crate::race_server::race::{Arrival, Race, RaceConfig, RacePhase, RaceSnapshot};

/// Frames kept for the frame-time average
const FRAME_WINDOW: usize = 60;

/// Everything that can change the race outside of a frame step
#[derive(Debug, Clone)]
pub enum RaceEvent {
    AssetLoaded(AssetKind, ModelSummary),
    AssetFailed(AssetKind, String),
    KeyPressed(RaceKey),
}

/// Server statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStats {
    pub frames: u64,
    pub avg_frame_time_ms: f32,
    pub actor_count: u32,
    pub phase: RacePhase,
    pub race_time: f32,
    pub character_asset: AssetStatus,
    pub track_asset: AssetStatus,
}

/// Wall-clock delta between consecutive frames
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    /// Seconds since the previous call, 0 on the first
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = self
            .last
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        delta
    }
}

/// Main race server
pub struct RaceServer {
    race: Race,
    rng: StdRng,
    clock: FrameClock,
    /// Recent frame step durations (ms)
    frame_times: Vec<f32>,
    frames: u64,
    character_asset: AssetStatus,
    track_asset: AssetStatus,
}

impl RaceServer {
    pub fn new(config: RaceConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a server with a fixed random source
    pub fn with_rng(config: RaceConfig, rng: StdRng) -> Self {
        Self {
            race: Race::new(config),
            rng,
            clock: FrameClock::default(),
            frame_times: Vec::with_capacity(FRAME_WINDOW),
            frames: 0,
            character_asset: AssetStatus::Pending,
            track_asset: AssetStatus::Pending,
        }
    }

    /// Apply one event to the race
    pub fn dispatch(&mut self, event: RaceEvent) {
        match event {
            RaceEvent::AssetLoaded(AssetKind::Character, model) => {
                log::info!(
                    "Character model {} loaded with {} clip(s)",
                    model.path.display(),
                    model.clips.len()
                );
                self.race.spawn_actors(model, &mut self.rng);
                self.character_asset = AssetStatus::Loaded;
            }
            RaceEvent::AssetLoaded(AssetKind::Track, model) => {
                log::info!("Track model {} loaded", model.path.display());
                self.race.register_track(model);
                self.track_asset = AssetStatus::Loaded;
            }
            RaceEvent::AssetFailed(kind, reason) => {
                log::warn!("{:?} model failed to load: {}", kind, reason);
                match kind {
                    AssetKind::Character => self.character_asset = AssetStatus::Failed(reason),
                    AssetKind::Track => self.track_asset = AssetStatus::Failed(reason),
                }
            }
            RaceEvent::KeyPressed(RaceKey::Start) => {
                self.race.start();
                log::info!("Race started");
            }
            RaceEvent::KeyPressed(RaceKey::TogglePause) => {
                if self.race.toggle_pause() {
                    log::info!("Race paused");
                } else {
                    log::info!("Race resumed");
                }
            }
        }
    }

    /// Resolve a raw key value and apply it, if bound
    pub fn press_key(&mut self, key: &str) -> Option<RaceKey> {
        let action = self.race.config.keys.resolve(key)?;
        self.dispatch(RaceEvent::KeyPressed(action));
        Some(action)
    }

    /// Advance by the wall-clock time since the previous frame
    pub fn frame(&mut self) -> RaceSnapshot {
        let delta = self.clock.tick();
        self.step(delta)
    }

    /// Advance by an explicit `delta` and return the frame to render
    pub fn step(&mut self, delta: f32) -> RaceSnapshot {
        let step_start = Instant::now();

        self.race.update(delta, &mut self.rng);

        let step_time = step_start.elapsed().as_secs_f32() * 1000.0;
        self.frame_times.push(step_time);
        if self.frame_times.len() > FRAME_WINDOW {
            self.frame_times.remove(0);
        }
        self.frames += 1;

        self.race.get_snapshot()
    }

    pub fn get_snapshot(&self) -> RaceSnapshot {
        self.race.get_snapshot()
    }

    pub fn get_results(&self) -> Vec<Arrival> {
        self.race.arrivals.clone()
    }

    pub fn model(&self, kind: AssetKind) -> Option<&ModelSummary> {
        self.race.model(kind)
    }

    pub fn config(&self) -> &RaceConfig {
        &self.race.config
    }

    /// Get server statistics
    pub fn get_stats(&self) -> ServerStats {
        let avg_frame_time = if self.frame_times.is_empty() {
            0.0
        } else {
            self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32
        };

        ServerStats {
            frames: self.frames,
            avg_frame_time_ms: avg_frame_time,
            actor_count: self.race.actors.len() as u32,
            phase: self.race.phase(),
            race_time: self.race.race_time,
            character_asset: self.character_asset.clone(),
            track_asset: self.track_asset.clone(),
        }
    }
}

impl Default for RaceServer {
    fn default() -> Self {
        Self::new(RaceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race_server::assets::ClipSummary;

    fn model(path: &str, clips: &[&str]) -> ModelSummary {
        ModelSummary {
            path: path.into(),
            scene_count: 1,
            node_count: 1,
            mesh_count: 1,
            clips: clips
                .iter()
                .map(|name| ClipSummary {
                    name: (*name).to_owned(),
                    duration: 1.0,
                })
                .collect(),
        }
    }

    fn server() -> RaceServer {
        RaceServer::with_rng(RaceConfig::default(), StdRng::seed_from_u64(9))
    }

    #[test]
    fn frames_before_loading_are_harmless() {
        let mut server = server();
        server.press_key("s");
        for _ in 0..10 {
            let snapshot = server.step(0.016);
            assert!(snapshot.actors.is_empty());
            assert_eq!(snapshot.phase, RacePhase::Loading);
        }
        assert_eq!(server.get_stats().frames, 10);
    }

    #[test]
    fn late_character_load_runs_with_a_frozen_clip_until_next_start() {
        let mut server = server();
        server.press_key("s");
        server.dispatch(RaceEvent::AssetLoaded(
            AssetKind::Character,
            model("horse.gltf", &["Gallop"]),
        ));

        let before = server.step(0.1);
        let after = server.step(0.1);
        assert!(after.actors[0].position.x > before.actors[0].position.x);
        let clip = after.actors[0].animation.as_ref().unwrap();
        assert!(clip.paused);
        assert_eq!(clip.time, 0.0);

        server.press_key("s");
        let running = server.step(0.1);
        assert!(running.actors[0].animation.as_ref().unwrap().time > 0.0);
    }

    #[test]
    fn keys_drive_start_and_pause() {
        let mut server = server();
        server.dispatch(RaceEvent::AssetLoaded(
            AssetKind::Character,
            model("horse.gltf", &["Gallop"]),
        ));

        assert_eq!(server.press_key("x"), None);
        assert_eq!(server.press_key("s"), Some(RaceKey::Start));
        assert_eq!(server.get_stats().phase, RacePhase::Racing);
        assert_eq!(server.press_key("p"), Some(RaceKey::TogglePause));
        assert_eq!(server.get_stats().phase, RacePhase::Paused);
        server.press_key("p");
        assert_eq!(server.get_stats().phase, RacePhase::Racing);
    }

    #[test]
    fn failed_loads_are_reported_and_leave_the_scene_empty() {
        let mut server = server();
        server.dispatch(RaceEvent::AssetFailed(AssetKind::Character, "missing".into()));
        server.dispatch(RaceEvent::AssetLoaded(AssetKind::Track, model("course.gltf", &[])));

        let stats = server.get_stats();
        assert_eq!(stats.character_asset, AssetStatus::Failed("missing".into()));
        assert_eq!(stats.track_asset, AssetStatus::Loaded);
        assert_eq!(stats.actor_count, 0);
        assert!(server.get_snapshot().track_loaded);
        assert!(server.model(AssetKind::Character).is_none());
        assert_eq!(
            server.model(AssetKind::Track).map(|m| m.path.clone()),
            Some("course.gltf".into())
        );
    }

    #[test]
    fn results_follow_arrival_order() {
        let mut server = server();
        server.dispatch(RaceEvent::AssetLoaded(
            AssetKind::Character,
            model("horse.gltf", &["Gallop"]),
        ));
        server.press_key("s");
        for _ in 0..400 {
            server.step(0.1);
        }

        let results = server.get_results();
        assert_eq!(results.len(), 10);
        assert!(results.windows(2).all(|w| w[0].race_time <= w[1].race_time));
    }

    #[test]
    fn frame_time_window_is_bounded() {
        let mut server = server();
        for _ in 0..(FRAME_WINDOW * 2) {
            server.frame();
        }
        assert_eq!(server.frame_times.len(), FRAME_WINDOW);
        assert!(server.get_stats().avg_frame_time_ms >= 0.0);
    }

    #[test]
    fn first_clock_tick_is_zero() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.tick(), 0.0);
        assert!(clock.tick() >= 0.0);
    }
}
