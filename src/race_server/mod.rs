//! Race Server Module
//!
//! Runs the horse race simulation in Rust; the webview renders whatever
//! the latest snapshot describes. Communicates with the JS frontend via
//! Tauri commands and events.

pub mod actor;
pub mod assets;
pub mod camera;
pub mod input;
pub mod race;
pub mod simulation;
pub mod track;

pub use actor::{Actor, AnimationHandle};
pub use assets::{AssetKind, AssetPaths, AssetStatus, ModelSummary};
pub use input::{KeyBindings, RaceKey};
pub use race::{Race, RaceConfig, RacePhase};
pub use simulation::{RaceEvent, RaceServer};
pub use track::Track;
