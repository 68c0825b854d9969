//! Assets - glTF model loading and summaries
//!
//! The renderer decodes meshes itself; the backend only reads the glTF
//! document to learn which animation clips a model carries and how long
//! they run, which is all the race needs to build actors.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a model
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("cannot resolve asset path {path}: {reason}")]
    Resolve { path: PathBuf, reason: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse glTF {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
}

/// Which of the two race models a load refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    Character,
    Track,
}

impl AssetKind {
    /// Frontend event emitted once the model is ready
    pub fn event_name(self) -> &'static str {
        match self {
            AssetKind::Character => "character-loaded",
            AssetKind::Track => "track-loaded",
        }
    }
}

/// Load progress of one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetStatus {
    Pending,
    Loaded,
    Failed(String),
}

/// Fixed model locations, relative to the resource directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPaths {
    pub character: PathBuf,
    pub track: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            character: PathBuf::from("assets/horse/scene.gltf"),
            track: PathBuf::from("assets/course/race-course.gltf"),
        }
    }
}

impl AssetPaths {
    pub fn path_of(&self, kind: AssetKind) -> &Path {
        match kind {
            AssetKind::Character => &self.character,
            AssetKind::Track => &self.track,
        }
    }
}

/// One animation clip found in a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSummary {
    pub name: String,
    /// Longest sampler input time, in seconds
    pub duration: f32,
}

/// What the backend knows about a loaded model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub path: PathBuf,
    pub scene_count: usize,
    pub node_count: usize,
    pub mesh_count: usize,
    pub clips: Vec<ClipSummary>,
}

impl ModelSummary {
    /// Parse a `.gltf` or `.glb` document already read into memory
    pub fn from_slice(path: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self, AssetError> {
        let path = path.into();
        let document = match gltf::Gltf::from_slice(bytes) {
            Ok(gltf) => gltf.document,
            Err(source) => return Err(AssetError::Parse { path, source }),
        };

        let clips = document
            .animations()
            .map(|animation| ClipSummary {
                name: animation
                    .name()
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("clip{}", animation.index())),
                duration: clip_duration(&animation),
            })
            .collect();

        Ok(Self {
            path,
            scene_count: document.scenes().len(),
            node_count: document.nodes().len(),
            mesh_count: document.meshes().len(),
            clips,
        })
    }

    /// The clip actors play, if the model has any
    pub fn first_clip(&self) -> Option<&ClipSummary> {
        self.clips.first()
    }
}

fn clip_duration(animation: &gltf::Animation<'_>) -> f32 {
    animation
        .samplers()
        .filter_map(|sampler| sampler.input().max())
        .filter_map(|max| max.as_array()?.first()?.as_f64())
        .fold(0.0_f64, f64::max) as f32
}

/// Read and summarize the model at `path`
pub fn load_model(path: &Path) -> Result<ModelSummary, AssetError> {
    let bytes = fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ModelSummary::from_slice(path, &bytes)
}
