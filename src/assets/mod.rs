mod batch;
mod loaded_asset;
mod registry;

use std::path::PathBuf;

use serde::Deserialize;

pub use batch::{load_batch, BatchOutcome, LoadFailure, PendingBatch};
pub use loaded_asset::{AssetNode, LoadedAsset};
pub use registry::ModelRegistry;

/// A model to load and the name the presentation refers to it by.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadRequest {
    pub name: String,
    pub path: PathBuf,
}

impl LoadRequest {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to import glTF: {0}")]
    Import(#[from] gltf::Error),
    #[error("glTF document has no scene")]
    NoScene,
    #[error("mesh `{mesh}` uses unsupported primitive mode {mode}")]
    UnsupportedPrimitive { mesh: String, mode: String },
    #[error("mesh `{mesh}` has no {attribute} attribute")]
    MissingAttribute {
        mesh: String,
        attribute: &'static str,
    },
    #[error("mesh `{0}` has no primitives")]
    EmptyMesh(String),
    #[error("loader panicked")]
    Panicked,
    #[error("loader worker exited before reporting")]
    WorkerLost,
}

/// What to do with the timeline when some models of the batch fail to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadFailurePolicy {
    /// Keep the scene static; no timeline is built.
    #[default]
    Abort,
    /// Build the timeline without the tweens that target failed models.
    SkipMissing,
}
