//! Settings and startup artifact loading for the lifestyle risk service.
//!
//! This crate resolves where the artifacts live and loads them once:
//!
//! - [`Settings`] — Artifact paths, model version tag and bind address from the environment
//! - [`Artifacts`] — The loaded model, feature list and threshold after the fallback policy
//! - [`ArtifactKind`] and [`Fallback`] — The per-artifact fallback policy table
//! - [`ArtifactError`] — Why a single artifact failed to load
//!
//! # Example
//!
//! ```rust,ignore
//! use lifestyle_config::{Artifacts, Settings};
//!
//! let settings = Settings::from_env();
//! let artifacts = Artifacts::load(&settings);
//! if artifacts.model.is_none() {
//!     // service still starts; /predict answers 503
//! }
//! ```

mod artifacts;
mod settings;

pub use artifacts::{load_features, load_model, load_threshold, ArtifactKind, Artifacts, Fallback};
pub use settings::{Settings, ARTIFACT_FILES, FEATURES_FILE, MODEL_FILE, THRESHOLD_FILE};

use lifestyle_model::ModelError;

/// Errors that can occur while loading a single artifact.
#[derive(thiserror::Error, Debug)]
pub enum ArtifactError {
    /// Failed to read an artifact file.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The model file could not be turned into a classifier.
    #[error("Failed to load model: {0}")]
    Model(#[from] ModelError),

    /// The feature list is not an array of strings.
    #[error("Feature list in '{path}' is not an ordered sequence of names")]
    NotASequence { path: String },

    /// The feature list is an empty array.
    #[error("Feature list in '{path}' is empty")]
    EmptyFeatures { path: String },

    /// The threshold is not a number.
    #[error("Threshold in '{path}' is not a number: {value}")]
    NotANumber { path: String, value: String },
}

impl ArtifactError {
    /// Creates an IO error with path context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Creates a parse error with path context.
    pub fn parse(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse { path: path.into(), source }
    }
}
