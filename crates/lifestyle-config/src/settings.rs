//! Environment-driven settings.

use std::path::PathBuf;

use lifestyle_core::DEFAULT_MODEL_VERSION;

const DEFAULT_MODELS_DIR: &str = "models";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

pub const MODEL_FILE: &str = "xgb_model.json";
pub const FEATURES_FILE: &str = "selected_features.json";
pub const THRESHOLD_FILE: &str = "best_threshold.json";

/// Every file the service loads at startup.
pub const ARTIFACT_FILES: [&str; 3] = [MODEL_FILE, FEATURES_FILE, THRESHOLD_FILE];

/// Process-wide settings, resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `MODEL_PATH`
    pub model_path: PathBuf,
    /// `FEATS_PATH`
    pub feats_path: PathBuf,
    /// `THRESH_PATH`
    pub thresh_path: PathBuf,
    /// `MODEL_VERSION`, a free-text tag echoed in every response.
    pub model_version: String,
    /// `BIND_ADDR`
    pub bind_addr: String,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`, falling back to `models/` paths.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let models_dir = PathBuf::from(DEFAULT_MODELS_DIR);
        let path = |key: &str, file: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| models_dir.join(file))
        };

        Self {
            model_path: path("MODEL_PATH", MODEL_FILE),
            feats_path: path("FEATS_PATH", FEATURES_FILE),
            thresh_path: path("THRESH_PATH", THRESHOLD_FILE),
            model_version: lookup("MODEL_VERSION").unwrap_or_else(|| DEFAULT_MODEL_VERSION.to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
