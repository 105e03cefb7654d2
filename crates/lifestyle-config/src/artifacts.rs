//! Startup artifact loading with an explicit per-artifact fallback policy.
//!
//! Each artifact loads independently into a `Result`. [`ArtifactKind::fallback`]
//! decides what replaces a failed load, so a broken threshold file never takes
//! the model down with it.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use lifestyle_core::{FeatureList, Threshold};
use lifestyle_model::{Classifier, XgbModel};
use serde_json::Value;
use tracing::{info, warn};

use crate::{ArtifactError, Settings};

/// The three files loaded at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Model,
    Features,
    Threshold,
}

/// What replaces an artifact that failed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// No model; prediction requests are refused.
    Absent,
    /// The hardcoded nine-feature list.
    FallbackFeatures,
    /// [`Threshold::DEFAULT`].
    DefaultThreshold,
}

impl ArtifactKind {
    /// The fallback policy table.
    pub fn fallback(self) -> Fallback {
        match self {
            ArtifactKind::Model => Fallback::Absent,
            ArtifactKind::Features => Fallback::FallbackFeatures,
            ArtifactKind::Threshold => Fallback::DefaultThreshold,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Model => "model",
            Self::Features => "feature list",
            Self::Threshold => "threshold",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "serving without a model"),
            Self::FallbackFeatures => write!(f, "using the built-in feature list"),
            Self::DefaultThreshold => write!(f, "using threshold {}", Threshold::DEFAULT),
        }
    }
}

/// Artifacts after the fallback policy has been applied.
#[derive(Clone)]
pub struct Artifacts {
    pub model: Option<Arc<dyn Classifier>>,
    pub features: FeatureList,
    pub threshold: Threshold,
}

impl Artifacts {
    /// Loads all three artifacts, substituting fallbacks for any that fail.
    ///
    /// Never fails: the worst case is a model-less service with default
    /// features and threshold.
    pub fn load(settings: &Settings) -> Self {
        let model = match load_model(&settings.model_path) {
            Ok(model) => {
                info!("Loaded {} from {}", model.describe(), settings.model_path.display());
                Some(model)
            }
            Err(e) => {
                report(ArtifactKind::Model, &settings.model_path, &e);
                None
            }
        };

        let features = match load_features(&settings.feats_path) {
            Ok(features) => {
                info!("Loaded {} features from {}", features.len(), settings.feats_path.display());
                features
            }
            Err(e) => {
                report(ArtifactKind::Features, &settings.feats_path, &e);
                FeatureList::fallback()
            }
        };

        let threshold = match load_threshold(&settings.thresh_path) {
            Ok(threshold) => {
                info!("Loaded threshold {} from {}", threshold, settings.thresh_path.display());
                threshold
            }
            Err(e) => {
                report(ArtifactKind::Threshold, &settings.thresh_path, &e);
                Threshold::DEFAULT
            }
        };

        if let Some(model) = model.as_ref() {
            let missing: Vec<&str> = model
                .feature_names()
                .iter()
                .map(String::as_str)
                .filter(|name| features.position(name).is_none())
                .collect();
            if !missing.is_empty() {
                warn!(
                    "Model needs features missing from the feature list: {}; predictions will fail",
                    missing.join(", ")
                );
            } else if let Some(expected) = model
                .num_features()
                .filter(|&n| model.feature_names().is_empty() && n != features.len())
            {
                warn!(
                    "Model was trained on {} features but the feature list has {}",
                    expected,
                    features.len()
                );
            }
        }

        Self { model, features, threshold }
    }
}

fn report(kind: ArtifactKind, path: &Path, err: &ArtifactError) {
    warn!("Failed to load {} from {}: {}; {}", kind, path.display(), err, kind.fallback());
}

/// Loads the classifier from an XGBoost JSON model file.
pub fn load_model(path: &Path) -> Result<Arc<dyn Classifier>, ArtifactError> {
    let model = XgbModel::from_file(path)?;
    Ok(Arc::new(model))
}

/// Loads the feature list: a JSON array of feature names.
pub fn load_features(path: &Path) -> Result<FeatureList, ArtifactError> {
    let value = read_json(path)?;
    let not_a_sequence = || ArtifactError::NotASequence { path: path.display().to_string() };

    let names = value
        .as_array()
        .ok_or_else(not_a_sequence)?
        .iter()
        .map(|v| v.as_str().map(String::from))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(not_a_sequence)?;

    if names.is_empty() {
        return Err(ArtifactError::EmptyFeatures { path: path.display().to_string() });
    }
    Ok(FeatureList::new(names))
}

/// Loads the decision threshold: a JSON number, or a string holding one.
pub fn load_threshold(path: &Path) -> Result<Threshold, ArtifactError> {
    let value = read_json(path)?;
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|t| t.is_finite())
        .map(Threshold::new)
        .ok_or_else(|| ArtifactError::NotANumber {
            path: path.display().to_string(),
            value: value.to_string(),
        })
}

fn read_json(path: &Path) -> Result<Value, ArtifactError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ArtifactError::io(path.display().to_string(), e))?;
    serde_json::from_str(&content).map_err(|e| ArtifactError::parse(path.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const STUMP_MODEL: &str = r#"{
  "learner": {
    "gradient_booster": {
      "name": "gbtree",
      "model": {
        "trees": [{
          "left_children": [1, -1, -1],
          "right_children": [2, -1, -1],
          "split_indices": [1, 0, 0],
          "split_conditions": [30.0, -0.5, 0.5],
          "default_left": [0, 0, 0]
        }]
      }
    },
    "learner_model_param": {"base_score": "5E-1", "num_class": "0", "num_feature": "9"},
    "objective": {"name": "binary:logistic"}
  }
}"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn settings(dir: &Path) -> Settings {
        Settings {
            model_path: dir.join("xgb_model.json"),
            feats_path: dir.join("selected_features.json"),
            thresh_path: dir.join("best_threshold.json"),
            ..Settings::default()
        }
    }

    #[test]
    fn loads_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "xgb_model.json", STUMP_MODEL);
        write(dir.path(), "selected_features.json", r#"["sugar_intake", "bmi"]"#);
        write(dir.path(), "best_threshold.json", "0.37");

        let artifacts = Artifacts::load(&settings(dir.path()));

        let model = artifacts.model.expect("model should load");
        assert_eq!(model.num_features(), Some(9));
        assert_eq!(artifacts.features, FeatureList::new(["sugar_intake", "bmi"]));
        assert_eq!(artifacts.threshold, Threshold::new(0.37));
    }

    #[test]
    fn each_artifact_falls_back_independently() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "selected_features.json", r#"["bmi"]"#);

        let artifacts = Artifacts::load(&settings(dir.path()));

        assert!(artifacts.model.is_none());
        assert_eq!(artifacts.features, FeatureList::new(["bmi"]));
        assert_eq!(artifacts.threshold, Threshold::DEFAULT);
    }

    #[test]
    fn nothing_on_disk_yields_degraded_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = Artifacts::load(&settings(dir.path()));

        assert!(artifacts.model.is_none());
        assert_eq!(artifacts.features, FeatureList::fallback());
        assert_eq!(artifacts.threshold.value(), 0.5);
    }

    #[test]
    fn feature_list_must_be_a_sequence_of_names() {
        let dir = tempfile::tempdir().unwrap();
        let obj = write(dir.path(), "a.json", r#"{"bmi": 1}"#);
        let mixed = write(dir.path(), "b.json", r#"["bmi", 3]"#);
        let empty = write(dir.path(), "c.json", "[]");
        let garbage = write(dir.path(), "d.json", "not json");

        assert!(matches!(load_features(&obj), Err(ArtifactError::NotASequence { .. })));
        assert!(matches!(load_features(&mixed), Err(ArtifactError::NotASequence { .. })));
        assert!(matches!(load_features(&empty), Err(ArtifactError::EmptyFeatures { .. })));
        assert!(matches!(load_features(&garbage), Err(ArtifactError::Parse { .. })));
    }

    #[test]
    fn threshold_accepts_numbers_and_numeric_strings() {
        let dir = tempfile::tempdir().unwrap();
        let number = write(dir.path(), "a.json", "0.61");
        let string = write(dir.path(), "b.json", r#"" 0.44 ""#);
        let word = write(dir.path(), "c.json", r#""high""#);
        let list = write(dir.path(), "d.json", "[0.5]");

        assert_eq!(load_threshold(&number).unwrap().value(), 0.61);
        assert_eq!(load_threshold(&string).unwrap().value(), 0.44);
        assert!(matches!(load_threshold(&word), Err(ArtifactError::NotANumber { .. })));
        assert!(matches!(load_threshold(&list), Err(ArtifactError::NotANumber { .. })));
    }

    #[test]
    fn broken_model_file_is_a_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "xgb_model.json", r#"{"learner": {}}"#);
        assert!(matches!(load_model(&path), Err(ArtifactError::Model(_))));
    }

    #[test]
    fn policy_table() {
        assert_eq!(ArtifactKind::Model.fallback(), Fallback::Absent);
        assert_eq!(ArtifactKind::Features.fallback(), Fallback::FallbackFeatures);
        assert_eq!(ArtifactKind::Threshold.fallback(), Fallback::DefaultThreshold);
        assert_eq!(Fallback::DefaultThreshold.to_string(), "using threshold 0.5");
    }
}
