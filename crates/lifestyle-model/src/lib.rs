//! Binary classifier abstraction for the lifestyle risk service.
//!
//! This crate provides:
//!
//! - [`Classifier`] — Trait for anything that maps a feature row to a positive-class probability
//! - [`XgbModel`] — Gradient-boosted tree ensemble read from an XGBoost JSON model file
//! - [`ModelError`] — Load and inference errors
//!
//! # Loading a Model
//!
//! ```rust,ignore
//! use lifestyle_model::{Classifier, XgbModel};
//!
//! // Written by `booster.save_model("xgb_model.json")` after training
//! let model = XgbModel::from_file("models/xgb_model.json")?;
//! let p = model.predict_proba(&[50.0, 31.0, 180.0, 7.0, 5.0, 8.0, 120.0, 2000.0, 2.0])?;
//! ```
//!
//! Rows are positional: column `i` must hold the feature the model saw as
//! column `i` during training. NaN marks a missing value.

mod xgboost;

pub use xgboost::{Objective, XgbModel};

use thiserror::Error;

/// Errors that can occur when loading a model or running inference.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Failed to read the model file.
    #[error("Failed to read model file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the model JSON.
    #[error("Failed to parse model: {0}")]
    Parse(#[from] serde_json::Error),

    /// The file is valid but uses a booster or objective this evaluator does not handle.
    #[error("Unsupported model: {0}")]
    Unsupported(String),

    /// A learner parameter could not be interpreted.
    #[error("Invalid model parameter {name}: '{value}'")]
    InvalidParam { name: &'static str, value: String },

    /// A tree's node arrays are inconsistent.
    #[error("Malformed tree {tree}: {message}")]
    MalformedTree { tree: usize, message: String },

    /// The model was trained on a feature the row does not carry.
    #[error("Model expects feature '{0}' which is not in the feature list")]
    MissingFeature(String),

    /// A split references a column the row does not have.
    #[error("Model splits on feature index {index} but the row has {len} columns")]
    FeatureMismatch { index: usize, len: usize },
}

impl ModelError {
    /// Creates an IO error with path context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn malformed(tree: usize, message: impl Into<String>) -> Self {
        Self::MalformedTree { tree, message: message.into() }
    }
}

/// A pre-trained binary classifier.
///
/// Implementations are immutable after load and shared across requests.
pub trait Classifier: Send + Sync {
    /// Probability of the positive ("At Risk") class for one row.
    fn predict_proba(&self, row: &[f64]) -> Result<f64, ModelError>;

    /// Number of input columns the model was trained with, if recorded.
    fn num_features(&self) -> Option<usize> {
        None
    }

    /// Feature names recorded at training time, in model column order.
    ///
    /// Empty when the model was trained on a bare matrix and only knows positions.
    fn feature_names(&self) -> &[String] {
        &[]
    }

    /// Probability for a row whose columns are named.
    ///
    /// Models that recorded their feature names get the row reordered to their
    /// own column order; any name the row lacks is an error. Models without
    /// names take the row positionally.
    fn predict_proba_named(&self, columns: &[String], row: &[f64]) -> Result<f64, ModelError> {
        let names = self.feature_names();
        if names.is_empty() || names == columns {
            return self.predict_proba(row);
        }

        let aligned = names
            .iter()
            .map(|name| {
                columns
                    .iter()
                    .position(|c| c == name)
                    .and_then(|i| row.get(i).copied())
                    .ok_or_else(|| ModelError::MissingFeature(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.predict_proba(&aligned)
    }

    /// Short description for startup logs.
    fn describe(&self) -> String {
        "classifier".to_string()
    }
}
