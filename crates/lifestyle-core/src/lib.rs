//! Core domain types for the lifestyle risk service.
//!
//! This crate provides the types shared by the loader, the model and the HTTP layer:
//!
//! - [`FeatureList`] — Ordered feature names defining the model's column order
//! - [`DefaultTable`] — Fallback values for features a request leaves out
//! - [`Threshold`] and [`RiskLabel`] — Decision boundary and its two outcomes
//! - [`FeaturePayload`] and [`FeatureRow`] — Loose request input and the assembled model row
//!
//! # Example
//!
//! ```rust
//! use lifestyle_core::{DefaultTable, FeatureList, FeaturePayload, FeatureRow, RiskLabel, Threshold};
//!
//! let features = FeatureList::fallback();
//! let defaults = DefaultTable::standard();
//! let payload: FeaturePayload = serde_json::from_str(r#"{"bmi": 31.0}"#).unwrap();
//!
//! let row = FeatureRow::assemble(&payload, &features, &defaults);
//! assert_eq!(row.get("bmi"), Some(31.0));
//! assert_eq!(row.get("sugar_intake"), Some(50.0));
//!
//! assert_eq!(Threshold::default().classify(0.5), RiskLabel::Healthy);
//! ```

mod row;

pub use row::{FeaturePayload, FeatureRow};

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Feature names used when no feature list artifact can be loaded.
pub const FALLBACK_FEATURES: [&str; 9] = [
    "sugar_intake",
    "bmi",
    "cholesterol",
    "sleep_hours",
    "physical_activity",
    "work_hours",
    "blood_pressure",
    "calorie_intake",
    "water_intake",
];

/// Per-feature values substituted for absent or null request fields.
const STANDARD_DEFAULTS: [(&str, f64); 9] = [
    ("sugar_intake", 50.0),
    ("bmi", 22.0),
    ("cholesterol", 180.0),
    ("sleep_hours", 7.0),
    ("physical_activity", 5.0),
    ("work_hours", 8.0),
    ("blood_pressure", 120.0),
    ("calorie_intake", 2000.0),
    ("water_intake", 2.0),
];

/// Model version tag reported when `MODEL_VERSION` is not set.
pub const DEFAULT_MODEL_VERSION: &str = "xgb_red_v1";

// ============================================================================
// Feature List
// ============================================================================

/// Ordered feature names the model was trained on.
///
/// Column `i` of every row handed to the model holds the value of `names[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureList(Vec<String>);

impl FeatureList {
    /// Creates a feature list from names in model column order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// The hardcoded nine-feature list.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_FEATURES)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Column position of a feature, if present.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }
}

impl Default for FeatureList {
    fn default() -> Self {
        Self::fallback()
    }
}

// ============================================================================
// Default Table
// ============================================================================

/// Fallback values keyed by feature name.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultTable {
    values: HashMap<String, f64>,
}

impl DefaultTable {
    /// The built-in table covering every fallback feature.
    pub fn standard() -> Self {
        Self {
            values: STANDARD_DEFAULTS
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Registered default for `name`, or `0.0` for unregistered features.
    pub fn value_for(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(0.0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

impl Default for DefaultTable {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// Threshold and Labels
// ============================================================================

/// Probability cutoff separating "Healthy" from "At Risk".
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Threshold(f64);

impl Threshold {
    pub const DEFAULT: Threshold = Threshold(0.5);

    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Strict comparison: a probability equal to the threshold is `Healthy`.
    pub fn classify(&self, probability: f64) -> RiskLabel {
        if probability > self.0 {
            RiskLabel::AtRisk
        } else {
            RiskLabel::Healthy
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of thresholding the positive-class probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    #[serde(rename = "At Risk")]
    AtRisk,
    #[serde(rename = "Healthy")]
    Healthy,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::AtRisk => "At Risk",
            RiskLabel::Healthy => "Healthy",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
