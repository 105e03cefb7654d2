//! Request payload coercion and model row assembly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DefaultTable, FeatureList};

/// Loosely structured prediction input: any JSON object.
///
/// Keys outside the feature list are carried but never read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeaturePayload(HashMap<String, Value>);

impl FeaturePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Numeric value for `name`, or `None` when the key is absent or null.
    ///
    /// Numbers pass through, booleans map to `1.0`/`0.0` and numeric strings
    /// are parsed. Any other value reads as NaN so the model treats it as missing.
    pub fn value(&self, name: &str) -> Option<f64> {
        match self.0.get(name)? {
            Value::Null => None,
            Value::Number(n) => Some(n.as_f64().unwrap_or(f64::NAN)),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => Some(s.trim().parse().unwrap_or(f64::NAN)),
            Value::Array(_) | Value::Object(_) => Some(f64::NAN),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single model input row with values in feature-list order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureRow {
    /// Builds the row for one prediction.
    ///
    /// Absent or null features take their default-table value, or `0.0` when
    /// the table has no entry for them.
    pub fn assemble(payload: &FeaturePayload, features: &FeatureList, defaults: &DefaultTable) -> Self {
        let values = features
            .iter()
            .map(|name| payload.value(name).unwrap_or_else(|| defaults.value_for(name)))
            .collect();

        Self {
            columns: features.names().to_vec(),
            values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> FeaturePayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn columns_follow_feature_list_order() {
        let features = FeatureList::new(["water_intake", "bmi", "sleep_hours"]);
        let p = payload(json!({"sleep_hours": 6.5, "bmi": 27.0, "water_intake": 1.5}));

        let row = FeatureRow::assemble(&p, &features, &DefaultTable::standard());

        assert_eq!(row.columns(), features.names());
        assert_eq!(row.values(), &[1.5, 27.0, 6.5]);
    }

    #[test]
    fn single_feature_payload_uses_defaults_elsewhere() {
        let features = FeatureList::fallback();
        let defaults = DefaultTable::standard();
        let row = FeatureRow::assemble(&payload(json!({"bmi": 31.0})), &features, &defaults);

        assert_eq!(row.len(), 9);
        for name in features.iter() {
            let expected = if name == "bmi" { 31.0 } else { defaults.value_for(name) };
            assert_eq!(row.get(name), Some(expected), "{name}");
        }
    }

    #[test]
    fn null_is_treated_as_missing() {
        let features = FeatureList::new(["cholesterol"]);
        let row = FeatureRow::assemble(
            &payload(json!({"cholesterol": null})),
            &features,
            &DefaultTable::standard(),
        );
        assert_eq!(row.values(), &[180.0]);
    }

    #[test]
    fn unregistered_feature_falls_back_to_zero() {
        let features = FeatureList::new(["bmi", "resting_heart_rate"]);
        let row = FeatureRow::assemble(&FeaturePayload::new(), &features, &DefaultTable::standard());
        assert_eq!(row.values(), &[22.0, 0.0]);
    }

    #[test]
    fn extra_keys_are_ignored() {
        let features = FeatureList::new(["bmi"]);
        let row = FeatureRow::assemble(
            &payload(json!({"bmi": 24.0, "name": "someone"})),
            &features,
            &DefaultTable::standard(),
        );
        assert_eq!(row.values(), &[24.0]);
    }

    #[test]
    fn loose_values_are_coerced() {
        let p = payload(json!({
            "a": "7.5",
            "b": true,
            "c": "lots",
            "d": [1, 2],
            "e": 3
        }));
        assert_eq!(p.value("a"), Some(7.5));
        assert_eq!(p.value("b"), Some(1.0));
        assert!(p.value("c").unwrap().is_nan());
        assert!(p.value("d").unwrap().is_nan());
        assert_eq!(p.value("e"), Some(3.0));
        assert_eq!(p.value("f"), None);
    }
}
