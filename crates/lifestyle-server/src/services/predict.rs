//! Request-to-prediction path.
//!
//! Null-coalesces the payload against the default table, assembles the row in
//! feature-list order, runs the model and thresholds its probability.

use lifestyle_core::{FeaturePayload, FeatureRow, RiskLabel};
use tracing::{debug, error, warn};

use crate::error::AppError;
use crate::AppState;

/// Outcome of a single prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: RiskLabel,
    pub probability: f64,
}

/// Runs one prediction against the loaded model.
///
/// Refuses with `ServiceUnavailable` before touching the payload when no model
/// is loaded.
pub fn predict(state: &AppState, payload: &FeaturePayload) -> Result<Prediction, AppError> {
    let Some(model) = state.model.as_ref() else {
        warn!("Prediction refused: no model loaded");
        return Err(AppError::ServiceUnavailable(format!(
            "Model not loaded. Check server logs. Expected at: {}",
            state.model_path.display()
        )));
    };

    let row = FeatureRow::assemble(payload, &state.features, &state.defaults);
    debug!("Assembled row {:?} from {} payload fields", row.values(), payload.len());

    let probability = model.predict_proba_named(row.columns(), row.values()).map_err(|e| {
        error!("Inference failed: {}", e);
        AppError::Internal(format!("inference failed: {}", e))
    })?;
    let label = state.threshold.classify(probability);

    debug!("Predicted {} (p={:.4}, threshold={})", label, probability, state.threshold);
    Ok(Prediction { label, probability })
}
