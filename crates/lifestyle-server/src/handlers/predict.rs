//! Prediction endpoint.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use lifestyle_core::FeaturePayload;

use crate::dto::PredictResponse;
use crate::error::AppError;
use crate::services;
use crate::AppState;

/// Classifies one loosely structured set of feature values.
///
/// The body is read as JSON whatever its `Content-Type`.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictResponse>, AppError> {
    let payload: FeaturePayload = serde_json::from_slice(&body)?;
    let prediction = services::predict::predict(&state, &payload)?;

    Ok(Json(PredictResponse {
        prediction: prediction.label,
        probability: prediction.probability,
        threshold: state.threshold.value(),
        features_used: state.features.names().to_vec(),
        model_version: state.model_version.clone(),
    }))
}
