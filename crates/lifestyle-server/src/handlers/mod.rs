//! HTTP route handlers for the risk server.

pub mod predict;

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::HealthResponse;
use crate::AppState;

/// Liveness and introspection endpoint. Always succeeds, with or without a model.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        features: state.features.names().to_vec(),
        threshold: state.threshold.value(),
        model_version: state.model_version.clone(),
        model_loaded: state.model_loaded(),
    })
}
