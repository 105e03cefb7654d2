//! Data transfer objects for HTTP message serialization.

use lifestyle_core::RiskLabel;
use serde::Serialize;

/// Response from `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub features: Vec<String>,
    pub threshold: f64,
    pub model_version: String,
    pub model_loaded: bool,
}

/// Response from `POST /predict`.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: RiskLabel,
    pub probability: f64,
    pub threshold: f64,
    pub features_used: Vec<String>,
    pub model_version: String,
}
