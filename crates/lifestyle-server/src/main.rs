//! HTTP server entry point and Axum router setup.
//!
//! Loads the model, feature list and threshold once, then serves `/health`
//! and `/predict` on `BIND_ADDR` (default `0.0.0.0:8000`).

mod dto;
mod error;
mod handlers;
mod services;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lifestyle_config::{Artifacts, Settings};
use lifestyle_core::{DefaultTable, FeatureList, Threshold};
use lifestyle_model::Classifier;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared server state accessible from all handlers.
///
/// Built once at startup and never mutated.
pub struct AppState {
    pub model: Option<Arc<dyn Classifier>>,
    pub features: FeatureList,
    pub threshold: Threshold,
    pub defaults: DefaultTable,
    pub model_version: String,
    /// Where the model was expected, reported when it is missing.
    pub model_path: PathBuf,
}

impl AppState {
    pub fn new(settings: &Settings, artifacts: Artifacts) -> Self {
        Self {
            model: artifacts.model,
            features: artifacts.features,
            threshold: artifacts.threshold,
            defaults: DefaultTable::standard(),
            model_version: settings.model_version.clone(),
            model_path: settings.model_path.clone(),
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let settings = Settings::from_env();
    let state = Arc::new(AppState::new(&settings, Artifacts::load(&settings)));

    info!(
        "Serving model version {} with {} features, threshold {}",
        state.model_version,
        state.features.len(),
        state.threshold
    );
    if !state.model_loaded() {
        warn!(
            "No model loaded; /predict will answer 503 until {} exists and the server restarts",
            state.model_path.display()
        );
    }

    let app = router(state);

    info!("Starting server on {}", settings.bind_addr);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the application router. `/health` is left out of request tracing.
fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let logged_routes = Router::new()
        .route("/predict", post(handlers::predict::predict))
        .layer(trace_layer);

    Router::new()
        .merge(logged_routes)
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use lifestyle_model::ModelError;

    use super::*;

    /// Returns a fixed probability and records every row it sees.
    pub struct FixedModel {
        probability: Option<f64>,
        rows: Mutex<Vec<Vec<f64>>>,
    }

    impl FixedModel {
        pub fn new(probability: f64) -> Self {
            Self { probability: Some(probability), rows: Mutex::new(Vec::new()) }
        }

        pub fn failing() -> Self {
            Self { probability: None, rows: Mutex::new(Vec::new()) }
        }

        pub fn rows(&self) -> Vec<Vec<f64>> {
            self.rows.lock().unwrap().clone()
        }
    }

    impl Classifier for FixedModel {
        fn predict_proba(&self, row: &[f64]) -> Result<f64, ModelError> {
            self.rows.lock().unwrap().push(row.to_vec());
            self.probability
                .ok_or(ModelError::FeatureMismatch { index: row.len(), len: row.len() })
        }
    }

    pub fn state_with(model: Option<Arc<FixedModel>>) -> AppState {
        AppState::new(
            &Settings::default(),
            Artifacts {
                model: model.map(|m| m as Arc<dyn Classifier>),
                features: FeatureList::fallback(),
                threshold: Threshold::DEFAULT,
            },
        )
    }
}
