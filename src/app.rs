//! Router and shared state

use std::any::Any;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::error::error_body;
use crate::handlers;
use crate::logic::{Detector, TrafficSampler};

/// Shared application state, built once at startup
#[derive(Clone)]
pub struct AppState {
    /// `None` when the bundle failed to load (degraded mode)
    pub detector: Option<Arc<Detector>>,
    /// `None` when the simulation dataset is missing
    pub traffic: Option<Arc<TrafficSampler>>,
}

impl AppState {
    pub fn new(detector: Option<Detector>, traffic: Option<TrafficSampler>) -> Self {
        Self {
            detector: detector.map(Arc::new),
            traffic: traffic.map(Arc::new),
        }
    }

    /// Load the bundle and the simulation dataset; failures leave the slot empty
    pub fn load(config: &Config) -> Self {
        let detector = match Detector::load(&config.artifact_path) {
            Ok(detector) => {
                tracing::info!(
                    path = %config.artifact_path.display(),
                    bundle_id = detector.bundle_id().unwrap_or("-"),
                    accuracy = detector.accuracy(),
                    "Model bundle loaded"
                );
                Some(detector)
            }
            Err(e) => {
                tracing::error!(path = %config.artifact_path.display(), "Error loading model: {}", e);
                tracing::debug!(error = ?e, "Bundle load failure");
                None
            }
        };

        let traffic = match TrafficSampler::load(&config.simulation_data_path) {
            Ok(sampler) => {
                tracing::info!(rows = sampler.len(), "Simulation data loaded");
                Some(sampler)
            }
            Err(e) => {
                tracing::warn!(
                    path = %config.simulation_data_path.display(),
                    "Simulation data unavailable: {}", e
                );
                None
            }
        };

        Self::new(detector, traffic)
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::status))
        .route("/simulate", get(handlers::simulate::simulate))
        .route("/predict", post(handlers::predict::predict))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods(AnyOrigin)
                .allow_headers(AnyOrigin),
        )
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    tracing::error!("Handler panicked: {}", detail);
    error_body(StatusCode::INTERNAL_SERVER_ERROR, detail)
}
