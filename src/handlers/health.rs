//! Status handler

use axum::{extract::State, Json};

use crate::app::AppState;
use crate::constants::{ACCURACY_UNAVAILABLE, SERVICE_ACTIVE};
use crate::models::{ModelAccuracy, StatusResponse};

/// `GET /`: liveness plus the accuracy recorded in the bundle
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let model_accuracy = match &state.detector {
        Some(detector) => ModelAccuracy::Measured(detector.accuracy()),
        None => ModelAccuracy::Unavailable(ACCURACY_UNAVAILABLE),
    };

    Json(StatusResponse {
        status: SERVICE_ACTIVE,
        model_accuracy,
    })
}
