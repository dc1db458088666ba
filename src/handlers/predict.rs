//! Prediction handler

use axum::{extract::State, Json};

use super::extract::AppJson;
use crate::app::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{PredictRequest, PredictResponse};

/// `POST /predict`: classify one feature record
pub async fn predict(
    State(state): State<AppState>,
    AppJson(req): AppJson<PredictRequest>,
) -> AppResult<Json<PredictResponse>> {
    let detector = state.detector.as_ref().ok_or(AppError::ModelUnavailable)?;

    let prediction = detector.predict(&req.features).map_err(|e| {
        tracing::debug!(error = ?e, features = req.features.len(), "Prediction failed");
        AppError::from(e)
    })?;

    tracing::debug!(
        label = %prediction.label,
        confidence = prediction.confidence,
        "Prediction served"
    );

    Ok(Json(PredictResponse {
        prediction: prediction.label,
        confidence: prediction.confidence,
        status: prediction.status.to_string(),
    }))
}
