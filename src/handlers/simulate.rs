//! Traffic simulation handler

use axum::{extract::State, Json};

use crate::app::AppState;
use crate::error::{AppError, AppResult};
use crate::models::SimulateResponse;

/// `GET /simulate`: one random record from the simulation dataset
pub async fn simulate(State(state): State<AppState>) -> AppResult<Json<SimulateResponse>> {
    let traffic = state
        .traffic
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Test data not available".to_string()))?;

    let features = traffic
        .sample()
        .ok_or_else(|| AppError::NotFound("Test data not available".to_string()))?;

    Ok(Json(SimulateResponse { features }))
}
