//! Error handling

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type DetectResult<T> = Result<T, DetectError>;

/// Errors raised by the training and inference pipeline
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Error: {0} not found.")]
    InputNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] polars::prelude::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Missing feature: {0}")]
    MissingFeature(String),

    #[error("Invalid value for feature '{feature}': {value}")]
    InvalidFeature { feature: String, value: String },

    #[error("Unknown category '{value}' for column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Model not fitted")]
    NotFitted,

    #[error("Model error: {0}")]
    Model(String),

    #[error("Invalid bundle: {0}")]
    BundleFormat(String),

    #[error("Bundle schema version {found} is not supported (expected {expected})")]
    BundleVersion { expected: u32, found: u32 },

    #[error("Bundle checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Feature layout mismatch: expected hash {expected:08x}, got {actual:08x}")]
    LayoutMismatch { expected: u32, actual: u32 },
}

impl From<ndarray::ShapeError> for DetectError {
    fn from(err: ndarray::ShapeError) -> Self {
        DetectError::ShapeMismatch {
            expected: "consistent array shape".to_string(),
            actual: err.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced by the HTTP handlers
#[derive(Debug)]
pub enum AppError {
    // Resource errors
    NotFound(String),

    // Bundle failed to load at startup
    ModelUnavailable,

    // Request body could not be read as the expected JSON
    InvalidRequest { status: StatusCode, detail: String },

    // Preprocessing or inference failed for a request
    Prediction(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidRequest { status, .. } => *status,
            AppError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            AppError::NotFound(msg) => msg,
            AppError::ModelUnavailable => "Model not loaded".to_string(),
            AppError::InvalidRequest { detail, .. } => {
                tracing::debug!("Rejected request body: {}", detail);
                detail
            }
            AppError::Prediction(msg) => {
                tracing::error!("Prediction error: {}", msg);
                msg
            }
        };

        error_body(status, detail)
    }
}

impl From<DetectError> for AppError {
    fn from(err: DetectError) -> Self {
        AppError::Prediction(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

/// JSON error body shared by handlers and the panic layer
pub fn error_body(status: StatusCode, detail: String) -> Response {
    let body = Json(json!({
        "detail": detail,
        "status": status.as_u16()
    }));

    (status, body).into_response()
}
