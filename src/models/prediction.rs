//! Request/response models for the inference API

use serde::{Deserialize, Serialize};

use super::feature::FeatureRecord;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub features: FeatureRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    pub prediction: String,
    pub confidence: f64,
    pub status: String,
}

/// Accuracy recorded at training time, or a marker when no bundle is loaded
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ModelAccuracy {
    Measured(f64),
    Unavailable(&'static str),
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub model_accuracy: ModelAccuracy,
}

#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    pub features: FeatureRecord,
}
