//! Inference - Feature record to label, confidence and status
//!
//! Applies exactly the preprocessing recorded in the bundle: encoders (index-0 fallback
//! for unknown categories), selection into the bundle's feature order, scaler, model.

use std::path::Path;

use ndarray::Array2;
use serde::Serialize;

use crate::constants::{BENIGN_LABEL, STATUS_SAFE, STATUS_THREAT};
use crate::error::{DetectError, DetectResult};
use crate::logic::bundle::{ArtifactBundle, BundleHeader};
use crate::logic::features::{encode_record, FeatureLayout};
use crate::models::FeatureRecord;

/// Result of classifying one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    /// Highest class probability of the row
    pub confidence: f64,
    pub status: &'static str,
}

/// `"Safe"` only for the exact benign label
pub fn status_for(label: &str) -> &'static str {
    if label == BENIGN_LABEL {
        STATUS_SAFE
    } else {
        STATUS_THREAT
    }
}

/// Read-only classifier built from a loaded bundle
#[derive(Debug)]
pub struct Detector {
    bundle: ArtifactBundle,
    layout: FeatureLayout,
    bundle_id: Option<String>,
}

impl Detector {
    pub fn new(bundle: ArtifactBundle) -> Self {
        let layout = bundle.layout();
        Self {
            bundle,
            layout,
            bundle_id: None,
        }
    }

    /// Load and verify the bundle at `path`
    pub fn load(path: &Path) -> DetectResult<Self> {
        let (header, bundle) = ArtifactBundle::load(path)?;
        Ok(Self::from_parts(header, bundle))
    }

    pub fn from_parts(header: BundleHeader, bundle: ArtifactBundle) -> Self {
        let mut detector = Self::new(bundle);
        detector.bundle_id = Some(header.bundle_id);
        detector
    }

    /// Accuracy recorded at training time
    pub fn accuracy(&self) -> f64 {
        self.bundle.accuracy
    }

    pub fn bundle_id(&self) -> Option<&str> {
        self.bundle_id.as_deref()
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    /// Encoded and scaled single-row matrix for `record`
    pub fn vectorize(&self, record: &FeatureRecord) -> DetectResult<Array2<f64>> {
        let row = encode_record(record, &self.layout, &self.bundle.encoders)?;
        let x = Array2::from_shape_vec((1, row.len()), row)?;
        let scaled = self.bundle.scaler.transform(&x)?;

        if let Some(j) = scaled.iter().position(|v| !v.is_finite()) {
            return Err(DetectError::InvalidFeature {
                feature: self.layout.feature_names[j].clone(),
                value: "not finite after scaling".to_string(),
            });
        }
        Ok(scaled)
    }

    pub fn predict(&self, record: &FeatureRecord) -> DetectResult<Prediction> {
        let x = self.vectorize(record)?;

        let label = self
            .bundle
            .model
            .predict(&x)?
            .into_iter()
            .next()
            .ok_or_else(|| DetectError::Model("model returned no prediction".to_string()))?;

        let proba = self.bundle.model.predict_proba(&x)?;
        let confidence = proba.row(0).iter().cloned().fold(0.0_f64, f64::max);

        Ok(Prediction {
            status: status_for(&label),
            label,
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::{EncoderRegistry, StandardScaler};
    use crate::logic::model::{ModelConfig, ModelKind, TrainedModel};
    use crate::models::FeatureValue;
    use ndarray::array;

    /// protocol_type (categorical) + src_bytes; "udp" traffic with large payloads is an attack
    fn detector() -> Detector {
        let encoders = EncoderRegistry::fit(vec![(
            "protocol_type",
            vec!["tcp".to_string(), "udp".to_string()],
        )]);
        // Encoded: tcp = 0, udp = 1
        let x = array![[0.0, 100.0], [0.0, 120.0], [0.0, 90.0], [1.0, 9000.0], [1.0, 9500.0], [1.0, 8800.0]];
        let labels: Vec<String> = ["normal", "normal", "normal", "smurf", "smurf", "smurf"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let (scaler, scaled) = StandardScaler::fit_transform(&x).unwrap();
        let model = TrainedModel::fit(ModelKind::NaiveBayes, &ModelConfig::default(), &scaled, &labels).unwrap();
        let layout = FeatureLayout::new(
            vec!["protocol_type".into(), "src_bytes".into()],
            vec!["protocol_type".into()],
        );
        Detector::new(ArtifactBundle::new(model, scaler, encoders, layout, 0.97))
    }

    fn record(protocol: &str, src_bytes: f64) -> FeatureRecord {
        let mut record = FeatureRecord::new();
        record.insert("protocol_type".into(), FeatureValue::from(protocol));
        record.insert("src_bytes".into(), FeatureValue::from(src_bytes));
        record
    }

    #[test]
    fn test_status_for() {
        assert_eq!(status_for("normal"), "Safe");
        assert_eq!(status_for("neptune"), "Threat Detected");
        // Exact match only
        assert_eq!(status_for("Normal"), "Threat Detected");
    }

    #[test]
    fn test_predict_safe_and_threat() {
        let detector = detector();

        let safe = detector.predict(&record("tcp", 105.0)).unwrap();
        assert_eq!(safe.label, "normal");
        assert_eq!(safe.status, "Safe");
        assert!(safe.confidence > 0.5 && safe.confidence <= 1.0);

        let threat = detector.predict(&record("udp", 9100.0)).unwrap();
        assert_eq!(threat.label, "smurf");
        assert_eq!(threat.status, "Threat Detected");
    }

    #[test]
    fn test_unknown_category_uses_index_zero() {
        let detector = detector();
        let unknown = detector.vectorize(&record("sctp", 105.0)).unwrap();
        let tcp = detector.vectorize(&record("tcp", 105.0)).unwrap();
        assert_eq!(unknown, tcp);
    }

    #[test]
    fn test_missing_feature_is_an_error() {
        let detector = detector();
        let mut incomplete = record("tcp", 1.0);
        incomplete.remove("src_bytes");
        assert!(matches!(
            detector.predict(&incomplete),
            Err(DetectError::MissingFeature(ref name)) if name == "src_bytes"
        ));
    }

    #[test]
    fn test_accuracy_and_layout() {
        let detector = detector();
        assert_eq!(detector.accuracy(), 0.97);
        assert_eq!(detector.layout().feature_names, vec!["protocol_type", "src_bytes"]);
        assert!(detector.bundle_id().is_none());
    }
}
