//! Artifact Bundle - Trained model plus its preprocessing state, in one file
//!
//! ## File layout
//! Line 1 is a [`BundleHeader`] as compact JSON. Everything after the first newline is
//! the payload JSON. The header records the schema version, the layout hash of the
//! payload's feature order and a SHA-256 of the payload bytes.
//!
//! ## Load checks
//! 1. Format tag and schema version must match this build
//! 2. Payload checksum must match the header
//! 3. Layout hash must match the payload's feature order
//! 4. Scaler width, categorical columns and encoders must agree with the feature order

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{DetectError, DetectResult};
use crate::logic::features::{validate_layout, EncoderRegistry, FeatureLayout, StandardScaler, SCHEMA_VERSION};
use crate::logic::model::TrainedModel;

/// Format tag written in every header
pub const BUNDLE_FORMAT: &str = "threat-detect-bundle";

// ============================================================================
// HEADER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleHeader {
    pub format: String,
    pub schema_version: u32,
    pub bundle_id: String,
    pub created_at: i64, // Unix timestamp
    pub layout_hash: u32,
    /// SHA-256 of the payload bytes, hex
    pub checksum: String,
}

// ============================================================================
// BUNDLE
// ============================================================================

/// Immutable snapshot of everything the service needs to classify a record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub model: TrainedModel,
    pub scaler: StandardScaler,
    pub encoders: EncoderRegistry,
    pub feature_names: Vec<String>,
    pub categorical_cols: Vec<String>,
    /// Held-out accuracy measured at training time
    pub accuracy: f64,
}

impl ArtifactBundle {
    pub fn new(
        model: TrainedModel,
        scaler: StandardScaler,
        encoders: EncoderRegistry,
        layout: FeatureLayout,
        accuracy: f64,
    ) -> Self {
        Self {
            model,
            scaler,
            encoders,
            feature_names: layout.feature_names,
            categorical_cols: layout.categorical_cols,
            accuracy,
        }
    }

    pub fn layout(&self) -> FeatureLayout {
        FeatureLayout::new(self.feature_names.clone(), self.categorical_cols.clone())
    }

    /// Write the bundle, creating parent directories as needed
    pub fn save(&self, path: &Path) -> DetectResult<BundleHeader> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let payload = serde_json::to_vec(self)?;
        let header = BundleHeader {
            format: BUNDLE_FORMAT.to_string(),
            schema_version: SCHEMA_VERSION,
            bundle_id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().timestamp(),
            layout_hash: self.layout().hash(),
            checksum: checksum(&payload),
        };

        let mut bytes = serde_json::to_vec(&header)?;
        bytes.push(b'\n');
        bytes.extend_from_slice(&payload);
        fs::write(path, bytes)?;

        info!(
            path = %path.display(),
            bundle_id = %header.bundle_id,
            features = self.feature_names.len(),
            "Artifact bundle saved"
        );
        Ok(header)
    }

    /// Read and verify a bundle
    pub fn load(path: &Path) -> DetectResult<(BundleHeader, Self)> {
        if !path.exists() {
            return Err(DetectError::InputNotFound(path.display().to_string()));
        }

        let data = fs::read(path)?;
        let (header, bundle) = Self::from_bytes(&data)?;

        info!(
            path = %path.display(),
            bundle_id = %header.bundle_id,
            model = %bundle.model.kind,
            accuracy = bundle.accuracy,
            "Artifact bundle loaded"
        );
        Ok((header, bundle))
    }

    fn from_bytes(data: &[u8]) -> DetectResult<(BundleHeader, Self)> {
        let split = data
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| DetectError::BundleFormat("missing header line".to_string()))?;
        let (header_bytes, payload) = (&data[..split], &data[split + 1..]);

        let header: BundleHeader = serde_json::from_slice(header_bytes)
            .map_err(|e| DetectError::BundleFormat(format!("unreadable header: {}", e)))?;

        if header.format != BUNDLE_FORMAT {
            return Err(DetectError::BundleFormat(format!("unexpected format tag '{}'", header.format)));
        }
        if header.schema_version != SCHEMA_VERSION {
            return Err(DetectError::BundleVersion {
                expected: SCHEMA_VERSION,
                found: header.schema_version,
            });
        }

        let actual = checksum(payload);
        if actual != header.checksum {
            return Err(DetectError::ChecksumMismatch {
                expected: header.checksum,
                actual,
            });
        }

        let bundle: ArtifactBundle = serde_json::from_slice(payload)?;
        validate_layout(&bundle.layout(), header.layout_hash)?;
        bundle.check_consistency()?;

        Ok((header, bundle))
    }

    fn check_consistency(&self) -> DetectResult<()> {
        if self.scaler.n_features() != self.feature_names.len() {
            return Err(DetectError::BundleFormat(format!(
                "scaler covers {} features, layout has {}",
                self.scaler.n_features(),
                self.feature_names.len()
            )));
        }
        for col in &self.categorical_cols {
            if !self.feature_names.contains(col) {
                return Err(DetectError::BundleFormat(format!("categorical column '{}' not in layout", col)));
            }
            if self.encoders.get(col).is_none() {
                return Err(DetectError::BundleFormat(format!("no encoder for column '{}'", col)));
            }
        }
        Ok(())
    }
}

fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
