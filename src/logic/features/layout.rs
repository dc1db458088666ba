//! Feature Layout - Ordered feature contract between training and serving
//!
//! ## Rules
//! 1. The order of `feature_names` is the column order the scaler and model were fit on
//! 2. Any change of order, names or schema version changes the layout hash
//! 3. A bundle whose recorded hash does not match its own layout is rejected

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::error::{DetectError, DetectResult};

// ============================================================================
// SCHEMA VERSION
// ============================================================================

/// Artifact bundle schema version.
/// MUST be incremented when the bundle payload or the preprocessing contract changes.
pub const SCHEMA_VERSION: u32 = 1;

// ============================================================================
// LAYOUT
// ============================================================================

/// Ordered feature names plus the subset that is categorical
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLayout {
    pub feature_names: Vec<String>,
    pub categorical_cols: Vec<String>,
}

impl FeatureLayout {
    pub fn new(feature_names: Vec<String>, categorical_cols: Vec<String>) -> Self {
        Self { feature_names, categorical_cols }
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_categorical(&self, name: &str) -> bool {
        self.categorical_cols.iter().any(|c| c == name)
    }

    pub fn hash(&self) -> u32 {
        compute_layout_hash(&self.feature_names)
    }
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over the schema version and the ordered feature names
pub fn compute_layout_hash<S: AsRef<str>>(feature_names: &[S]) -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&SCHEMA_VERSION.to_le_bytes());

    for name in feature_names {
        hasher.update(name.as_ref().as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Validate a recorded hash against the layout it claims to describe
pub fn validate_layout(layout: &FeatureLayout, recorded_hash: u32) -> DetectResult<()> {
    let actual = layout.hash();
    if actual != recorded_hash {
        return Err(DetectError::LayoutMismatch {
            expected: recorded_hash,
            actual,
        });
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
