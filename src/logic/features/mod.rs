//! Features Module - Preprocessing contract
//!
//! Turns tables (training) and feature records (serving) into encoded matrices in the
//! layout order. Scaling is applied afterwards by [`StandardScaler`].

pub mod encoder;
pub mod layout;
pub mod scaler;

#[cfg(test)]
mod tests;

use ndarray::Array2;

use crate::error::{DetectError, DetectResult};
use crate::logic::dataset::{ColumnData, Table};
use crate::models::FeatureRecord;

pub use encoder::{EncoderRegistry, LabelEncoder};
pub use layout::{compute_layout_hash, validate_layout, FeatureLayout, SCHEMA_VERSION};
pub use scaler::StandardScaler;

/// Fit the registry on the pooled values of every categorical column of both splits
pub fn fit_encoders(train: &Table, held_out: &Table, layout: &FeatureLayout) -> DetectResult<EncoderRegistry> {
    let pooled = layout
        .categorical_cols
        .iter()
        .map(|name| {
            let mut values = column_strings(train, name)?;
            values.extend(column_strings(held_out, name)?);
            Ok((name.as_str(), values))
        })
        .collect::<DetectResult<Vec<_>>>()?;

    Ok(EncoderRegistry::fit(pooled))
}

fn column_strings(table: &Table, name: &str) -> DetectResult<Vec<String>> {
    table
        .column(name)
        .map(|c| c.data.to_strings())
        .ok_or_else(|| DetectError::ColumnNotFound(name.to_string()))
}

/// Encode a training table; every category must already be known to the registry and
/// every numeric cell must be finite
pub fn encode_table(table: &Table, layout: &FeatureLayout, registry: &EncoderRegistry) -> DetectResult<Array2<f64>> {
    let n_rows = table.n_rows();
    let n_cols = layout.feature_count();
    let mut x = Array2::<f64>::zeros((n_rows, n_cols));

    for (j, name) in layout.feature_names.iter().enumerate() {
        let column = table
            .column(name)
            .ok_or_else(|| DetectError::ColumnNotFound(name.clone()))?;

        match &column.data {
            ColumnData::Text(values) if layout.is_categorical(name) => {
                for (i, value) in values.iter().enumerate() {
                    x[[i, j]] = registry.transform(name, value)? as f64;
                }
            }
            ColumnData::Numeric(values) if !layout.is_categorical(name) => {
                for (i, value) in values.iter().enumerate() {
                    if !value.is_finite() {
                        return Err(DetectError::InvalidFeature {
                            feature: name.clone(),
                            value: format!("missing or non-finite value in row {}", i + 1),
                        });
                    }
                    x[[i, j]] = *value;
                }
            }
            _ => {
                return Err(DetectError::InvalidFeature {
                    feature: name.clone(),
                    value: "column type differs from the training layout".to_string(),
                })
            }
        }
    }

    Ok(x)
}

/// Encode one record in layout order.
///
/// Categorical values go through the registry with the index-0 fallback and columns not
/// in the layout are ignored. A missing layout column is an error, as is a numeric value
/// that is null, unparsable or not finite.
pub fn encode_record(record: &FeatureRecord, layout: &FeatureLayout, registry: &EncoderRegistry) -> DetectResult<Vec<f64>> {
    layout
        .feature_names
        .iter()
        .map(|name| {
            let value = record
                .get(name)
                .ok_or_else(|| DetectError::MissingFeature(name.clone()))?;

            if layout.is_categorical(name) {
                let code = registry.encode_or_default(name, &value.as_category())?;
                Ok(code as f64)
            } else {
                value.as_number().ok_or_else(|| DetectError::InvalidFeature {
                    feature: name.clone(),
                    value: value.to_string(),
                })
            }
        })
        .collect()
}
