//! Label encoding for categorical columns

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, DetectResult};

/// Sorted set of known categories for one column; a category's code is its position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes: Vec<String> = values.into_iter().map(|v| v.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Code of a known category
    pub fn transform(&self, value: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(value)).ok()
    }

    /// Code of `value`, or 0 when it was never seen at fit time.
    ///
    /// Unknown categories collide with whatever category sorts first.
    pub fn encode_or_default(&self, value: &str) -> usize {
        self.transform(value).unwrap_or(0)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn contains(&self, value: &str) -> bool {
        self.transform(value).is_some()
    }
}

/// Per-column label encoders, built once at training time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncoderRegistry {
    encoders: BTreeMap<String, LabelEncoder>,
}

impl EncoderRegistry {
    /// Fit one encoder per column from the given `(column, values)` pairs
    pub fn fit<'a, I>(columns: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Vec<String>)>,
    {
        let encoders = columns
            .into_iter()
            .map(|(name, values)| (name.to_string(), LabelEncoder::fit(values)))
            .collect();
        Self { encoders }
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    /// Strict lookup used on training data, where every value is known
    pub fn transform(&self, column: &str, value: &str) -> DetectResult<usize> {
        let encoder = self
            .get(column)
            .ok_or_else(|| DetectError::ColumnNotFound(column.to_string()))?;
        encoder.transform(value).ok_or_else(|| DetectError::UnknownCategory {
            column: column.to_string(),
            value: value.to_string(),
        })
    }

    /// Serving-time lookup with the index-0 fallback for unknown values
    pub fn encode_or_default(&self, column: &str, value: &str) -> DetectResult<usize> {
        let encoder = self
            .get(column)
            .ok_or_else(|| DetectError::ColumnNotFound(column.to_string()))?;

        if !encoder.contains(value) {
            tracing::debug!(column, value, "Unknown category, falling back to index 0");
        }
        Ok(encoder.encode_or_default(value))
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_sorted_order() {
        let encoder = LabelEncoder::fit(["udp", "tcp", "icmp", "tcp"]);
        assert_eq!(encoder.classes(), &["icmp", "tcp", "udp"]);
        assert_eq!(encoder.transform("icmp"), Some(0));
        assert_eq!(encoder.transform("tcp"), Some(1));
        assert_eq!(encoder.transform("udp"), Some(2));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let encoder = LabelEncoder::fit(["http", "ftp", "smtp"]);
        let first = encoder.transform("smtp");
        for _ in 0..10 {
            assert_eq!(encoder.transform("smtp"), first);
        }
    }

    #[test]
    fn test_unknown_falls_back_to_zero() {
        let encoder = LabelEncoder::fit(["SF", "S0", "REJ"]);
        assert_eq!(encoder.transform("OTH"), None);
        assert_eq!(encoder.encode_or_default("OTH"), 0);
        assert_eq!(encoder.encode_or_default("SF"), 2);
    }

    #[test]
    fn test_registry_strict_and_fallback() {
        let registry = EncoderRegistry::fit(vec![
            ("protocol_type", vec!["tcp".to_string(), "udp".to_string()]),
            ("flag", vec!["SF".to_string()]),
        ]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.transform("protocol_type", "udp").unwrap(), 1);
        assert!(matches!(
            registry.transform("protocol_type", "icmp"),
            Err(DetectError::UnknownCategory { .. })
        ));
        assert_eq!(registry.encode_or_default("protocol_type", "icmp").unwrap(), 0);
        assert!(registry.encode_or_default("service", "http").is_err());
    }
}
