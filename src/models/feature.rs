//! Feature record model

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MISSING_TEXT;

/// One raw cell of a feature record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Bool(bool),
    Text(String),
    /// JSON `null`, or an empty numeric cell
    Missing,
}

impl FeatureValue {
    /// Value as a category string; numbers are rendered without a trailing `.0`
    pub fn as_category(&self) -> String {
        match self {
            FeatureValue::Number(v) => v.to_string(),
            FeatureValue::Bool(b) => b.to_string(),
            FeatureValue::Text(s) => s.clone(),
            FeatureValue::Missing => MISSING_TEXT.to_string(),
        }
    }

    /// Finite numeric value, parsing text when needed.
    ///
    /// `None` for missing values, unparsable text, NaN and infinities.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            FeatureValue::Number(v) => *v,
            FeatureValue::Bool(b) => f64::from(u8::from(*b)),
            FeatureValue::Text(s) => s.trim().parse().ok()?,
            FeatureValue::Missing => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(v) => write!(f, "{}", v),
            FeatureValue::Bool(b) => write!(f, "{}", b),
            FeatureValue::Text(s) => write!(f, "{}", s),
            FeatureValue::Missing => f.write_str("null"),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Number(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        FeatureValue::Text(s.to_string())
    }
}

/// Column name -> raw value
pub type FeatureRecord = BTreeMap<String, FeatureValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_deserialize() {
        let record: FeatureRecord =
            serde_json::from_str(r#"{"duration": 0, "protocol_type": "tcp", "rate": 0.5}"#).unwrap();
        assert_eq!(record["duration"], FeatureValue::Number(0.0));
        assert_eq!(record["protocol_type"], FeatureValue::Text("tcp".into()));
        assert_eq!(record["rate"], FeatureValue::Number(0.5));
    }

    #[test]
    fn test_as_category_drops_integer_fraction() {
        assert_eq!(FeatureValue::Number(5.0).as_category(), "5");
        assert_eq!(FeatureValue::Number(2.5).as_category(), "2.5");
        assert_eq!(FeatureValue::Text("http".into()).as_category(), "http");
    }

    #[test]
    fn test_as_number_parses_text() {
        assert_eq!(FeatureValue::Text(" 12 ".into()).as_number(), Some(12.0));
        assert_eq!(FeatureValue::Text("tcp".into()).as_number(), None);
        assert_eq!(FeatureValue::Bool(true).as_number(), Some(1.0));
    }

    #[test]
    fn test_as_number_rejects_non_finite() {
        for text in ["nan", "NaN", "inf", "-inf", "infinity"] {
            assert_eq!(FeatureValue::Text(text.into()).as_number(), None, "{}", text);
        }
        assert_eq!(FeatureValue::Number(f64::INFINITY).as_number(), None);
        assert_eq!(FeatureValue::Missing.as_number(), None);
    }

    #[test]
    fn test_null_and_bool_deserialize() {
        let record: FeatureRecord =
            serde_json::from_str(r#"{"duration": null, "land": false, "service": "http"}"#).unwrap();
        assert_eq!(record["duration"], FeatureValue::Missing);
        assert_eq!(record["land"], FeatureValue::Bool(false));
        assert_eq!(record["service"], FeatureValue::Text("http".into()));

        assert_eq!(serde_json::to_string(&FeatureValue::Missing).unwrap(), "null");
        assert_eq!(FeatureValue::Missing.as_category(), "nan");
    }
}
