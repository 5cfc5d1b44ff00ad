//! FILENAME: core/pivot-heatmap/src/record.rs
//! Source records - the typed rows a pivot table is computed from.
//!
//! A record maps field names to scalar values (number or text). Records are
//! read-only input: the engine never mutates them, and a lookup of a field
//! the record does not carry is an error instead of an implicit blank.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{PivotError, Result};

// ============================================================================
// SCALAR VALUES
// ============================================================================

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Returns the numeric payload, or None for text.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }
}

/// The token used for header labels and composite keys.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Wrapper around f64 that implements Eq and Hash so numbers can be used as
/// set members. NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            // 0.0 and -0.0 compare equal, so they must hash the same.
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// One input row: field name -> value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: FxHashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Record {
            fields: FxHashMap::default(),
        }
    }

    /// Builder-style insert, used mostly by fixtures.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Looks up `field`, failing with `FieldNotFound` for the record at
    /// `record_index` when it is missing.
    pub fn lookup(&self, record_index: usize, field: &str) -> Result<&Value> {
        self.fields.get(field).ok_or_else(|| PivotError::FieldNotFound {
            record: record_index,
            field: field.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Parses a JSON array of flat objects into records.
pub fn records_from_json(json: &str) -> Result<Vec<Record>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_tokens() {
        assert_eq!(Value::from(10).to_string(), "10");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from("East").to_string(), "East");
    }

    #[test]
    fn test_lookup_missing_field() {
        let record = Record::new().with("region", "E");
        assert_eq!(record.lookup(0, "region").unwrap(), &Value::from("E"));

        let err = record.lookup(3, "qty").unwrap_err();
        match err {
            PivotError::FieldNotFound { record, field } => {
                assert_eq!(record, 3);
                assert_eq!(field, "qty");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_records_from_json() {
        let records = records_from_json(
            r#"[{"region": "E", "qty": 10}, {"region": "W", "qty": 7.5}]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("qty"), Some(&Value::Number(10.0)));
        assert_eq!(records[1].get("region"), Some(&Value::from("W")));
    }

    #[test]
    fn test_records_reject_non_scalar() {
        assert!(records_from_json(r#"[{"flag": true}]"#).is_err());
        assert!(records_from_json(r#"[{"nested": {"a": 1}}]"#).is_err());
    }

    #[test]
    fn test_ordered_float_equality() {
        assert_eq!(OrderedFloat(f64::NAN), OrderedFloat(f64::NAN));
        assert_eq!(OrderedFloat(0.0), OrderedFloat(-0.0));
        assert_ne!(OrderedFloat(1.0), OrderedFloat(2.0));
    }
}
