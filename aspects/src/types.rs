//! Core value types
//!
//! - [`AspectValue`]: one measured aspect (number, array, or the "not found" sentinel)
//! - [`AspectOutput`]: return types an aspect compute function may declare
//! - [`ResultRow`]: one file's row in a batch result table

use serde::{Serialize, Serializer};
use std::fmt;

/// Sentinel text reported for aspects absent from the registry
pub const NOT_FOUND: &str = "not found";

/// Value of one analyzed aspect
#[derive(Debug, Clone, PartialEq)]
pub enum AspectValue {
    /// Scalar measurement
    Number(f64),
    /// Array measurement, flattened channel-major
    Array(Vec<f64>),
    /// Requested aspect is not registered (or its metric was not reported)
    NotFound,
}

impl AspectValue {
    /// Scalar value, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AspectValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Array values, if this is an array
    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            AspectValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AspectValue::NotFound)
    }
}

impl fmt::Display for AspectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspectValue::Number(value) => write!(f, "{}", value),
            AspectValue::Array(values) => {
                let json = serde_json::to_string(values).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
            AspectValue::NotFound => f.write_str(NOT_FOUND),
        }
    }
}

impl Serialize for AspectValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AspectValue::Number(value) => serializer.serialize_f64(*value),
            AspectValue::Array(values) => values.serialize(serializer),
            AspectValue::NotFound => serializer.serialize_str(NOT_FOUND),
        }
    }
}

/// Return type of an aspect compute function
///
/// `ARRAY_LIKE` plays the role of a declared array return type: registering a
/// function whose output is array-like also registers a `"<name> mean"` aspect.
pub trait AspectOutput: Send + 'static {
    /// Whether the output is array-like
    const ARRAY_LIKE: bool = false;

    fn into_value(self) -> AspectValue;

    /// Arithmetic mean over all elements (NaN for an empty array)
    fn mean(&self) -> f64 {
        f64::NAN
    }
}

impl AspectOutput for f64 {
    fn into_value(self) -> AspectValue {
        AspectValue::Number(self)
    }
}

impl AspectOutput for bool {
    fn into_value(self) -> AspectValue {
        AspectValue::Number(if self { 1.0 } else { 0.0 })
    }
}

impl AspectOutput for Option<f64> {
    fn into_value(self) -> AspectValue {
        self.map_or(AspectValue::NotFound, AspectValue::Number)
    }
}

impl AspectOutput for Vec<f64> {
    const ARRAY_LIKE: bool = true;

    fn into_value(self) -> AspectValue {
        AspectValue::Array(self)
    }

    fn mean(&self) -> f64 {
        if self.is_empty() {
            return f64::NAN;
        }
        self.iter().sum::<f64>() / self.len() as f64
    }
}

impl AspectOutput for AspectValue {
    fn into_value(self) -> AspectValue {
        self
    }
}

/// One row of a batch result table: the file followed by its aspect values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    /// File path rendered with forward slashes
    pub file: String,
    /// Values in request order
    pub values: Vec<AspectValue>,
}

impl ResultRow {
    pub fn new(file: impl Into<String>, values: Vec<AspectValue>) -> Self {
        Self {
            file: file.into(),
            values,
        }
    }

    /// Table cells: file name first, then each value
    pub fn cells(&self) -> Vec<String> {
        std::iter::once(self.file.clone())
            .chain(self.values.iter().map(|v| v.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        assert_eq!(AspectValue::NotFound.to_string(), "not found");
    }

    #[test]
    fn test_array_display_is_json_list() {
        let value = AspectValue::Array(vec![1.0, 2.5]);
        assert_eq!(value.to_string(), "[1.0,2.5]");
    }

    #[test]
    fn test_vec_mean() {
        assert_eq!(vec![1.0, 2.0, 3.0, 6.0].mean(), 3.0);
        assert!(Vec::<f64>::new().mean().is_nan());
    }

    #[test]
    fn test_option_output_maps_none_to_sentinel() {
        assert_eq!(None::<f64>.into_value(), AspectValue::NotFound);
        assert_eq!(Some(4.0).into_value(), AspectValue::Number(4.0));
    }

    #[test]
    fn test_result_row_cells() {
        let row = ResultRow::new("a/b.wav", vec![AspectValue::Number(1.5), AspectValue::NotFound]);
        assert_eq!(row.cells(), vec!["a/b.wav", "1.5", "not found"]);
    }

    #[test]
    fn test_serialize_sentinel() {
        let json = serde_json::to_string(&vec![AspectValue::Number(1.0), AspectValue::NotFound]).unwrap();
        assert_eq!(json, "[1.0,\"not found\"]");
    }
}
