//! Query result types for sqlrun.
//!
//! Defines the structures decoded from the executor payload's result
//! document.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the result of executing a SQL statement.
///
/// `columns` is `None` when the statement produced no result set
/// (DDL, inserts, updates and the like).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names, if the statement returned a result set.
    #[serde(default)]
    pub columns: Option<Vec<String>>,

    /// Rows of data.
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl ResultSet {
    /// Creates a result for a statement with no result set.
    pub fn command() -> Self {
        Self::default()
    }

    /// Creates a result set with the given columns and rows.
    pub fn with_data(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns: Some(columns),
            rows,
        }
    }

    /// Number of rows returned.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Parses a result document printed by the executor payload.
    ///
    /// Returns `None` when `text` is not a result document.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if !trimmed.starts_with('{') {
            return None;
        }
        serde_json::from_str(trimmed).ok()
    }
}

/// Per-batch outcome document printed when the payload replays a script.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BatchReport {
    /// One status per batch, in execution order.
    pub batches: Vec<BatchStatus>,
}

/// Outcome of a single batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchStatus {
    pub ok: bool,

    /// Driver error message when `ok` is false.
    #[serde(default)]
    pub error: Option<String>,
}

impl BatchReport {
    /// Parses a batch report printed by the executor payload.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text.trim()).ok()
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Represents a single value from a database query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text value. Dates, decimals and binary data arrive as text.
    String(String),
}

impl Value {
    /// Converts the value to its display representation.
    ///
    /// Booleans and floats follow the driver side's `str()` spelling
    /// (`True`, `1e+16`), so tables read the same whichever side converted
    /// the cell.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => float_string(*f),
            Value::String(s) => s.clone(),
        }
    }
}

/// Formats a float as shortest round-trip digits with a signed, two-digit
/// minimum exponent.
fn float_string(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    let repr = format!("{f:?}");
    let Some((mantissa, exponent)) = repr.split_once('e') else {
        return repr;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

// Conversion implementations for common types
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
