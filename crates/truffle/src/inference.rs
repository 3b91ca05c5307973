//! Classify sample values into column types.
use lazy_static::lazy_static;

use truffle_datastore::DataType;

use crate::value::Value;

lazy_static! {
    /// Decimal numbers as text: surrounding whitespace, a sign, digits with an optional fraction or a bare fraction,
    /// and an exponent.
    static ref NUMERIC_TEXT: regex::Regex =
        regex::Regex::new(r"^[ \t\n\r\x0B\x0C]*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?[ \t\n\r\x0B\x0C]*$")
            .expect("numeric text regex should compile");
}

fn is_integral(value: &Value) -> bool {
    matches!(value, Value::Integer(_))
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Integer(_) | Value::Float(_) => true,
        Value::Text(t) => is_numeric_text(t),
        _ => false,
    }
}

fn is_text(value: &Value) -> bool {
    matches!(value, Value::Text(_))
}

fn is_date_time(value: &Value) -> bool {
    matches!(value, Value::DateTime(_))
}

/// Checked in order; the first match wins.
const RULES: &[(fn(&Value) -> bool, DataType)] = &[
    (is_integral, DataType::Integer),
    (is_numeric, DataType::Float),
    (is_text, DataType::String),
    (is_date_time, DataType::DateTime),
];

/// The column type for a sample value.
///
/// Anything no rule matches is a string: nulls, booleans and composites.  Composites are stored as JSON text.
pub fn classify(value: &Value) -> DataType {
    RULES
        .iter()
        .find(|(rule, _)| rule(value))
        .map(|(_, data_type)| *data_type)
        .unwrap_or(DataType::String)
}

/// Whether text would be read as a number.
pub fn is_numeric_text(text: &str) -> bool {
    NUMERIC_TEXT.is_match(text)
}
