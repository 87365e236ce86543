//! Tolerant deserializers for marketplace payloads.
//!
//! The marketplace API is inconsistent about field presence and types: the
//! same field can be missing, `null`, a number, or a string depending on the
//! endpoint and the age of the record. These helpers make a bad field
//! degrade to its default value instead of failing the whole record.
//!
//! Use them together with `#[serde(default)]` so that absent fields are also
//! covered:
//!
//! ```rust
//! use meli_pulse_core::types::lenient;
//! use rust_decimal::Decimal;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Row {
//!     #[serde(default, deserialize_with = "lenient::value")]
//!     amount: Decimal,
//! }
//!
//! let row: Row = serde_json::from_str(r#"{"amount": "not a number"}"#).unwrap();
//! assert_eq!(row.amount, Decimal::ZERO);
//! ```

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize any value, falling back to `T::default()` on a type mismatch.
///
/// # Errors
///
/// Only fails if the input itself is not valid JSON.
pub fn value<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_default())
}

/// Deserialize a list, keeping the elements that parse and dropping the rest.
///
/// A non-array value yields an empty list.
///
/// # Errors
///
/// Only fails if the input itself is not valid JSON.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    let Value::Array(entries) = raw else {
        return Ok(Vec::new());
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

/// Deserialize an optional string, accepting numbers and discarding blanks.
///
/// # Errors
///
/// Only fails if the input itself is not valid JSON.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(raw))
}

/// Deserialize a required identifier that may arrive as a string or a number.
///
/// # Errors
///
/// Returns an error if the value is missing, blank, or not a scalar.
pub fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    scalar_to_string(raw).ok_or_else(|| D::Error::custom("expected a string or numeric id"))
}

fn scalar_to_string(raw: Value) -> Option<String> {
    match raw {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
