//! Lenient parsing for numeric and date fields sent by the front ends, which
//! post numbers either as JSON numbers or as numeric strings.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ApiError;

/// Parses an optional integer field. `null`, absent and `""` are `None`.
pub fn optional_int(name: &str, value: Option<&Value>) -> Result<Option<i64>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| {
                // 2^63 itself is out of range, so the upper bound is exclusive
                n.as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(Some)
            .ok_or_else(|| ApiError::invalid(format!("{} must be a valid number", name))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::invalid(format!("{} must be a valid number", name))),
        Some(_) => Err(ApiError::invalid(format!("{} must be a valid number", name))),
    }
}

/// Parses a mandatory integer field.
pub fn required_int(name: &str, value: Option<&Value>) -> Result<i64, ApiError> {
    optional_int(name, value)?.ok_or_else(|| ApiError::invalid(format!("{} is required", name)))
}

/// Parses a mandatory positive identifier.
pub fn required_id(name: &str, value: Option<&Value>) -> Result<i64, ApiError> {
    let id = required_int(name, value)?;
    if id <= 0 {
        return Err(ApiError::invalid(format!("Invalid {}", name)));
    }
    Ok(id)
}

/// Parses an optional floating point field.
pub fn optional_float(name: &str, value: Option<&Value>) -> Result<Option<f64>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Some)
            .ok_or_else(|| ApiError::invalid(format!("{} must be a valid number", name))),
        Some(_) => Err(ApiError::invalid(format!("{} must be a valid number", name))),
    }
}

/// Parses a `YYYY-MM-DD` date. Longer ISO timestamps are cut to their date part.
pub fn parse_date(name: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| ApiError::invalid(format!("{} must be a date in YYYY-MM-DD format", name)))
}

/// Parses an optional date string; empty strings are `None`.
pub fn optional_date(name: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_date(name, raw).map(Some),
        None => Ok(None),
    }
}

/// Trims a text field and turns empty strings into `None`.
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reads a free-text field that may also arrive as a number (room `101`).
/// `null`, absent and blank strings are `None`.
pub fn optional_text(name: &str, value: Option<&Value>) -> Result<Option<String>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(non_empty(Some(s.as_str()))),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(ApiError::invalid(format!("{} must be text", name))),
    }
}

/// Parses a query-string integer such as `?hotelId=3`.
pub fn query_int(name: &str, raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    optional_int(name, raw.map(|s| Value::String(s.to_string())).as_ref())
}

/// Serde helper telling "field sent as null" apart from "field absent":
/// with `#[serde(default, deserialize_with = "present")]` an absent field is
/// `None` and an explicit `null` is `Some(Value::Null)`.
pub fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Reads an `i32` out of a parsed integer.
pub fn to_i32(name: &str, value: i64) -> Result<i32, ApiError> {
    i32::try_from(value).map_err(|_| ApiError::invalid(format!("{} is out of range", name)))
}
