use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Type tag stored next to every setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    /// Free text
    String,
    /// Any JSON number
    Number,
    /// `true` / `false`
    Boolean,
    /// Arbitrary JSON document
    Json,
}

impl SettingType {
    /// Database representation of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingType::String => "string",
            SettingType::Number => "number",
            SettingType::Boolean => "boolean",
            SettingType::Json => "json",
        }
    }

    /// Parses a tag; unknown tags are rejected.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(SettingType::String),
            "number" => Some(SettingType::Number),
            "boolean" => Some(SettingType::Boolean),
            "json" => Some(SettingType::Json),
            _ => None,
        }
    }
}

/// A typed setting value.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    /// Free text
    String(String),
    /// Numeric value, kept as a JSON number so integers stay integers
    Number(serde_json::Number),
    /// Boolean flag
    Bool(bool),
    /// Arbitrary JSON (objects, arrays, null)
    Json(Value),
}

impl SettingValue {
    /// Infers the variant from the runtime JSON type.
    pub fn infer(value: Value) -> Self {
        match value {
            Value::String(s) => SettingValue::String(s),
            Value::Number(n) => SettingValue::Number(n),
            Value::Bool(b) => SettingValue::Bool(b),
            other => SettingValue::Json(other),
        }
    }

    /// Builds a value from a request body. The runtime type wins, except that
    /// a string with an explicit non-string `type` is coerced to that type.
    pub fn from_request(value: Value, explicit: Option<&str>) -> Result<Self, ApiError> {
        let explicit = match explicit.map(str::trim).filter(|t| !t.is_empty()) {
            Some(tag) => Some(
                SettingType::parse(tag)
                    .ok_or_else(|| ApiError::invalid(format!("Unknown setting type '{}'", tag)))?,
            ),
            None => None,
        };

        match (value, explicit) {
            (Value::String(raw), Some(tag)) if tag != SettingType::String => {
                Self::decode(&raw, tag).ok_or_else(|| {
                    ApiError::invalid(format!("Value '{}' is not a valid {}", raw, tag.as_str()))
                })
            }
            (value, _) => Ok(Self::infer(value)),
        }
    }

    /// Type tag for storage.
    pub fn setting_type(&self) -> SettingType {
        match self {
            SettingValue::String(_) => SettingType::String,
            SettingValue::Number(_) => SettingType::Number,
            SettingValue::Bool(_) => SettingType::Boolean,
            SettingValue::Json(_) => SettingType::Json,
        }
    }

    /// String form stored in `settings.setting_value`.
    pub fn encode(&self) -> String {
        match self {
            SettingValue::String(s) => s.clone(),
            SettingValue::Number(n) => n.to_string(),
            SettingValue::Bool(b) => b.to_string(),
            SettingValue::Json(v) => v.to_string(),
        }
    }

    /// Decodes a stored string under its tag. Booleans accept "true" and "1";
    /// every other string is false. Numbers and JSON that fail to parse are `None`.
    pub fn decode(raw: &str, tag: SettingType) -> Option<Self> {
        match tag {
            SettingType::String => Some(SettingValue::String(raw.to_string())),
            SettingType::Number => serde_json::from_str::<serde_json::Number>(raw.trim())
                .ok()
                .map(SettingValue::Number),
            SettingType::Boolean => Some(SettingValue::Bool(matches!(raw.trim(), "true" | "1"))),
            SettingType::Json => serde_json::from_str::<Value>(raw).ok().map(SettingValue::Json),
        }
    }

    /// JSON form returned to clients.
    pub fn to_json(&self) -> Value {
        match self {
            SettingValue::String(s) => Value::String(s.clone()),
            SettingValue::Number(n) => Value::Number(n.clone()),
            SettingValue::Bool(b) => Value::Bool(*b),
            SettingValue::Json(v) => v.clone(),
        }
    }
}

/// Raw row from the `settings` table
#[derive(Debug, sqlx::FromRow)]
pub struct StoredSetting {
    /// Unique setting key
    pub setting_key: String,
    /// Encoded value
    pub setting_value: String,
    /// Type tag
    pub setting_type: String,
}

impl StoredSetting {
    /// Decodes the row, reporting values that no longer match their tag.
    pub fn decode(&self) -> Result<SettingValue, ApiError> {
        let corrupt = || ApiError::CorruptSetting {
            key: self.setting_key.clone(),
            tag: self.setting_type.clone(),
        };
        let tag = SettingType::parse(&self.setting_type).ok_or_else(corrupt)?;
        SettingValue::decode(&self.setting_value, tag).ok_or_else(corrupt)
    }

    /// JSON form for listings: a value that no longer decodes is returned
    /// as its raw string instead of failing the whole listing.
    pub fn to_json_lenient(&self) -> Value {
        match self.decode() {
            Ok(value) => value.to_json(),
            Err(e) => {
                log::warn!("⚠️ {}, returning the raw string", e);
                Value::String(self.setting_value.clone())
            }
        }
    }
}

/// Response structure for a single setting
#[derive(Debug, Serialize)]
pub struct SettingResponse {
    /// Setting key
    pub key: String,
    /// Typed value
    pub value: Value,
    /// Type tag
    #[serde(rename = "type")]
    pub setting_type: SettingType,
}

/// Request structure for updating one setting
#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
    /// New value; its JSON type decides the stored type
    #[serde(default)]
    pub value: Value,
    /// Optional explicit type, used to coerce string values
    #[serde(rename = "type")]
    pub setting_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round_trip(value: Value) -> Value {
        let typed = SettingValue::from_request(value, None).unwrap();
        let stored = typed.encode();
        SettingValue::decode(&stored, typed.setting_type())
            .unwrap()
            .to_json()
    }

    #[test]
    fn test_round_trip_preserves_each_type() {
        assert_eq!(round_trip(json!("Jai Swaminarayan")), json!("Jai Swaminarayan"));
        assert_eq!(round_trip(json!(42)), json!(42));
        assert_eq!(round_trip(json!(0.85)), json!(0.85));
        assert_eq!(round_trip(json!(true)), json!(true));
        assert_eq!(round_trip(json!(false)), json!(false));
        assert_eq!(
            round_trip(json!({"theme": "saffron", "sections": [1, 2]})),
            json!({"theme": "saffron", "sections": [1, 2]})
        );
        assert_eq!(round_trip(Value::Null), Value::Null);
    }

    #[test]
    fn test_runtime_type_decides_tag() {
        assert_eq!(
            SettingValue::infer(json!(42)).setting_type(),
            SettingType::Number
        );
        assert_eq!(
            SettingValue::infer(json!([1])).setting_type(),
            SettingType::Json
        );
        // An explicit tag never overrides a non-string runtime type
        let typed = SettingValue::from_request(json!(true), Some("number")).unwrap();
        assert_eq!(typed, SettingValue::Bool(true));
    }

    #[test]
    fn test_explicit_type_coerces_strings() {
        let typed = SettingValue::from_request(json!("42"), Some("number")).unwrap();
        assert_eq!(typed.to_json(), json!(42));

        let typed = SettingValue::from_request(json!("1"), Some("boolean")).unwrap();
        assert_eq!(typed, SettingValue::Bool(true));

        let typed = SettingValue::from_request(json!("{\"a\":1}"), Some("json")).unwrap();
        assert_eq!(typed.to_json(), json!({"a": 1}));

        assert!(SettingValue::from_request(json!("forty"), Some("number")).is_err());
        assert!(SettingValue::from_request(json!("{oops"), Some("json")).is_err());
        assert!(SettingValue::from_request(json!("x"), Some("date")).is_err());
    }

    #[test]
    fn test_boolean_decoding() {
        assert_eq!(
            SettingValue::decode("1", SettingType::Boolean),
            Some(SettingValue::Bool(true))
        );
        assert_eq!(
            SettingValue::decode("yes", SettingType::Boolean),
            Some(SettingValue::Bool(false))
        );
    }

    #[test]
    fn test_corrupt_rows_are_reported() {
        let row = StoredSetting {
            setting_key: "maxTravelers".to_string(),
            setting_value: "lots".to_string(),
            setting_type: "number".to_string(),
        };
        assert!(matches!(
            row.decode(),
            Err(ApiError::CorruptSetting { key, .. }) if key == "maxTravelers"
        ));

        let row = StoredSetting {
            setting_key: "k".to_string(),
            setting_value: "v".to_string(),
            setting_type: "mystery".to_string(),
        };
        assert!(row.decode().is_err());
    }

    #[test]
    fn test_setting_response_shape() {
        let response = SettingResponse {
            key: "answer".to_string(),
            value: json!(42),
            setting_type: SettingType::Number,
        };
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({"key": "answer", "value": 42, "type": "number"})
        );
    }

    #[test]
    fn test_undecodable_row_falls_back_to_raw_string() {
        let row = |value: &str, tag: &str| StoredSetting {
            setting_key: "legacy".to_string(),
            setting_value: value.to_string(),
            setting_type: tag.to_string(),
        };

        assert!(matches!(
            row("{not json", "json").decode(),
            Err(ApiError::CorruptSetting { .. })
        ));
        assert_eq!(row("{not json", "json").to_json_lenient(), json!("{not json"));
        assert_eq!(row("12", "colour").to_json_lenient(), json!("12"));
        assert_eq!(row("12", "number").to_json_lenient(), json!(12));
    }
}
