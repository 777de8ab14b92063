//! Coercion of raw textual and JSON values to scalar field types.
//!
//! Lists and nested schemas are handled by the binder, which needs to
//! report item and member errors under their own paths.

use crate::field::FieldType;
use crate::value::Value;

const TRUE_LITERALS: [&str; 5] = ["true", "1", "yes", "on", "t"];
const FALSE_LITERALS: [&str; 5] = ["false", "0", "no", "off", "f"];

/// Coerces a textual value (path, query, header, cookie, form) to a scalar type.
pub(crate) fn coerce_text(raw: &str, ty: &FieldType) -> Result<Value, String> {
    match ty {
        FieldType::Int => parse_int(raw).map(Value::Int),
        FieldType::Float => parse_float(raw).map(Value::Float),
        FieldType::Bool => parse_bool(raw).map(Value::Bool),
        FieldType::String => Ok(Value::String(raw.to_string())),
        FieldType::Enum(members) => parse_member(raw, members),
        FieldType::List(_) | FieldType::Nested(_) => Err(format!(
            "Input should be a valid {}",
            ty.type_name()
        )),
    }
}

/// Coerces a JSON value to a scalar type.
///
/// JSON strings fall back to the textual rules for numbers and booleans,
/// so `"42"` binds to an `Int` field.
pub(crate) fn coerce_json(raw: &serde_json::Value, ty: &FieldType) -> Result<Value, String> {
    use serde_json::Value as Json;

    match (ty, raw) {
        (FieldType::Int, Json::Number(n)) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| "Input should be a valid integer".to_string()),
        (FieldType::Float, Json::Number(n)) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .map(Value::Float)
            .ok_or_else(|| "Input should be a finite number".to_string()),
        (FieldType::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (FieldType::Bool, Json::Number(n)) => match n.as_i64() {
            Some(0) => Ok(Value::Bool(false)),
            Some(1) => Ok(Value::Bool(true)),
            _ => Err("Input should be a valid boolean".to_string()),
        },
        (_, Json::String(s)) => coerce_text(s, ty),
        (ty, other) => Err(format!(
            "Input should be a valid {}, got {}",
            ty.type_name(),
            json_type_name(other)
        )),
    }
}

/// Strict decimal: optional sign followed by ASCII digits only.
pub(crate) fn parse_int(raw: &str) -> Result<i64, String> {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err("Input should be a valid integer, unable to parse string as an integer".to_string());
    }
    raw.parse::<i64>()
        .map_err(|_| "Input should be a valid integer, number out of range".to_string())
}

pub(crate) fn parse_float(raw: &str) -> Result<f64, String> {
    // f64::from_str also accepts "inf" and "NaN"; those are not numbers here.
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err("Input should be a valid number, unable to parse string as a number".to_string()),
    }
}

pub(crate) fn parse_bool(raw: &str) -> Result<bool, String> {
    let lowered = raw.to_ascii_lowercase();
    if TRUE_LITERALS.contains(&lowered.as_str()) {
        Ok(true)
    } else if FALSE_LITERALS.contains(&lowered.as_str()) {
        Ok(false)
    } else {
        Err("Input should be a valid boolean, unable to interpret input".to_string())
    }
}

fn parse_member(raw: &str, members: &[String]) -> Result<Value, String> {
    if members.iter().any(|m| m == raw) {
        Ok(Value::String(raw.to_string()))
    } else {
        let quoted: Vec<String> = members.iter().map(|m| format!("'{}'", m)).collect();
        Err(format!("Input should be {}", quoted.join(", ")))
    }
}

pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
