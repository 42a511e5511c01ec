//! Runtime values and the typed literal a value variable stores.
//!
//! [`Value`] is what the evaluator computes with. It follows the host
//! language's coercion rules closely enough that a preview matches what a
//! renderer would compute. [`VariableValue`] is the narrower, serialisable
//! shape a value variable persists.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    /// Properties in insertion order.
    Object(Vec<(String, Value)>),
}

/// The typed literal stored by a value variable or a literal prop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum VariableValue {
    String(String),
    Number(f64),
    Boolean(bool),
    /// `null`, arrays and objects.
    Json(serde_json::Value),
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl Value {
    /// Build a value from JSON.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON the way `JSON.stringify` would: non-finite numbers
    /// become `null`, undefined array items become `null` and undefined
    /// object properties are dropped. Returns `None` for a bare `undefined`.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        let json = match self {
            Value::Undefined => return None,
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|item| item.to_json().unwrap_or(serde_json::Value::Null))
                    .collect(),
            ),
            Value::Object(props) => serde_json::Value::Object(
                props
                    .iter()
                    .filter_map(|(k, v)| v.to_json().map(|json| (k.clone(), json)))
                    .collect(),
            ),
        };
        Some(json)
    }

    /// Narrow to the literal shape a value variable stores.
    pub fn into_variable_value(self) -> Option<VariableValue> {
        match self {
            Value::Undefined => None,
            Value::Boolean(b) => Some(VariableValue::Boolean(b)),
            Value::Number(n) => Some(VariableValue::Number(n)),
            Value::String(s) => Some(VariableValue::String(s)),
            other => other.to_json().map(VariableValue::Json),
        }
    }
}

impl From<&VariableValue> for Value {
    fn from(value: &VariableValue) -> Self {
        match value {
            VariableValue::String(s) => Value::String(s.clone()),
            VariableValue::Number(n) => Value::Number(*n),
            VariableValue::Boolean(b) => Value::Boolean(*b),
            VariableValue::Json(json) => Value::from_json(json),
        }
    }
}

// ---------------------------------------------------------------------------
// Coercions
// ---------------------------------------------------------------------------

impl Value {
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
        }
    }

    /// Convert composites to their string primitive; primitives pass through.
    pub fn to_primitive(&self) -> Value {
        match self {
            Value::Array(_) | Value::Object(_) => Value::String(self.to_display_string()),
            other => other.clone(),
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) | Value::Object(_) => self.to_primitive().to_number(),
        }
    }

    /// String conversion (`String(value)`).
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_owned(),
            Value::Null => "null".to_owned(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    if item.is_nullish() {
                        String::new()
                    } else {
                        item.to_display_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_owned(),
        }
    }

    /// `===`. Composite values have no identity here, so they never compare
    /// equal.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }

    /// `==`.
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(a), Value::String(_)) => *a == other.to_number(),
            (Value::String(_), Value::Number(b)) => self.to_number() == *b,
            (Value::Boolean(_), _) => Value::Number(self.to_number()).loose_equals(other),
            (_, Value::Boolean(_)) => self.loose_equals(&Value::Number(other.to_number())),
            (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => false,
            (Value::Array(_) | Value::Object(_), _) => self.to_primitive().loose_equals(other),
            (_, Value::Array(_) | Value::Object(_)) => self.loose_equals(&other.to_primitive()),
            _ => self.strict_equals(other),
        }
    }

    /// Relational comparison. `None` when either side is `NaN`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self.to_primitive(), other.to_primitive()) {
            (Value::String(a), Value::String(b)) => Some(a.encode_utf16().cmp(b.encode_utf16())),
            (a, b) => a.to_number().partial_cmp(&b.to_number()),
        }
    }

    /// Read `key` from this value. `None` when the base is nullish.
    pub fn get_property(&self, key: &str) -> Option<Value> {
        match self {
            Value::Undefined | Value::Null => None,
            Value::String(s) => Some(if key == "length" {
                Value::Number(s.encode_utf16().count() as f64)
            } else {
                array_index(key)
                    .and_then(|index| s.encode_utf16().nth(index))
                    .map(|unit| Value::String(String::from_utf16_lossy(&[unit])))
                    .unwrap_or(Value::Undefined)
            }),
            Value::Array(items) => Some(if key == "length" {
                Value::Number(items.len() as f64)
            } else {
                array_index(key)
                    .and_then(|index| items.get(index).cloned())
                    .unwrap_or(Value::Undefined)
            }),
            Value::Object(props) => Some(
                props
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.clone())
                    .unwrap_or(Value::Undefined),
            ),
            Value::Boolean(_) | Value::Number(_) => Some(Value::Undefined),
        }
    }
}

/// Canonical array index: `"0"`, `"12"`, never `"01"` or `"1.0"`.
fn array_index(key: &str) -> Option<usize> {
    let index = key.parse::<usize>().ok()?;
    (index.to_string() == key).then_some(index)
}

/// Number-to-string conversion in the host language's style.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_owned()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_owned()
    } else if n == 0.0 {
        "0".to_owned()
    } else {
        n.to_string()
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let unsigned = trimmed.trim_start_matches(['+', '-']);
    let negative = trimmed.starts_with('-');
    if unsigned == "Infinity" {
        return if negative { f64::NEG_INFINITY } else { f64::INFINITY };
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return hex
            .chars()
            .try_fold(0f64, |acc, c| c.to_digit(16).map(|d| acc * 16.0 + f64::from(d)))
            .unwrap_or(f64::NAN);
    }
    // Rust also accepts "inf" and "nan"; the host language does not.
    if unsigned.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

pub(crate) fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

pub(crate) fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn number_formatting() {
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(1.5), "1.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn string_to_number_rules() {
        assert_eq!(Value::String("  42 ".into()).to_number(), 42.0);
        assert_eq!(Value::String("".into()).to_number(), 0.0);
        assert_eq!(Value::String("0x10".into()).to_number(), 16.0);
        assert_eq!(Value::String("-Infinity".into()).to_number(), f64::NEG_INFINITY);
        assert!(Value::String("inf".into()).to_number().is_nan());
        assert!(Value::String("12px".into()).to_number().is_nan());
        assert_eq!(Value::String("1e3".into()).to_number(), 1000.0);
    }

    #[test]
    fn array_display_string() {
        let value = Value::Array(vec![Value::Number(1.0), Value::Null, Value::String("a".into())]);
        assert_eq!(value.to_display_string(), "1,,a");
    }

    #[test]
    fn loose_equality() {
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.loose_equals(&Value::Number(0.0)));
        assert!(Value::Number(1.0).loose_equals(&Value::String("1".into())));
        assert!(Value::Boolean(true).loose_equals(&Value::Number(1.0)));
        assert!(Value::Array(vec![]).loose_equals(&Value::String("".into())));
        assert!(!Value::Number(f64::NAN).loose_equals(&Value::Number(f64::NAN)));
    }

    #[test]
    fn strict_equality_ignores_composites() {
        assert!(!Value::Array(vec![]).strict_equals(&Value::Array(vec![])));
        assert!(!Value::Number(1.0).strict_equals(&Value::String("1".into())));
    }

    #[test]
    fn property_access() {
        let s = Value::String("héllo".into());
        assert_eq!(s.get_property("length"), Some(Value::Number(5.0)));
        assert_eq!(s.get_property("1"), Some(Value::String("é".into())));
        let arr = Value::Array(vec![Value::Number(7.0)]);
        assert_eq!(arr.get_property("0"), Some(Value::Number(7.0)));
        assert_eq!(arr.get_property("00"), Some(Value::Undefined));
        assert_eq!(Value::Null.get_property("x"), None);
    }

    #[test]
    fn json_round_trip_drops_undefined() {
        let value = Value::Object(vec![
            ("a".into(), Value::Undefined),
            ("b".into(), Value::Array(vec![Value::Undefined, Value::Number(f64::NAN)])),
        ]);
        assert_eq!(value.to_json(), Some(json!({"b": [null, null]})));
    }

    #[test]
    fn narrows_to_variable_value() {
        assert_eq!(
            Value::Number(0.0).into_variable_value(),
            Some(VariableValue::Number(0.0))
        );
        assert_eq!(
            Value::Null.into_variable_value(),
            Some(VariableValue::Json(serde_json::Value::Null))
        );
        assert_eq!(Value::Undefined.into_variable_value(), None);
    }

    #[test]
    fn variable_value_serialization() {
        let value = VariableValue::Number(0.0);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"type": "number", "value": 0.0})
        );
        let back: VariableValue =
            serde_json::from_value(json!({"type": "json", "value": {"a": [1]}})).unwrap();
        assert_eq!(back, VariableValue::Json(json!({"a": [1]})));
    }

    #[test]
    fn int32_conversion_wraps() {
        assert_eq!(to_int32(4_294_967_295.0), -1);
        assert_eq!(to_int32(f64::NAN), 0);
        assert_eq!(to_uint32(-1.0), 4_294_967_295);
    }
}
