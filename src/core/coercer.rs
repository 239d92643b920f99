use crate::domain::model::PropertyValue;
use crate::utils::error::{Result, UpdateError};
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::sync::LazyLock;

static DECIMAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+\.\d+$").expect("decimal pattern is valid"));

/// Element type chosen for a whole array literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    Boolean,
    Decimal,
    Integer,
    String,
}

/// Classifies an array by its first element only.
pub fn classify(first: &Value) -> Option<ArrayKind> {
    match first {
        Value::Bool(_) => Some(ArrayKind::Boolean),
        Value::Number(n) if DECIMAL_REGEX.is_match(&n.to_string()) => Some(ArrayKind::Decimal),
        Value::String(s) if DECIMAL_REGEX.is_match(s) => Some(ArrayKind::Decimal),
        Value::Number(_) => Some(ArrayKind::Integer),
        Value::String(_) => Some(ArrayKind::String),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Converts a JSON array literal into a homogeneous typed array.
///
/// Every element is converted to the kind of the first one; an element that does not
/// convert fails the whole array.
pub fn coerce_array(field: &str, items: &[Value]) -> Result<PropertyValue> {
    let first = items.first().ok_or_else(|| coercion_error(field, "array is empty"))?;
    let kind = classify(first)
        .ok_or_else(|| coercion_error(field, &format!("unsupported first element {}", first)))?;

    let value = match kind {
        ArrayKind::Boolean => PropertyValue::BooleanArray(convert(field, items, to_bool)?),
        ArrayKind::Decimal => PropertyValue::DecimalArray(convert(field, items, to_decimal)?),
        ArrayKind::Integer => PropertyValue::LongArray(convert(field, items, to_long)?),
        ArrayKind::String => PropertyValue::StringArray(convert(field, items, to_string)?),
    };
    Ok(value)
}

/// Scalar `add` values map onto the store's scalar types.
pub fn coerce_scalar(field: &str, value: &Value) -> Result<PropertyValue> {
    match value {
        Value::String(s) => Ok(PropertyValue::String(s.clone())),
        Value::Bool(b) => Ok(PropertyValue::Boolean(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(PropertyValue::Long(i)),
            None => n
                .as_f64()
                .map(PropertyValue::Double)
                .ok_or_else(|| coercion_error(field, &format!("number {} is out of range", n))),
        },
        Value::Array(items) => coerce_array(field, items),
        Value::Null | Value::Object(_) => {
            Err(coercion_error(field, &format!("unsupported value {}", value)))
        }
    }
}

fn convert<T>(
    field: &str,
    items: &[Value],
    f: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<T>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            f(item).ok_or_else(|| {
                coercion_error(field, &format!("element {} ({}) does not convert", index, item))
            })
        })
        .collect()
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn to_long(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coercion_error(field: &str, reason: &str) -> UpdateError {
    UpdateError::CoercionError {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(value: Value) -> Vec<Value> {
        match value {
            Value::Array(items) => items,
            other => panic!("expected array, got {}", other),
        }
    }

    #[test]
    fn test_classify_first_element() {
        assert_eq!(classify(&json!(true)), Some(ArrayKind::Boolean));
        assert_eq!(classify(&json!("3.14")), Some(ArrayKind::Decimal));
        assert_eq!(classify(&json!(-2.5)), Some(ArrayKind::Decimal));
        assert_eq!(classify(&json!(42)), Some(ArrayKind::Integer));
        assert_eq!(classify(&json!("42")), Some(ArrayKind::String));
        assert_eq!(classify(&json!("3.")), Some(ArrayKind::String));
        assert_eq!(classify(&json!(null)), None);
        assert_eq!(classify(&json!({"a": 1})), None);
    }

    #[test]
    fn test_decimal_shape_wins_over_later_integers() {
        let value = coerce_array("prices", &items(json!(["3.14", "2", 5]))).unwrap();
        assert_eq!(
            value,
            PropertyValue::DecimalArray(vec![
                Decimal::from_str("3.14").unwrap(),
                Decimal::from(2),
                Decimal::from(5),
            ])
        );
    }

    #[test]
    fn test_integer_array() {
        let value = coerce_array("sizes", &items(json!([1, "2", 3.0]))).unwrap();
        assert_eq!(value, PropertyValue::LongArray(vec![1, 2, 3]));
    }

    #[test]
    fn test_boolean_array() {
        let value = coerce_array("flags", &items(json!([true, "FALSE", false]))).unwrap();
        assert_eq!(value, PropertyValue::BooleanArray(vec![true, false, false]));
    }

    #[test]
    fn test_string_array_stringifies_scalars() {
        let value = coerce_array("tags", &items(json!(["a", 1, true]))).unwrap();
        assert_eq!(
            value,
            PropertyValue::StringArray(vec!["a".into(), "1".into(), "true".into()])
        );
    }

    #[test]
    fn test_heterogeneous_array_fails() {
        let err = coerce_array("sizes", &items(json!([1, "large"]))).unwrap_err();
        assert!(matches!(err, UpdateError::CoercionError { .. }));
        assert!(coerce_array("flags", &items(json!([true, 1]))).is_err());
        assert!(coerce_array("sizes", &items(json!([1, 2.5]))).is_err());
    }

    #[test]
    fn test_empty_array_fails() {
        assert!(coerce_array("tags", &[]).is_err());
    }

    #[test]
    fn test_scalars() {
        assert_eq!(coerce_scalar("a", &json!("x")).unwrap(), PropertyValue::String("x".into()));
        assert_eq!(coerce_scalar("a", &json!(7)).unwrap(), PropertyValue::Long(7));
        assert_eq!(coerce_scalar("a", &json!(1.5)).unwrap(), PropertyValue::Double(1.5));
        assert_eq!(coerce_scalar("a", &json!(false)).unwrap(), PropertyValue::Boolean(false));
        assert!(coerce_scalar("a", &json!(null)).is_err());
        assert!(coerce_scalar("a", &json!({"nested": true})).is_err());
    }
}
