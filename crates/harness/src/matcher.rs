//! Placeholder-aware value matching
//!
//! Expected values from a test file are compared against actual values
//! with relaxed semantics:
//!
//! - the placeholders `42` and `"42"` match any present value;
//! - numbers compare by value, not representation (`1` matches `1.0`);
//! - an expected object is a subset match: extra actual fields are fine;
//! - an expected array matches length-exactly, element by element;
//! - an expected `null` matches an absent or null actual value.
//!
//! Mismatches are reported as strings carrying the dotted path to the
//! offending value, so a failure inside a deep command body reads as
//! `command.documents[1]._id`.

use serde_json::Value;
use specdrive_core::{as_f64, value_type_name};

/// Strict deep equality with representation-insensitive numbers
///
/// Unlike [`check_match`], no placeholder or subset semantics apply:
/// objects must carry exactly the same keys. Collection-state
/// verification uses this, where extra actual fields are a mismatch.
pub fn values_equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => as_f64(a) == as_f64(b),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equivalent(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equivalent(x, y)))
        }
        _ => a == b,
    }
}

/// Whether an expected value is the any-value placeholder
pub fn is_placeholder(expected: &Value) -> bool {
    matches!(expected, Value::Number(n) if n.as_i64() == Some(42))
        || matches!(expected, Value::String(s) if s == "42")
}

/// Compare an actual value against an expected one
///
/// `actual` is `None` when the field is absent from the enclosing
/// document, which only an expected `null` matches.
///
/// # Errors
///
/// Returns a human-readable description of the first mismatch found.
pub fn check_match(actual: Option<&Value>, expected: &Value) -> Result<(), String> {
    check_at("", actual, expected)
}

fn check_at(path: &str, actual: Option<&Value>, expected: &Value) -> Result<(), String> {
    if expected.is_null() {
        return match actual {
            None | Some(Value::Null) => Ok(()),
            Some(other) => Err(mismatch(path, "null or absent", other)),
        };
    }
    let Some(actual) = actual else {
        return Err(format!(
            "{}: expected {expected} but the field is absent",
            display_path(path)
        ));
    };
    if is_placeholder(expected) {
        return Ok(());
    }
    match expected {
        Value::Number(_) => {
            let matched = match (as_f64(expected), as_f64(actual)) {
                (Some(e), Some(a)) => e == a,
                _ => false,
            };
            if matched {
                Ok(())
            } else {
                Err(mismatch(path, &expected.to_string(), actual))
            }
        }
        Value::Object(expected_map) => {
            let Value::Object(actual_map) = actual else {
                return Err(mismatch(path, "a document", actual));
            };
            for (key, expected_value) in expected_map {
                check_at(&join(path, key), actual_map.get(key), expected_value)?;
            }
            Ok(())
        }
        Value::Array(expected_items) => {
            let Value::Array(actual_items) = actual else {
                return Err(mismatch(path, "an array", actual));
            };
            if actual_items.len() != expected_items.len() {
                return Err(format!(
                    "{}: expected {} elements, found {}",
                    display_path(path),
                    expected_items.len(),
                    actual_items.len()
                ));
            }
            for (index, (a, e)) in actual_items.iter().zip(expected_items).enumerate() {
                check_at(&format!("{path}[{index}]"), Some(a), e)?;
            }
            Ok(())
        }
        _ => {
            if actual == expected {
                Ok(())
            } else {
                Err(mismatch(path, &expected.to_string(), actual))
            }
        }
    }
}

fn mismatch(path: &str, expected: &str, actual: &Value) -> String {
    format!(
        "{}: expected {expected}, found {actual} ({})",
        display_path(path),
        value_type_name(actual)
    )
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "value"
    } else {
        path
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn matches(actual: Value, expected: Value) -> bool {
        check_match(Some(&actual), &expected).is_ok()
    }

    #[test]
    fn test_placeholder_matches_anything_present() {
        assert!(matches(json!("abc"), json!(42)));
        assert!(matches(json!({"a": 1}), json!(42)));
        assert!(matches(json!(null), json!(42)));
        assert!(matches(json!(7), json!("42")));
        assert!(check_match(None, &json!(42)).is_err());
    }

    #[test]
    fn test_literal_42_inside_string_is_not_special() {
        assert!(!matches(json!("421"), json!("42x")));
        // 42 as an actual value still matches itself
        assert!(matches(json!(42), json!(42)));
    }

    #[test]
    fn test_numeric_type_insensitive() {
        assert!(matches(json!(1.0), json!(1)));
        assert!(matches(json!(1), json!(1.0)));
        assert!(!matches(json!(1), json!(2)));
        assert!(!matches(json!("1"), json!(1)));
    }

    #[test]
    fn test_object_subset() {
        assert!(matches(json!({"a": 1, "b": 2}), json!({"a": 1})));
        assert!(!matches(json!({"a": 1}), json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_nested_paths_in_errors() {
        let actual = json!({"result": {"insertedIds": [1, 2]}});
        let expected = json!({"result": {"insertedIds": [1, 3]}});
        let err = check_match(Some(&actual), &expected).unwrap_err();
        assert!(err.contains("result.insertedIds[1]"), "{err}");
    }

    #[test]
    fn test_array_length_is_exact() {
        assert!(matches(json!([1, 2]), json!([1, 2])));
        assert!(!matches(json!([1, 2, 3]), json!([1, 2])));
        assert!(!matches(json!([1]), json!([1, 2])));
    }

    #[test]
    fn test_null_matches_absent() {
        let actual = json!({"a": 1});
        assert!(check_match(Some(&actual), &json!({"missing": null})).is_ok());
        assert!(check_match(Some(&actual), &json!({"a": null})).is_err());
    }

    #[test]
    fn test_values_equivalent_numeric_insensitive() {
        assert!(values_equivalent(&json!({"x": 2}), &json!({"x": 2.0})));
        assert!(values_equivalent(&json!([1, {"a": 2}]), &json!([1.0, {"a": 2.0}])));
        assert!(!values_equivalent(&json!({"x": 2}), &json!({"x": 3})));
        // no subset semantics: extra keys are a mismatch either way
        assert!(!values_equivalent(&json!({"x": 2}), &json!({"x": 2, "y": 1})));
        assert!(!values_equivalent(&json!({"x": 2, "y": 1}), &json!({"x": 2})));
        // no placeholder semantics
        assert!(!values_equivalent(&json!(42), &json!(7)));
    }

    #[test]
    fn test_scalar_equality() {
        assert!(matches(json!("x"), json!("x")));
        assert!(!matches(json!("x"), json!("y")));
        assert!(matches(json!(true), json!(true)));
        assert!(!matches(json!(true), json!(false)));
    }
}
