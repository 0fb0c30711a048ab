//! Query-filter evaluation for the in-memory client
//!
//! Supports implicit equality plus the comparison operators the CRUD test
//! corpus uses: `$gt`, `$gte`, `$lt`, `$lte`, `$ne`, `$in`. Numeric
//! comparisons are representation-insensitive (`1` matches `1.0`).

use serde_json::Value;
use specdrive_core::{as_f64, ClientError, Document};
use std::cmp::Ordering;

/// Deep equality that treats all numeric representations as one type
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => as_f64(a) == as_f64(b),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Ordering between two scalar values, `None` when incomparable
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => as_f64(a)?.partial_cmp(&as_f64(b)?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Resolve a possibly-dotted field path within a document
pub(crate) fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut current: Option<&Value> = None;
    for segment in path.split('.') {
        current = match current {
            None => doc.get(segment),
            Some(Value::Object(map)) => map.get(segment),
            Some(Value::Array(arr)) => segment.parse::<usize>().ok().and_then(|i| arr.get(i)),
            _ => None,
        };
        current?;
    }
    current
}

/// Whether a filter condition value is an operator document (`{"$gt": 1}`)
fn is_operator_document(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.keys().any(|k| k.starts_with('$')))
}

fn apply_operator(op: &str, field_value: Option<&Value>, operand: &Value) -> Result<bool, ClientError> {
    match op {
        "$gt" | "$gte" | "$lt" | "$lte" => {
            let Some(actual) = field_value else { return Ok(false) };
            let Some(ordering) = compare_values(actual, operand) else {
                return Ok(false);
            };
            Ok(match op {
                "$gt" => ordering == Ordering::Greater,
                "$gte" => ordering != Ordering::Less,
                "$lt" => ordering == Ordering::Less,
                _ => ordering != Ordering::Greater,
            })
        }
        "$ne" => Ok(!field_value.is_some_and(|actual| values_equal(actual, operand))),
        "$in" => {
            let Value::Array(candidates) = operand else {
                return Err(ClientError::InvalidArgument(
                    "$in requires an array operand".to_string(),
                ));
            };
            Ok(field_value
                .is_some_and(|actual| candidates.iter().any(|c| values_equal(actual, c))))
        }
        other => Err(ClientError::InvalidArgument(format!(
            "unsupported query operator '{other}'"
        ))),
    }
}

/// Evaluate a filter against a document
pub(crate) fn matches(filter: &Document, doc: &Document) -> Result<bool, ClientError> {
    for (field, condition) in filter.iter() {
        if field.starts_with('$') {
            return Err(ClientError::InvalidArgument(format!(
                "unsupported top-level query operator '{field}'"
            )));
        }
        let field_value = lookup(doc, field);
        if is_operator_document(condition) {
            let Value::Object(conditions) = condition else { unreachable!() };
            for (op, operand) in conditions {
                if !apply_operator(op, field_value, operand)? {
                    return Ok(false);
                }
            }
        } else {
            match field_value {
                Some(actual) if values_equal(actual, condition) => {}
                None if condition.is_null() => {}
                _ => return Ok(false),
            }
        }
    }
    Ok(true)
}

/// Stable sort by a `{"field": 1 | -1}` specification, keys in order
pub(crate) fn sort_documents(docs: &mut [Document], sort: &Document) {
    docs.sort_by(|a, b| {
        for (field, direction) in sort.iter() {
            let ordering = match (lookup(a, field), lookup(b, field)) {
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            };
            let descending = as_f64(direction).is_some_and(|d| d < 0.0);
            let ordering = if descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
