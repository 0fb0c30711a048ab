//! Update-operator application for the in-memory client
//!
//! Supports `$set`, `$inc`, and `$unset` with dotted field paths, plus
//! replacement-document and upsert-synthesis helpers. An update document
//! must consist entirely of operator keys; a replacement document must
//! contain none. Mixing the two shapes is an argument error, matching
//! driver-side validation.

use serde_json::Value;
use specdrive_core::{as_f64, ClientError, Document};

use super::filter::values_equal;

/// Whether every top-level key is an update operator
pub(crate) fn is_update_document(update: &Document) -> bool {
    !update.is_empty() && update.keys().all(|k| k.starts_with('$'))
}

/// Whether no top-level key is an update operator
pub(crate) fn is_replacement_document(replacement: &Document) -> bool {
    replacement.keys().all(|k| !k.starts_with('$'))
}

/// Set a (possibly dotted) path, creating intermediate objects
fn set_path(doc: &mut Document, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current: &mut serde_json::Map<String, Value> = doc;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(serde_json::Map::new());
        }
        current = entry.as_object_mut().expect("just ensured object");
    }
}

fn unset_path(doc: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            doc.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Value::Object(map)) = doc.get_mut(head) {
                let mut inner = Document::from_map(std::mem::take(map));
                unset_path(&mut inner, rest);
                *map = inner.into_map();
            }
        }
    }
}

fn current_number(doc: &Document, path: &str) -> Result<f64, ClientError> {
    match super::filter::lookup(doc, path) {
        None => Ok(0.0),
        Some(value) => as_f64(value).ok_or_else(|| {
            ClientError::operation(format!("cannot apply $inc to non-numeric field '{path}'"))
        }),
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

/// Apply an operator-style update document, reporting whether anything changed
pub(crate) fn apply_update(doc: &mut Document, update: &Document) -> Result<bool, ClientError> {
    if !is_update_document(update) {
        return Err(ClientError::InvalidArgument(
            "update document must contain only atomic operators".to_string(),
        ));
    }
    let before = doc.clone();
    for (operator, spec) in update.iter() {
        let Value::Object(fields) = spec else {
            return Err(ClientError::InvalidArgument(format!(
                "operator '{operator}' requires a document operand"
            )));
        };
        match operator.as_str() {
            "$set" => {
                for (path, value) in fields {
                    set_path(doc, path, value.clone());
                }
            }
            "$inc" => {
                for (path, amount) in fields {
                    let amount = as_f64(amount).ok_or_else(|| {
                        ClientError::InvalidArgument(format!(
                            "$inc amount for '{path}' must be numeric"
                        ))
                    })?;
                    let updated = current_number(doc, path)? + amount;
                    set_path(doc, path, number_value(updated));
                }
            }
            "$unset" => {
                for path in fields.keys() {
                    unset_path(doc, path);
                }
            }
            other => {
                // Unknown operators reach the server and are rejected there
                return Err(ClientError::operation(format!(
                    "unknown update operator '{other}'"
                )));
            }
        }
    }
    Ok(!values_equal(&before.to_value(), &doc.to_value()))
}

/// Build the document an upsert inserts when the filter matched nothing
///
/// Equality conditions from the filter seed the document (operator
/// conditions contribute nothing), then the update is applied on top.
pub(crate) fn synthesize_upsert(
    filter: &Document,
    update: &Document,
) -> Result<Document, ClientError> {
    let mut doc = Document::new();
    for (field, condition) in filter.iter() {
        let is_operator = matches!(
            condition,
            Value::Object(map) if map.keys().any(|k| k.starts_with('$'))
        );
        if !field.starts_with('$') && !is_operator {
            set_path(&mut doc, field, condition.clone());
        }
    }
    apply_update(&mut doc, update)?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn test_set_top_level_and_nested() {
        let mut d = doc(json!({"_id": 1, "x": 1}));
        let changed = apply_update(&mut d, &doc(json!({"$set": {"x": 2, "a.b": 3}}))).unwrap();
        assert!(changed);
        assert_eq!(d.to_value(), json!({"_id": 1, "x": 2, "a": {"b": 3}}));
    }

    #[test]
    fn test_set_no_change_reported() {
        let mut d = doc(json!({"_id": 1, "x": 1}));
        let changed = apply_update(&mut d, &doc(json!({"$set": {"x": 1}}))).unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_inc_existing_and_missing() {
        let mut d = doc(json!({"_id": 1, "x": 1}));
        apply_update(&mut d, &doc(json!({"$inc": {"x": 2, "y": 5}}))).unwrap();
        assert_eq!(d.to_value(), json!({"_id": 1, "x": 3, "y": 5}));
    }

    #[test]
    fn test_inc_non_numeric_is_operation_error() {
        let mut d = doc(json!({"x": "text"}));
        let err = apply_update(&mut d, &doc(json!({"$inc": {"x": 1}}))).unwrap_err();
        assert!(matches!(err, ClientError::Operation { .. }));
    }

    #[test]
    fn test_unset() {
        let mut d = doc(json!({"_id": 1, "x": 1, "a": {"b": 2, "c": 3}}));
        apply_update(&mut d, &doc(json!({"$unset": {"x": "", "a.b": ""}}))).unwrap();
        assert_eq!(d.to_value(), json!({"_id": 1, "a": {"c": 3}}));
    }

    #[test]
    fn test_unknown_operator_is_operation_error() {
        let mut d = doc(json!({"x": 1}));
        let err = apply_update(&mut d, &doc(json!({"$rename": {"x": "y"}}))).unwrap_err();
        assert!(matches!(err, ClientError::Operation { .. }));
    }

    #[test]
    fn test_replacement_shape_rejected_as_update() {
        let mut d = doc(json!({"x": 1}));
        let err = apply_update(&mut d, &doc(json!({"x": 2}))).unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[test]
    fn test_shape_predicates() {
        assert!(is_update_document(&doc(json!({"$set": {"x": 1}}))));
        assert!(!is_update_document(&doc(json!({"x": 1}))));
        assert!(!is_update_document(&Document::new()));
        assert!(is_replacement_document(&doc(json!({"x": 1}))));
        assert!(!is_replacement_document(&doc(json!({"$set": {"x": 1}}))));
    }

    #[test]
    fn test_synthesize_upsert() {
        let d = synthesize_upsert(
            &doc(json!({"_id": 4, "x": {"$gt": 2}})),
            &doc(json!({"$set": {"y": 1}})),
        )
        .unwrap();
        // Operator conditions contribute nothing; equality fields seed the doc
        assert_eq!(d.to_value(), json!({"_id": 4, "y": 1}));
    }
}
