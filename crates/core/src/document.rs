//! Document types for loosely-typed test-specification data
//!
//! Test-specification files are schema-free JSON: operation argument bags,
//! expected results, and command bodies all arrive as untyped documents.
//! Rather than reflecting over `serde_json::Value` at every call site, this
//! module wraps it in a [`Document`] newtype whose accessors fail with a
//! typed [`DocumentError`] on shape mismatch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use thiserror::Error;

/// Error type for document field access
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// A required field is absent
    #[error("missing required field '{field}'")]
    MissingField {
        /// Name of the absent field
        field: String,
    },

    /// A field is present but has the wrong JSON type
    #[error("field '{field}' has type {found}, expected {expected}")]
    TypeMismatch {
        /// Name of the offending field
        field: String,
        /// Expected JSON type
        expected: &'static str,
        /// Actual JSON type found
        found: &'static str,
    },

    /// A value expected to be a document was something else
    #[error("expected a document, found {found}")]
    NotADocument {
        /// Actual JSON type found
        found: &'static str,
    },
}

/// JSON type name for error messages
pub fn value_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Widen any JSON number to f64 for representation-insensitive comparison
///
/// Specification files are free to write `1`, `1.0`, or a 64-bit integer for
/// the same logical value; comparisons throughout the harness go through this
/// helper so the representation never matters.
pub fn as_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// A JSON object with typed field accessors
///
/// Newtype around `serde_json::Map<String, Value>` providing:
/// - Direct access to the underlying map via `Deref`/`DerefMut`
/// - Accessors that return [`DocumentError`] instead of `Option` when a
///   declared field is absent or ill-typed
/// - Serialization/deserialization support
///
/// Key order is preserved (the `preserve_order` feature of `serde_json`),
/// which matters for multi-key sort specifications and for readable
/// mismatch output.
///
/// # Examples
///
/// ```
/// use specdrive_core::Document;
///
/// let doc: Document = r#"{"name": "insertOne", "arguments": {}}"#.parse().unwrap();
/// assert_eq!(doc.get_str("name").unwrap(), "insertOne");
/// assert!(doc.get_str("missing").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(serde_json::Map<String, serde_json::Value>);

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Document(serde_json::Map::new())
    }

    /// Wrap an existing JSON object
    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Document(map)
    }

    /// Interpret a JSON value as a document
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NotADocument`] if the value is not an object.
    pub fn from_value(value: serde_json::Value) -> Result<Self, DocumentError> {
        match value {
            serde_json::Value::Object(map) => Ok(Document(map)),
            other => Err(DocumentError::NotADocument {
                found: value_type_name(&other),
            }),
        }
    }

    /// Consume the document, yielding the underlying map
    pub fn into_map(self) -> serde_json::Map<String, serde_json::Value> {
        self.0
    }

    /// Convert to a `serde_json::Value::Object`
    pub fn into_value(self) -> serde_json::Value {
        serde_json::Value::Object(self.0)
    }

    /// Convert to a `serde_json::Value::Object` without consuming
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.0.clone())
    }

    /// Get a field value if present
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }

    /// Get a field value, failing if absent
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::MissingField`] if the field is absent.
    pub fn require(&self, field: &str) -> Result<&serde_json::Value, DocumentError> {
        self.0.get(field).ok_or_else(|| DocumentError::MissingField {
            field: field.to_string(),
        })
    }

    /// Get a required string field
    ///
    /// # Errors
    ///
    /// Returns an error if the field is absent or not a string.
    pub fn get_str(&self, field: &str) -> Result<&str, DocumentError> {
        let value = self.require(field)?;
        value.as_str().ok_or_else(|| DocumentError::TypeMismatch {
            field: field.to_string(),
            expected: "string",
            found: value_type_name(value),
        })
    }

    /// Get a required boolean field
    ///
    /// # Errors
    ///
    /// Returns an error if the field is absent or not a boolean.
    pub fn get_bool(&self, field: &str) -> Result<bool, DocumentError> {
        let value = self.require(field)?;
        value.as_bool().ok_or_else(|| DocumentError::TypeMismatch {
            field: field.to_string(),
            expected: "boolean",
            found: value_type_name(value),
        })
    }

    /// Get a required integer field, widening from any numeric representation
    ///
    /// # Errors
    ///
    /// Returns an error if the field is absent or not an integral number.
    pub fn get_i64(&self, field: &str) -> Result<i64, DocumentError> {
        let value = self.require(field)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| DocumentError::TypeMismatch {
                field: field.to_string(),
                expected: "integer",
                found: value_type_name(value),
            })
    }

    /// Get a required embedded-document field
    ///
    /// # Errors
    ///
    /// Returns an error if the field is absent or not an object.
    pub fn get_document(&self, field: &str) -> Result<Document, DocumentError> {
        let value = self.require(field)?;
        match value {
            serde_json::Value::Object(map) => Ok(Document(map.clone())),
            other => Err(DocumentError::TypeMismatch {
                field: field.to_string(),
                expected: "object",
                found: value_type_name(other),
            }),
        }
    }

    /// Get a required array field
    ///
    /// # Errors
    ///
    /// Returns an error if the field is absent or not an array.
    pub fn get_array(&self, field: &str) -> Result<&Vec<serde_json::Value>, DocumentError> {
        let value = self.require(field)?;
        value.as_array().ok_or_else(|| DocumentError::TypeMismatch {
            field: field.to_string(),
            expected: "array",
            found: value_type_name(value),
        })
    }

    /// Get a required array field whose elements must all be documents
    ///
    /// # Errors
    ///
    /// Returns an error if the field is absent, not an array, or contains a
    /// non-object element.
    pub fn get_documents(&self, field: &str) -> Result<Vec<Document>, DocumentError> {
        self.get_array(field)?
            .iter()
            .map(|v| Document::from_value(v.clone()))
            .collect()
    }

    /// Get an optional embedded-document field
    ///
    /// Absent fields yield `Ok(None)`; present fields of the wrong type are
    /// still an error.
    pub fn get_document_opt(&self, field: &str) -> Result<Option<Document>, DocumentError> {
        match self.0.get(field) {
            None => Ok(None),
            Some(_) => self.get_document(field).map(Some),
        }
    }

    /// Get an optional integer field
    pub fn get_i64_opt(&self, field: &str) -> Result<Option<i64>, DocumentError> {
        match self.0.get(field) {
            None => Ok(None),
            Some(_) => self.get_i64(field).map(Some),
        }
    }

    /// Get an optional boolean field, defaulting to `false` when absent
    pub fn get_bool_or_false(&self, field: &str) -> Result<bool, DocumentError> {
        match self.0.get(field) {
            None => Ok(false),
            Some(_) => self.get_bool(field),
        }
    }

    /// Serialize to a compact JSON string
    pub fn to_json_string(&self) -> String {
        serde_json::Value::Object(self.0.clone()).to_string()
    }
}

impl FromStr for Document {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}

impl Deref for Document {
    type Target = serde_json::Map<String, serde_json::Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Document {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json_string())
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Document {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Document(map)
    }
}

impl From<Document> for serde_json::Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Document {
        Document::from_value(json!({
            "name": "insertOne",
            "count": 3,
            "float_count": 3.0,
            "flag": true,
            "arguments": {"document": {"_id": 1}},
            "documents": [{"_id": 1}, {"_id": 2}],
            "mixed": [{"_id": 1}, 2],
        }))
        .unwrap()
    }

    #[test]
    fn test_get_str() {
        assert_eq!(sample().get_str("name").unwrap(), "insertOne");
    }

    #[test]
    fn test_get_str_missing() {
        let err = sample().get_str("absent").unwrap_err();
        assert_eq!(
            err,
            DocumentError::MissingField {
                field: "absent".to_string()
            }
        );
    }

    #[test]
    fn test_get_str_wrong_type() {
        let err = sample().get_str("count").unwrap_err();
        assert!(matches!(err, DocumentError::TypeMismatch { expected: "string", .. }));
    }

    #[test]
    fn test_get_bool() {
        assert!(sample().get_bool("flag").unwrap());
    }

    #[test]
    fn test_get_i64_integral_float() {
        // 3 and 3.0 are the same logical value in test files
        assert_eq!(sample().get_i64("count").unwrap(), 3);
        assert_eq!(sample().get_i64("float_count").unwrap(), 3);
    }

    #[test]
    fn test_get_document() {
        let args = sample().get_document("arguments").unwrap();
        assert!(args.get("document").is_some());
    }

    #[test]
    fn test_get_documents() {
        let docs = sample().get_documents("documents").unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_get_documents_rejects_non_object_element() {
        let err = sample().get_documents("mixed").unwrap_err();
        assert!(matches!(err, DocumentError::NotADocument { found: "number" }));
    }

    #[test]
    fn test_optional_accessors() {
        let doc = sample();
        assert!(doc.get_document_opt("absent").unwrap().is_none());
        assert!(doc.get_document_opt("arguments").unwrap().is_some());
        assert!(!doc.get_bool_or_false("absent").unwrap());
        assert!(doc.get_bool_or_false("flag").unwrap());
        assert_eq!(doc.get_i64_opt("count").unwrap(), Some(3));
    }

    #[test]
    fn test_from_value_rejects_scalar() {
        let err = Document::from_value(json!(42)).unwrap_err();
        assert_eq!(err, DocumentError::NotADocument { found: "number" });
    }

    #[test]
    fn test_parse_and_display_roundtrip() {
        let doc: Document = r#"{"a":1,"b":"x"}"#.parse().unwrap();
        let reparsed: Document = doc.to_json_string().parse().unwrap();
        assert_eq!(doc, reparsed);
    }

    #[test]
    fn test_key_order_preserved() {
        let doc: Document = r#"{"z":1,"a":2}"#.parse().unwrap();
        let keys: Vec<&String> = doc.keys().collect();
        assert_eq!(keys, ["z", "a"]);
    }

    #[test]
    fn test_value_type_name() {
        assert_eq!(value_type_name(&json!(null)), "null");
        assert_eq!(value_type_name(&json!([1])), "array");
        assert_eq!(value_type_name(&json!({"a": 1})), "object");
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(as_f64(&json!(2)), Some(2.0));
        assert_eq!(as_f64(&json!(2.5)), Some(2.5));
        assert_eq!(as_f64(&json!("2")), None);
    }
}
