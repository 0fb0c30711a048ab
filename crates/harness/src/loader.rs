//! Test-specification file loading
//!
//! A test file is read once and parsed into an immutable [`TestFile`].
//! Parse failures and missing required top-level fields (`schemaVersion`,
//! `tests`) are hard failures that abort the run; they are never reported
//! as skips.

use serde::Deserialize;
use specdrive_core::{Document, DocumentError, Result, Topology, Version};
use std::fs;
use std::path::Path;

/// A parsed test-specification file
#[derive(Debug, Clone, Deserialize)]
pub struct TestFile {
    /// Declared schema version, checked before anything executes
    #[serde(rename = "schemaVersion")]
    pub schema_version: Version,
    /// Override for the default database name
    #[serde(rename = "database_name")]
    pub database_name: Option<String>,
    /// Override for the default collection name
    #[serde(rename = "collection_name")]
    pub collection_name: Option<String>,
    /// Initial document set shared by all cases in the file
    #[serde(default)]
    pub data: Vec<Document>,
    /// Test cases, executed in declaration order
    pub tests: Vec<TestCase>,
}

/// One test case within a file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Case identifier used in reports and logs
    pub description: String,
    /// Requirement alternatives; the case runs if any one is satisfied
    #[serde(default)]
    pub run_on_requirements: Vec<RunOnRequirement>,
    /// Case-level initial data, overriding the file-level set
    pub data: Option<Vec<Document>>,
    #[serde(default)]
    operations: Vec<Operation>,
    operation: Option<Operation>,
    /// Declared expected outcome, shared by every operation in the case
    pub outcome: Option<Outcome>,
    /// Expected command-started events, in emission order
    pub expectations: Option<Vec<Expectation>>,
    /// Fail point to install before the operations run
    pub fail_point: Option<Document>,
}

impl TestCase {
    /// The declared operations, normalizing the single-`operation` form
    pub fn operations(&self) -> Vec<&Operation> {
        if self.operations.is_empty() {
            self.operation.iter().collect()
        } else {
            self.operations.iter().collect()
        }
    }
}

/// One requirement alternative from `runOnRequirements`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOnRequirement {
    /// Minimum server version, compared over major/minor only
    pub min_server_version: Option<Version>,
    /// Maximum server version, compared over major/minor only
    pub max_server_version: Option<Version>,
    /// Acceptable topologies; absent means any
    pub topologies: Option<Vec<Topology>>,
}

/// A declared operation: a name selecting the client call, plus a
/// loosely-typed argument bag
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    /// Operation name, resolved through the operation registry
    pub name: String,
    /// Argument bag; shape is validated per operation
    #[serde(default)]
    pub arguments: Document,
}

/// Declared expected outcome of a case's operations
#[derive(Debug, Clone, Deserialize)]
pub struct Outcome {
    /// When `true`, the operation must raise a client error
    #[serde(default)]
    pub error: bool,
    /// Expected result value, compared with placeholder semantics
    pub result: Option<serde_json::Value>,
    /// Expected post-operation collection state
    pub collection: Option<CollectionOutcome>,
}

/// Expected final contents of a collection
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionOutcome {
    /// Target collection; defaults to the case's collection
    pub name: Option<String>,
    /// Expected documents, in order
    pub data: Option<Vec<Document>>,
}

/// One entry of a case's `expectations` list
#[derive(Debug, Clone, Deserialize)]
pub struct Expectation {
    /// The expected command-started event
    pub command_started_event: EventExpectation,
}

/// Declared fields of an expected command-started event
///
/// Absent fields are not compared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventExpectation {
    /// Expected wire-level command name
    pub command_name: Option<String>,
    /// Expected target database
    pub database_name: Option<String>,
    /// Expected command body, compared with placeholder semantics
    pub command: Option<Document>,
}

/// Load and parse a test-specification file
///
/// # Errors
///
/// Returns a fatal error when the file cannot be read, is not valid JSON,
/// or lacks a required top-level field.
pub fn load_test_file(path: &Path) -> Result<TestFile> {
    let contents = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&contents)?;
    let doc = Document::from_value(value.clone())?;
    for field in ["schemaVersion", "tests"] {
        if doc.get(field).is_none() {
            return Err(DocumentError::MissingField {
                field: field.to_string(),
            }
            .into());
        }
    }
    Ok(serde_json::from_value(value)?)
}
