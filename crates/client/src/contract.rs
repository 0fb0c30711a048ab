//! The narrow contract the harness consumes from a client library
//!
//! The harness never implements wire protocol, codecs, or operation
//! semantics; it drives whatever sits behind these traits. The traits
//! exist so the harness can be exercised against the in-memory reference
//! client in this crate and against a real driver without changing a line
//! of runner code.
//!
//! Thread safety: [`Client`] requires `Send + Sync` because the event
//! recorder is shared with the verifier; the harness itself serializes all
//! access on one control thread.

use crate::events::EventRecorder;
use specdrive_core::{ClientError, Document, Topology, Version};

/// Result of an `insertOne` operation
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneResult {
    /// `_id` of the inserted document
    pub inserted_id: serde_json::Value,
}

/// Result of an `insertMany` operation
#[derive(Debug, Clone, PartialEq)]
pub struct InsertManyResult {
    /// `_id`s of the inserted documents, in insertion order
    pub inserted_ids: Vec<serde_json::Value>,
}

/// Result of a `deleteOne`/`deleteMany` operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    /// Number of documents removed
    pub deleted_count: u64,
}

/// Result of an update or replace operation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateResult {
    /// Number of documents the filter matched
    pub matched_count: u64,
    /// Number of documents actually modified
    pub modified_count: u64,
    /// `_id` of the upserted document, when an upsert occurred
    pub upserted_id: Option<serde_json::Value>,
}

impl UpdateResult {
    /// Number of upserts performed (zero or one)
    pub fn upserted_count(&self) -> u64 {
        u64::from(self.upserted_id.is_some())
    }
}

/// Options for a `find` operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Sort specification, field name to 1 (ascending) or -1 (descending)
    pub sort: Option<Document>,
    /// Number of leading matches to skip
    pub skip: Option<u64>,
    /// Maximum number of documents to return
    pub limit: Option<i64>,
}

/// Options for a count operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountOptions {
    /// Number of leading matches to skip
    pub skip: Option<u64>,
    /// Maximum count to report
    pub limit: Option<i64>,
}

/// Options for update/replace operations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Insert a synthesized document when the filter matches nothing
    pub upsert: bool,
}

/// A connected client
pub trait Client: Send + Sync {
    /// Bind a database handle by name
    fn database<'a>(&'a self, name: &str) -> Box<dyn Database + 'a>;

    /// Version of the connected server
    ///
    /// # Errors
    ///
    /// Returns an error if server introspection fails.
    fn server_version(&self) -> Result<Version, ClientError>;

    /// Deployment topology of the connected server
    ///
    /// # Errors
    ///
    /// Returns an error if server introspection fails.
    fn topology(&self) -> Result<Topology, ClientError>;

    /// Run a command against the admin database (fail-point control)
    ///
    /// # Errors
    ///
    /// Returns an error if the command is rejected.
    fn run_admin_command(&self, command: &Document) -> Result<Document, ClientError>;

    /// The command-monitoring recorder attached to this client
    fn events(&self) -> &EventRecorder;
}

/// A bound database handle
pub trait Database {
    /// Name of this database
    fn name(&self) -> &str;

    /// Bind a collection handle by name
    fn collection<'a>(&'a self, name: &str) -> Box<dyn Collection + 'a>;
}

/// A bound collection handle exposing the CRUD surface the harness drives
///
/// All methods may fail with [`ClientError::Operation`] (server-side
/// rejection, fail-point trip) or [`ClientError::InvalidArgument`]
/// (malformed filter/update shapes rejected client-side).
#[allow(missing_docs)]
pub trait Collection {
    /// Name of this collection
    fn name(&self) -> &str;

    fn insert_one(&self, document: Document) -> Result<InsertOneResult, ClientError>;
    fn insert_many(&self, documents: Vec<Document>) -> Result<InsertManyResult, ClientError>;
    fn delete_one(&self, filter: Document) -> Result<DeleteResult, ClientError>;
    fn delete_many(&self, filter: Document) -> Result<DeleteResult, ClientError>;
    fn find(&self, filter: Document, options: FindOptions) -> Result<Vec<Document>, ClientError>;
    fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, ClientError>;
    fn distinct(&self, field_name: &str, filter: Document)
        -> Result<Vec<serde_json::Value>, ClientError>;
    fn count_documents(&self, filter: Document, options: CountOptions)
        -> Result<u64, ClientError>;
    fn replace_one(
        &self,
        filter: Document,
        replacement: Document,
        options: UpdateOptions,
    ) -> Result<UpdateResult, ClientError>;
    fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> Result<UpdateResult, ClientError>;
    fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> Result<UpdateResult, ClientError>;
}
