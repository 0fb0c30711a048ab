//! Operation dispatch
//!
//! Declared operation names resolve through a registry of handlers, each
//! of which pulls its arguments out of the loosely-typed argument bag,
//! drives the bound collection, and materializes the client's typed result
//! back into the JSON shape the outcome matcher compares against.

use serde_json::{json, Value};
use specdrive_client::{Collection, CountOptions, FindOptions, UpdateOptions};
use specdrive_core::{ClientError, Document, Error, Result};
use std::collections::HashMap;
use tracing::debug;

type Handler = fn(&dyn Collection, &Document) -> Result<Value>;

/// Resolves operation names and executes them against a collection
pub struct OperationRunner {
    handlers: HashMap<&'static str, Handler>,
}

impl Default for OperationRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationRunner {
    /// Build the registry with every supported operation
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Handler> = HashMap::new();
        handlers.insert("insertOne", run_insert_one);
        handlers.insert("insertMany", run_insert_many);
        handlers.insert("deleteOne", run_delete_one);
        handlers.insert("deleteMany", run_delete_many);
        handlers.insert("find", run_find);
        handlers.insert("aggregate", run_aggregate);
        handlers.insert("distinct", run_distinct);
        handlers.insert("count", run_count);
        handlers.insert("countDocuments", run_count);
        handlers.insert("replaceOne", run_replace_one);
        handlers.insert("updateOne", run_update_one);
        handlers.insert("updateMany", run_update_many);
        Self { handlers }
    }

    /// Whether an operation name is registered
    pub fn supports(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Execute one declared operation
    ///
    /// Client-raised errors are captured in the inner `Result` so the
    /// verifier can assert on them; the outer `Result` carries harness
    /// failures such as an unknown operation name or a malformed
    /// argument bag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownOperation`] for an unregistered name and
    /// [`Error::Document`] for argument bags missing required fields.
    pub fn run(
        &self,
        collection: &dyn Collection,
        name: &str,
        arguments: &Document,
    ) -> Result<std::result::Result<Value, ClientError>> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| Error::UnknownOperation(name.to_string()))?;
        debug!(operation = name, collection = collection.name(), "running operation");
        match handler(collection, arguments) {
            Ok(result) => Ok(Ok(result)),
            Err(Error::Client(client_error)) => Ok(Err(client_error)),
            Err(other) => Err(other),
        }
    }
}

fn filter_argument(arguments: &Document) -> Result<Document> {
    Ok(arguments.get_document_opt("filter")?.unwrap_or_default())
}

fn skip_argument(arguments: &Document) -> Result<Option<u64>> {
    match arguments.get_i64_opt("skip")? {
        Some(skip) if skip < 0 => Err(ClientError::InvalidArgument(format!(
            "skip must be non-negative, got {skip}"
        ))
        .into()),
        Some(skip) => Ok(Some(skip as u64)),
        None => Ok(None),
    }
}

fn limit_argument(arguments: &Document) -> Result<Option<i64>> {
    match arguments.get_i64_opt("limit")? {
        Some(limit) if limit <= 0 => Err(ClientError::InvalidArgument(format!(
            "limit must be positive, got {limit}"
        ))
        .into()),
        other => Ok(other),
    }
}

fn run_insert_one(collection: &dyn Collection, arguments: &Document) -> Result<Value> {
    let document = arguments.get_document("document")?;
    let result = collection.insert_one(document)?;
    Ok(json!({ "insertedId": result.inserted_id }))
}

fn run_insert_many(collection: &dyn Collection, arguments: &Document) -> Result<Value> {
    let documents = arguments.get_documents("documents")?;
    let result = collection.insert_many(documents)?;
    Ok(json!({ "insertedIds": result.inserted_ids }))
}

fn run_delete_one(collection: &dyn Collection, arguments: &Document) -> Result<Value> {
    let result = collection.delete_one(filter_argument(arguments)?)?;
    Ok(json!({ "deletedCount": result.deleted_count }))
}

fn run_delete_many(collection: &dyn Collection, arguments: &Document) -> Result<Value> {
    let result = collection.delete_many(filter_argument(arguments)?)?;
    Ok(json!({ "deletedCount": result.deleted_count }))
}

fn run_find(collection: &dyn Collection, arguments: &Document) -> Result<Value> {
    let options = FindOptions {
        sort: arguments.get_document_opt("sort")?,
        skip: skip_argument(arguments)?,
        limit: limit_argument(arguments)?,
    };
    let documents = collection.find(filter_argument(arguments)?, options)?;
    Ok(documents_to_value(documents))
}

fn run_aggregate(collection: &dyn Collection, arguments: &Document) -> Result<Value> {
    let pipeline = arguments.get_documents("pipeline")?;
    let documents = collection.aggregate(pipeline)?;
    Ok(documents_to_value(documents))
}

fn run_distinct(collection: &dyn Collection, arguments: &Document) -> Result<Value> {
    let field_name = arguments.get_str("fieldName")?;
    let values = collection.distinct(field_name, filter_argument(arguments)?)?;
    Ok(Value::Array(values))
}

fn run_count(collection: &dyn Collection, arguments: &Document) -> Result<Value> {
    let options = CountOptions {
        skip: skip_argument(arguments)?,
        limit: limit_argument(arguments)?,
    };
    let count = collection.count_documents(filter_argument(arguments)?, options)?;
    Ok(json!(count))
}

fn run_replace_one(collection: &dyn Collection, arguments: &Document) -> Result<Value> {
    let replacement = arguments.get_document("replacement")?;
    let options = UpdateOptions {
        upsert: arguments.get_bool_or_false("upsert")?,
    };
    let result = collection.replace_one(filter_argument(arguments)?, replacement, options)?;
    Ok(update_result_to_value(result))
}

fn run_update_one(collection: &dyn Collection, arguments: &Document) -> Result<Value> {
    let update = arguments.get_document("update")?;
    let options = UpdateOptions {
        upsert: arguments.get_bool_or_false("upsert")?,
    };
    let result = collection.update_one(filter_argument(arguments)?, update, options)?;
    Ok(update_result_to_value(result))
}

fn run_update_many(collection: &dyn Collection, arguments: &Document) -> Result<Value> {
    let update = arguments.get_document("update")?;
    let options = UpdateOptions {
        upsert: arguments.get_bool_or_false("upsert")?,
    };
    let result = collection.update_many(filter_argument(arguments)?, update, options)?;
    Ok(update_result_to_value(result))
}

fn documents_to_value(documents: Vec<Document>) -> Value {
    Value::Array(documents.into_iter().map(Document::into_value).collect())
}

fn update_result_to_value(result: specdrive_client::UpdateResult) -> Value {
    let mut value = json!({
        "matchedCount": result.matched_count,
        "modifiedCount": result.modified_count,
        "upsertedCount": result.upserted_count(),
    });
    if let Some(id) = result.upserted_id {
        if let Value::Object(map) = &mut value {
            map.insert("upsertedId".to_string(), id);
        }
    }
    value
}
