//! In-memory reference implementation of the client contract
//!
//! Backs the harness's own test suite: collections are ordered document
//! vectors behind a mutex, commands emit started events, and the
//! `failCommand` fail point is honored through the admin-command surface.
//! The supported operator/pipeline subset is exactly what the CRUD test
//! corpus exercises; anything outside it fails the way a server would.

mod failpoint;
mod filter;
mod update;

use crate::contract::{
    Client, Collection, CountOptions, Database, DeleteResult, FindOptions, InsertManyResult,
    InsertOneResult, UpdateOptions, UpdateResult,
};
use crate::events::{CommandStartedEvent, EventRecorder};
use failpoint::{ConfigureAction, FailPoint};
use parking_lot::Mutex;
use serde_json::{json, Value};
use specdrive_core::{ClientError, Document, Topology, Version};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

/// (database name, collection name)
type CollectionKey = (String, String);

/// An in-memory document store implementing the [`Client`] contract
///
/// One instance stands in for a connected deployment: its reported server
/// version and topology are fixed at construction so requirement-gating
/// paths can be exercised deterministically.
pub struct MemoryClient {
    collections: Mutex<HashMap<CollectionKey, Vec<Document>>>,
    fail_points: Mutex<HashMap<String, FailPoint>>,
    recorder: EventRecorder,
    next_id: AtomicI64,
    server_version: Version,
    topology: Topology,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClient {
    /// Create a client reporting server version `7.0.0` on a single node
    pub fn new() -> Self {
        Self::with_server(Version::new(7, 0, 0), Topology::Single)
    }

    /// Create a client reporting the given server version and topology
    pub fn with_server(server_version: Version, topology: Topology) -> Self {
        MemoryClient {
            collections: Mutex::new(HashMap::new()),
            fail_points: Mutex::new(HashMap::new()),
            recorder: EventRecorder::new(),
            next_id: AtomicI64::new(1),
            server_version,
            topology,
        }
    }

    /// Emit the started event for a command, then honor any armed fail point
    fn begin_command(
        &self,
        command_name: &str,
        database: &str,
        command: Document,
    ) -> Result<(), ClientError> {
        debug!(command = command_name, database, "command started");
        self.recorder.record(CommandStartedEvent {
            command_name: command_name.to_string(),
            database_name: database.to_string(),
            command,
        });
        let mut fail_points = self.fail_points.lock();
        let mut tripped = None;
        for fail_point in fail_points.values_mut() {
            if let Some(err) = fail_point.trip(command_name) {
                tripped = Some(err);
                break;
            }
        }
        fail_points.retain(|_, fp| !fp.exhausted());
        match tripped {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn with_docs<R>(&self, key: &CollectionKey, f: impl FnOnce(&mut Vec<Document>) -> R) -> R {
        let mut collections = self.collections.lock();
        f(collections.entry(key.clone()).or_default())
    }

    fn ensure_id(&self, mut doc: Document) -> Document {
        if doc.get("_id").is_none() {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            // _id leads the stored document, as a server would materialize it
            let mut with_id = serde_json::Map::new();
            with_id.insert("_id".to_string(), Value::from(id));
            with_id.extend(doc.into_map());
            doc = Document::from_map(with_id);
        }
        doc
    }
}

impl Client for MemoryClient {
    fn database<'a>(&'a self, name: &str) -> Box<dyn Database + 'a> {
        Box::new(MemoryDatabase {
            client: self,
            name: name.to_string(),
        })
    }

    fn server_version(&self) -> Result<Version, ClientError> {
        Ok(self.server_version)
    }

    fn topology(&self) -> Result<Topology, ClientError> {
        Ok(self.topology)
    }

    fn run_admin_command(&self, command: &Document) -> Result<Document, ClientError> {
        match FailPoint::parse(command)? {
            ConfigureAction::Install { name, fail_point } => {
                debug!(fail_point = %name, "installing fail point");
                self.fail_points.lock().insert(name, fail_point);
            }
            ConfigureAction::Disable { name } => {
                debug!(fail_point = %name, "disabling fail point");
                self.fail_points.lock().remove(&name);
            }
        }
        Ok(Document::from_map(
            json!({"ok": 1})
                .as_object()
                .expect("literal object")
                .clone(),
        ))
    }

    fn events(&self) -> &EventRecorder {
        &self.recorder
    }
}

/// A bound in-memory database handle
pub struct MemoryDatabase<'a> {
    client: &'a MemoryClient,
    name: String,
}

impl Database for MemoryDatabase<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn collection<'a>(&'a self, name: &str) -> Box<dyn Collection + 'a> {
        Box::new(MemoryCollection {
            client: self.client,
            key: (self.name.clone(), name.to_string()),
        })
    }
}

/// A bound in-memory collection handle
pub struct MemoryCollection<'a> {
    client: &'a MemoryClient,
    key: CollectionKey,
}

impl MemoryCollection<'_> {
    fn command(&self, body: Value) -> Document {
        match body {
            Value::Object(map) => Document::from_map(map),
            _ => unreachable!("command bodies are always objects"),
        }
    }

    fn matching_docs(&self, filter: &Document) -> Result<Vec<Document>, ClientError> {
        self.client.with_docs(&self.key, |docs| {
            docs.iter()
                .filter_map(|doc| match filter::matches(filter, doc) {
                    Ok(true) => Some(Ok(doc.clone())),
                    Ok(false) => None,
                    Err(e) => Some(Err(e)),
                })
                .collect()
        })
    }

    fn insert_document(&self, doc: Document) -> Result<Value, ClientError> {
        let doc = self.client.ensure_id(doc);
        let id = doc.get("_id").cloned().expect("ensure_id populated _id");
        self.client.with_docs(&self.key, |docs| {
            let duplicate = docs
                .iter()
                .any(|d| d.get("_id").is_some_and(|existing| filter::values_equal(existing, &id)));
            if duplicate {
                return Err(ClientError::operation_with_code(
                    11000,
                    format!("duplicate key: {id}"),
                ));
            }
            docs.push(doc);
            Ok(id)
        })
    }

    fn update_matching(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
        multi: bool,
    ) -> Result<UpdateResult, ClientError> {
        let mut result = UpdateResult::default();
        let outcome = self.client.with_docs(&self.key, |docs| {
            for doc in docs.iter_mut() {
                if !filter::matches(&filter, doc)? {
                    continue;
                }
                result.matched_count += 1;
                if update::apply_update(doc, &update)? {
                    result.modified_count += 1;
                }
                if !multi {
                    break;
                }
            }
            Ok::<(), ClientError>(())
        });
        outcome?;

        if result.matched_count == 0 && options.upsert {
            let upserted = update::synthesize_upsert(&filter, &update)?;
            let id = self.insert_document(upserted)?;
            result.upserted_id = Some(id);
        }
        Ok(result)
    }

    fn run_aggregate(&self, pipeline: &[Document]) -> Result<Vec<Document>, ClientError> {
        let mut docs = self.client.with_docs(&self.key, |docs| docs.clone());
        for stage in pipeline {
            if stage.len() != 1 {
                return Err(ClientError::operation(
                    "pipeline stage must have exactly one field",
                ));
            }
            let (name, spec) = stage.iter().next().expect("stage has one field");
            match name.as_str() {
                "$match" => {
                    let match_filter = Document::from_value(spec.clone())
                        .map_err(|e| ClientError::InvalidArgument(e.to_string()))?;
                    docs = docs
                        .into_iter()
                        .filter_map(|doc| match filter::matches(&match_filter, &doc) {
                            Ok(true) => Some(Ok(doc)),
                            Ok(false) => None,
                            Err(e) => Some(Err(e)),
                        })
                        .collect::<Result<_, _>>()?;
                }
                "$sort" => {
                    let sort = Document::from_value(spec.clone())
                        .map_err(|e| ClientError::InvalidArgument(e.to_string()))?;
                    filter::sort_documents(&mut docs, &sort);
                }
                "$skip" => {
                    let n = spec.as_u64().ok_or_else(|| {
                        ClientError::operation("$skip requires a non-negative integer")
                    })? as usize;
                    docs = docs.into_iter().skip(n).collect();
                }
                "$limit" => {
                    let n = spec.as_u64().ok_or_else(|| {
                        ClientError::operation("$limit requires a non-negative integer")
                    })? as usize;
                    docs.truncate(n);
                }
                "$project" => {
                    let projection = Document::from_value(spec.clone())
                        .map_err(|e| ClientError::InvalidArgument(e.to_string()))?;
                    docs = docs.into_iter().map(|doc| project(&doc, &projection)).collect();
                }
                "$out" => {
                    let target = spec.as_str().ok_or_else(|| {
                        ClientError::operation("$out requires a collection name")
                    })?;
                    let out_key = (self.key.0.clone(), target.to_string());
                    let results = docs.clone();
                    self.client.with_docs(&out_key, |out_docs| {
                        *out_docs = results;
                    });
                }
                other => {
                    return Err(ClientError::operation(format!(
                        "unrecognized pipeline stage '{other}'"
                    )));
                }
            }
        }
        Ok(docs)
    }
}

/// Inclusion projection over top-level fields; `_id` stays unless excluded
fn project(doc: &Document, projection: &Document) -> Document {
    let mut out = serde_json::Map::new();
    let id_excluded = projection
        .get("_id")
        .is_some_and(|v| v.as_i64() == Some(0) || v.as_bool() == Some(false));
    if !id_excluded {
        if let Some(id) = doc.get("_id") {
            out.insert("_id".to_string(), id.clone());
        }
    }
    for (field, include) in projection.iter() {
        if field == "_id" {
            continue;
        }
        let included = include.as_bool() == Some(true) || specdrive_core::as_f64(include) == Some(1.0);
        if included {
            if let Some(value) = doc.get(field) {
                out.insert(field.clone(), value.clone());
            }
        }
    }
    Document::from_map(out)
}

impl Collection for MemoryCollection<'_> {
    fn name(&self) -> &str {
        &self.key.1
    }

    fn insert_one(&self, document: Document) -> Result<InsertOneResult, ClientError> {
        let command = self.command(json!({
            "insert": self.key.1,
            "documents": [document.to_value()],
            "ordered": true,
        }));
        self.client.begin_command("insert", &self.key.0, command)?;
        let inserted_id = self.insert_document(document)?;
        Ok(InsertOneResult { inserted_id })
    }

    fn insert_many(&self, documents: Vec<Document>) -> Result<InsertManyResult, ClientError> {
        let command = self.command(json!({
            "insert": self.key.1,
            "documents": documents.iter().map(Document::to_value).collect::<Vec<_>>(),
            "ordered": true,
        }));
        self.client.begin_command("insert", &self.key.0, command)?;
        let mut inserted_ids = Vec::with_capacity(documents.len());
        // Ordered semantics: stop at the first failing document
        for document in documents {
            inserted_ids.push(self.insert_document(document)?);
        }
        Ok(InsertManyResult { inserted_ids })
    }

    fn delete_one(&self, filter: Document) -> Result<DeleteResult, ClientError> {
        let command = self.command(json!({
            "delete": self.key.1,
            "deletes": [{"q": filter.to_value(), "limit": 1}],
        }));
        self.client.begin_command("delete", &self.key.0, command)?;
        self.client.with_docs(&self.key, |docs| {
            let mut first_match = None;
            for (i, doc) in docs.iter().enumerate() {
                if filter::matches(&filter, doc)? {
                    first_match = Some(i);
                    break;
                }
            }
            match first_match {
                Some(i) => {
                    docs.remove(i);
                    Ok(DeleteResult { deleted_count: 1 })
                }
                None => Ok(DeleteResult { deleted_count: 0 }),
            }
        })
    }

    fn delete_many(&self, filter: Document) -> Result<DeleteResult, ClientError> {
        let command = self.command(json!({
            "delete": self.key.1,
            "deletes": [{"q": filter.to_value(), "limit": 0}],
        }));
        self.client.begin_command("delete", &self.key.0, command)?;
        self.client.with_docs(&self.key, |docs| {
            let before = docs.len();
            let mut failure = None;
            docs.retain(|doc| match filter::matches(&filter, doc) {
                Ok(matched) => !matched,
                Err(e) => {
                    failure.get_or_insert(e);
                    true
                }
            });
            match failure {
                Some(e) => Err(e),
                None => Ok(DeleteResult {
                    deleted_count: (before - docs.len()) as u64,
                }),
            }
        })
    }

    fn find(&self, filter: Document, options: FindOptions) -> Result<Vec<Document>, ClientError> {
        let mut body = json!({"find": self.key.1, "filter": filter.to_value()});
        let map = body.as_object_mut().expect("literal object");
        if let Some(sort) = &options.sort {
            map.insert("sort".to_string(), sort.to_value());
        }
        if let Some(skip) = options.skip {
            map.insert("skip".to_string(), Value::from(skip));
        }
        if let Some(limit) = options.limit {
            map.insert("limit".to_string(), Value::from(limit));
        }
        let command = self.command(body);
        self.client.begin_command("find", &self.key.0, command)?;

        let mut docs = self.matching_docs(&filter)?;
        if let Some(sort) = &options.sort {
            filter::sort_documents(&mut docs, sort);
        }
        if let Some(skip) = options.skip {
            docs = docs.into_iter().skip(skip as usize).collect();
        }
        if let Some(limit) = options.limit {
            if limit > 0 {
                docs.truncate(limit as usize);
            }
        }
        Ok(docs)
    }

    fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, ClientError> {
        let command = self.command(json!({
            "aggregate": self.key.1,
            "pipeline": pipeline.iter().map(Document::to_value).collect::<Vec<_>>(),
        }));
        self.client.begin_command("aggregate", &self.key.0, command)?;
        self.run_aggregate(&pipeline)
    }

    fn distinct(&self, field_name: &str, filter: Document) -> Result<Vec<Value>, ClientError> {
        let command = self.command(json!({
            "distinct": self.key.1,
            "key": field_name,
            "query": filter.to_value(),
        }));
        self.client.begin_command("distinct", &self.key.0, command)?;

        let mut values: Vec<Value> = Vec::new();
        for doc in self.matching_docs(&filter)? {
            let candidates: Vec<Value> = match filter::lookup(&doc, field_name) {
                Some(Value::Array(items)) => items.clone(),
                Some(value) => vec![value.clone()],
                None => continue,
            };
            for candidate in candidates {
                if !values.iter().any(|v| filter::values_equal(v, &candidate)) {
                    values.push(candidate);
                }
            }
        }
        Ok(values)
    }

    fn count_documents(
        &self,
        filter: Document,
        options: CountOptions,
    ) -> Result<u64, ClientError> {
        let command = self.command(json!({
            "count": self.key.1,
            "query": filter.to_value(),
        }));
        self.client.begin_command("count", &self.key.0, command)?;

        let mut count = self.matching_docs(&filter)?.len() as u64;
        if let Some(skip) = options.skip {
            count = count.saturating_sub(skip);
        }
        if let Some(limit) = options.limit {
            if limit > 0 {
                count = count.min(limit as u64);
            }
        }
        Ok(count)
    }

    fn replace_one(
        &self,
        filter: Document,
        replacement: Document,
        options: UpdateOptions,
    ) -> Result<UpdateResult, ClientError> {
        if !update::is_replacement_document(&replacement) {
            return Err(ClientError::InvalidArgument(
                "replacement document must not contain atomic operators".to_string(),
            ));
        }
        let command = self.command(json!({
            "update": self.key.1,
            "updates": [{
                "q": filter.to_value(),
                "u": replacement.to_value(),
                "upsert": options.upsert,
                "multi": false,
            }],
        }));
        self.client.begin_command("update", &self.key.0, command)?;

        let mut result = UpdateResult::default();
        let replaced = self.client.with_docs(&self.key, |docs| {
            for doc in docs.iter_mut() {
                if !filter::matches(&filter, doc)? {
                    continue;
                }
                result.matched_count = 1;
                // The replacement keeps the matched document's _id
                let mut new_doc = serde_json::Map::new();
                if let Some(id) = doc.get("_id") {
                    new_doc.insert("_id".to_string(), id.clone());
                }
                for (k, v) in replacement.iter() {
                    if k != "_id" {
                        new_doc.insert(k.clone(), v.clone());
                    }
                }
                let new_doc = Document::from_map(new_doc);
                if !filter::values_equal(&doc.to_value(), &new_doc.to_value()) {
                    result.modified_count = 1;
                }
                *doc = new_doc;
                return Ok::<bool, ClientError>(true);
            }
            Ok(false)
        })?;

        if !replaced && options.upsert {
            let id = self.insert_document(replacement)?;
            result.upserted_id = Some(id);
        }
        Ok(result)
    }

    fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> Result<UpdateResult, ClientError> {
        let command = self.command(json!({
            "update": self.key.1,
            "updates": [{
                "q": filter.to_value(),
                "u": update.to_value(),
                "upsert": options.upsert,
                "multi": false,
            }],
        }));
        self.client.begin_command("update", &self.key.0, command)?;
        self.update_matching(filter, update, options, false)
    }

    fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> Result<UpdateResult, ClientError> {
        let command = self.command(json!({
            "update": self.key.1,
            "updates": [{
                "q": filter.to_value(),
                "u": update.to_value(),
                "upsert": options.upsert,
                "multi": true,
            }],
        }));
        self.client.begin_command("update", &self.key.0, command)?;
        self.update_matching(filter, update, options, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    fn seeded(docs: &[Value]) -> MemoryClient {
        let client = MemoryClient::new();
        {
            let db = client.database("crud_test");
            let coll = db.collection("test");
            coll.insert_many(docs.iter().cloned().map(doc).collect()).unwrap();
        }
        client.events().clear();
        client
    }

    #[test]
    fn test_insert_and_find() {
        let client = seeded(&[json!({"_id": 1, "x": 11}), json!({"_id": 2, "x": 22})]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        let found = coll.find(doc(json!({"x": {"$gt": 11}})), FindOptions::default()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_i64("_id").unwrap(), 2);
    }

    #[test]
    fn test_insert_one_duplicate_id() {
        let client = seeded(&[json!({"_id": 1})]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        let err = coll.insert_one(doc(json!({"_id": 1}))).unwrap_err();
        assert!(matches!(err, ClientError::Operation { code: Some(11000), .. }));
    }

    #[test]
    fn test_insert_generates_id_when_missing() {
        let client = MemoryClient::new();
        let db = client.database("crud_test");
        let coll = db.collection("test");
        let result = coll.insert_one(doc(json!({"x": 1}))).unwrap();
        assert!(result.inserted_id.is_number());
    }

    #[test]
    fn test_delete_one_and_many() {
        let client = seeded(&[
            json!({"_id": 1, "x": 1}),
            json!({"_id": 2, "x": 1}),
            json!({"_id": 3, "x": 2}),
        ]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        assert_eq!(coll.delete_one(doc(json!({"x": 1}))).unwrap().deleted_count, 1);
        assert_eq!(coll.delete_many(doc(json!({}))).unwrap().deleted_count, 2);
        assert!(coll.find(Document::new(), FindOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_find_sort_skip_limit() {
        let client = seeded(&[
            json!({"_id": 1, "x": 30}),
            json!({"_id": 2, "x": 10}),
            json!({"_id": 3, "x": 20}),
            json!({"_id": 4, "x": 40}),
        ]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        let found = coll
            .find(
                Document::new(),
                FindOptions {
                    sort: Some(doc(json!({"x": 1}))),
                    skip: Some(1),
                    limit: Some(2),
                },
            )
            .unwrap();
        let ids: Vec<i64> = found.iter().map(|d| d.get_i64("_id").unwrap()).collect();
        assert_eq!(ids, [3, 1]);
    }

    #[test]
    fn test_update_one_set_and_inc() {
        let client = seeded(&[json!({"_id": 1, "x": 1}), json!({"_id": 2, "x": 1})]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        let result = coll
            .update_one(doc(json!({"x": 1})), doc(json!({"$inc": {"x": 1}})), UpdateOptions::default())
            .unwrap();
        assert_eq!((result.matched_count, result.modified_count), (1, 1));
        let found = coll.find(doc(json!({"_id": 1})), FindOptions::default()).unwrap();
        assert_eq!(found[0].get_i64("x").unwrap(), 2);
    }

    #[test]
    fn test_update_many() {
        let client = seeded(&[json!({"_id": 1, "x": 1}), json!({"_id": 2, "x": 1})]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        let result = coll
            .update_many(doc(json!({"x": 1})), doc(json!({"$set": {"x": 9}})), UpdateOptions::default())
            .unwrap();
        assert_eq!((result.matched_count, result.modified_count), (2, 2));
    }

    #[test]
    fn test_update_one_upsert() {
        let client = seeded(&[]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        let result = coll
            .update_one(
                doc(json!({"_id": 5})),
                doc(json!({"$set": {"x": 1}})),
                UpdateOptions { upsert: true },
            )
            .unwrap();
        assert_eq!(result.matched_count, 0);
        assert_eq!(result.upserted_id, Some(json!(5)));
        let found = coll.find(doc(json!({"_id": 5})), FindOptions::default()).unwrap();
        assert_eq!(found[0].to_value(), json!({"_id": 5, "x": 1}));
    }

    #[test]
    fn test_replace_one_preserves_id() {
        let client = seeded(&[json!({"_id": 1, "x": 1})]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        let result = coll
            .replace_one(doc(json!({"x": 1})), doc(json!({"y": 7})), UpdateOptions::default())
            .unwrap();
        assert_eq!((result.matched_count, result.modified_count), (1, 1));
        let found = coll.find(Document::new(), FindOptions::default()).unwrap();
        assert_eq!(found[0].to_value(), json!({"_id": 1, "y": 7}));
    }

    #[test]
    fn test_replace_one_rejects_operators() {
        let client = seeded(&[json!({"_id": 1})]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        let err = coll
            .replace_one(doc(json!({})), doc(json!({"$set": {"x": 1}})), UpdateOptions::default())
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[test]
    fn test_distinct_flattens_arrays() {
        let client = seeded(&[
            json!({"_id": 1, "tags": ["a", "b"]}),
            json!({"_id": 2, "tags": "b"}),
            json!({"_id": 3}),
        ]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        let values = coll.distinct("tags", Document::new()).unwrap();
        assert_eq!(values, vec![json!("a"), json!("b")]);
    }

    #[test]
    fn test_count_documents_with_skip_limit() {
        let client = seeded(&[json!({"_id": 1}), json!({"_id": 2}), json!({"_id": 3})]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        assert_eq!(coll.count_documents(Document::new(), CountOptions::default()).unwrap(), 3);
        assert_eq!(
            coll.count_documents(
                Document::new(),
                CountOptions { skip: Some(1), limit: Some(1) }
            )
            .unwrap(),
            1
        );
    }

    #[test]
    fn test_aggregate_match_sort_out() {
        let client = seeded(&[
            json!({"_id": 1, "x": 30}),
            json!({"_id": 2, "x": 10}),
            json!({"_id": 3, "x": 20}),
        ]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        let results = coll
            .aggregate(vec![
                doc(json!({"$match": {"x": {"$gt": 10}}})),
                doc(json!({"$sort": {"x": 1}})),
                doc(json!({"$out": "other_test_collection"})),
            ])
            .unwrap();
        assert_eq!(results.len(), 2);
        let out = db.collection("other_test_collection");
        let stored = out.find(Document::new(), FindOptions::default()).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].get_i64("_id").unwrap(), 3);
    }

    #[test]
    fn test_aggregate_project() {
        let client = seeded(&[json!({"_id": 1, "x": 1, "y": 2})]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        let results = coll
            .aggregate(vec![doc(json!({"$project": {"_id": 0, "x": 1}}))])
            .unwrap();
        assert_eq!(results[0].to_value(), json!({"x": 1}));
    }

    #[test]
    fn test_aggregate_unknown_stage() {
        let client = seeded(&[]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        let err = coll.aggregate(vec![doc(json!({"$facet": {}}))]).unwrap_err();
        assert!(matches!(err, ClientError::Operation { .. }));
    }

    #[test]
    fn test_events_emitted_with_wire_shape() {
        let client = seeded(&[json!({"_id": 1})]);
        let db = client.database("crud_test");
        let coll = db.collection("test");
        coll.find(doc(json!({"_id": 1})), FindOptions::default()).unwrap();
        let events = client.events().snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].command_name, "find");
        assert_eq!(events[0].database_name, "crud_test");
        assert_eq!(events[0].command.get_str("find").unwrap(), "test");
    }

    #[test]
    fn test_fail_point_trips_then_exhausts() {
        let client = seeded(&[json!({"_id": 1})]);
        client
            .run_admin_command(&doc(json!({
                "configureFailPoint": "failCommand",
                "mode": {"times": 1},
                "data": {"failCommands": ["insert"], "errorCode": 100}
            })))
            .unwrap();
        let db = client.database("crud_test");
        let coll = db.collection("test");
        let err = coll.insert_one(doc(json!({"_id": 2}))).unwrap_err();
        assert!(matches!(err, ClientError::Operation { code: Some(100), .. }));
        // Armed count exhausted, next insert succeeds
        coll.insert_one(doc(json!({"_id": 2}))).unwrap();
    }

    #[test]
    fn test_fail_point_disable() {
        let client = seeded(&[]);
        client
            .run_admin_command(&doc(json!({
                "configureFailPoint": "failCommand",
                "mode": "alwaysOn",
                "data": {"failCommands": ["insert"]}
            })))
            .unwrap();
        client
            .run_admin_command(&doc(json!({
                "configureFailPoint": "failCommand",
                "mode": "off"
            })))
            .unwrap();
        let db = client.database("crud_test");
        let coll = db.collection("test");
        coll.insert_one(doc(json!({"_id": 1}))).unwrap();
    }
}
