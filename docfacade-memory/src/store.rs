//! In-memory driver implementation for the connection facade.
//!
//! [`InMemoryConnector`] plays the role of the server: every backend it hands
//! out shares the same databases, so reconnecting keeps the data. Documents
//! are kept in insertion order per collection behind an async-safe read-write lock.

use std::{
    collections::HashMap,
    sync::{Arc, atomic::{AtomicBool, Ordering}},
    time::Duration,
};
use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use mea::rwlock::RwLock;

use docfacade_core::{
    backend::{DriverBackend, DriverConnector, Namespace, WriteSummary},
    error::{FacadeError, FacadeResult},
    options::{DeleteOptions, FindOptions, InsertOneOptions, ReplaceOptions, UpdateOptions},
};

use crate::{
    evaluator::{DocumentEvaluator, apply_update, project, sort_documents, upsert_seed},
    fault::{DriverOperation, FaultPlan},
};

type CollectionMap = HashMap<String, Vec<Document>>;
type DatabaseMap = HashMap<String, CollectionMap>;


#[derive(Debug, Default)]
struct MemoryState {
    /// database name -> (collection name -> documents)
    databases: DatabaseMap,
    faults: FaultPlan,
}

impl MemoryState {
    fn collection(&self, namespace: &Namespace) -> Option<&Vec<Document>> {
        self.databases
            .get(&namespace.database)
            .and_then(|collections| collections.get(&namespace.collection))
    }

    fn collection_mut(&mut self, namespace: &Namespace) -> &mut Vec<Document> {
        self.databases
            .entry(namespace.database.clone())
            .or_default()
            .entry(namespace.collection.clone())
            .or_default()
    }
}

fn position(documents: &[Document], filter: &Document) -> FacadeResult<Option<usize>> {
    for (index, document) in documents.iter().enumerate() {
        if DocumentEvaluator::new(document).matches(filter)? {
            return Ok(Some(index));
        }
    }

    Ok(None)
}

fn with_id(mut document: Document) -> Document {
    if !document.contains_key("_id") {
        document.insert("_id", ObjectId::new());
    }
    document
}

/// Connector for the in-memory server.
///
/// Cloning is cheap and every clone controls the same server, so a test can
/// keep a clone to inject faults after handing the original to a facade.
///
/// # Example
///
/// ```ignore
/// use docfacade_memory::{InMemoryConnector, DriverOperation};
///
/// let connector = InMemoryConnector::new();
/// connector.fail_next(DriverOperation::InsertOne, 1).await;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryConnector {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the server (un)reachable. While unreachable every call except
    /// disconnect fails.
    pub async fn set_reachable(&self, reachable: bool) {
        self.state.write().await.faults.reachable = reachable;
    }

    /// Fails the next `times` calls of `operation`.
    pub async fn fail_next(&self, operation: DriverOperation, times: u32) {
        self.state
            .write()
            .await
            .faults
            .fail_next(operation, times);
    }

    /// Delays every subsequent connect by `delay`.
    pub async fn set_connect_delay(&self, delay: Duration) {
        self.state.write().await.faults.connect_delay = delay;
    }

    /// How many times `operation` has been attempted, failed attempts included.
    pub async fn call_count(&self, operation: DriverOperation) -> u32 {
        self.state.read().await.faults.calls(operation)
    }

    /// The connection string used by the most recent connect attempt.
    pub async fn last_uri(&self) -> Option<String> {
        self.state.read().await.faults.last_uri.clone()
    }

    /// Stores documents directly, bypassing fault injection.
    pub async fn seed(&self, namespace: &Namespace, documents: impl IntoIterator<Item = Document>) {
        self.state
            .write()
            .await
            .collection_mut(namespace)
            .extend(documents.into_iter().map(with_id));
    }

    /// Snapshot of a collection, in insertion order.
    pub async fn documents(&self, namespace: &Namespace) -> Vec<Document> {
        self.state
            .read()
            .await
            .collection(namespace)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DriverConnector for InMemoryConnector {
    type Backend = InMemoryBackend;

    async fn connect(&self, uri: &str, _timeout: Duration) -> FacadeResult<Self::Backend> {
        let delay = {
            let mut state = self.state.write().await;
            state.faults.last_uri = Some(uri.to_string());
            state.faults.record(DriverOperation::Connect)?;
            state.faults.connect_delay
        };

        if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
            return Err(FacadeError::Connection(
                "connection string must start with mongodb:// or mongodb+srv://".into(),
            ));
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        tracing::debug!("in-memory connection established");

        Ok(InMemoryBackend {
            state: self.state.clone(),
            closed: AtomicBool::new(false),
        })
    }
}

/// A connection handle to the in-memory server.
#[derive(Debug)]
pub struct InMemoryBackend {
    state: Arc<RwLock<MemoryState>>,
    closed: AtomicBool,
}

impl InMemoryBackend {
    fn admit(&self, faults: &mut FaultPlan, operation: DriverOperation) -> FacadeResult<()> {
        faults.record(operation)?;

        if self.closed.load(Ordering::SeqCst) {
            return Err(FacadeError::Driver("connection is closed".into()));
        }

        Ok(())
    }
}

#[async_trait]
impl DriverBackend for InMemoryBackend {
    async fn ping(&self) -> FacadeResult<()> {
        let mut state = self.state.write().await;
        self.admit(&mut state.faults, DriverOperation::Ping)
    }

    async fn disconnect(&self) -> FacadeResult<()> {
        let mut state = self.state.write().await;
        self.admit(&mut state.faults, DriverOperation::Disconnect)?;
        self.closed.store(true, Ordering::SeqCst);

        Ok(())
    }

    async fn find_one(&self, namespace: &Namespace, filter: Document) -> FacadeResult<Option<Document>> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        self.admit(&mut state.faults, DriverOperation::FindOne)?;

        let Some(documents) = state.collection(namespace) else {
            return Ok(None);
        };

        Ok(
            position(documents, &filter)?
                .map(|index| documents[index].clone())
        )
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> FacadeResult<Vec<Document>> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        self.admit(&mut state.faults, DriverOperation::Find)?;

        let Some(documents) = state.collection(namespace) else {
            return Ok(vec![]);
        };

        let mut matched = Vec::new();
        for document in documents {
            if DocumentEvaluator::new(document).matches(&filter)? {
                matched.push(document.clone());
            }
        }

        if let Some(sort) = &options.sort {
            sort_documents(&mut matched, sort);
        }

        let limit = match options.limit {
            Some(limit) if limit != 0 => limit.unsigned_abs() as usize,
            _ => usize::MAX,
        };

        Ok(
            matched
                .into_iter()
                .skip(options.skip.unwrap_or(0) as usize)
                .take(limit)
                .map(|document| match &options.projection {
                    Some(projection) => project(document, projection),
                    None => document,
                })
                .collect()
        )
    }

    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
        _options: InsertOneOptions,
    ) -> FacadeResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        self.admit(&mut state.faults, DriverOperation::InsertOne)?;

        let document = with_id(document);
        let documents = state.collection_mut(namespace);
        let id = document.get("_id").cloned().unwrap_or(Bson::Null);

        if documents.iter().any(|existing| existing.get("_id") == Some(&id)) {
            return Err(FacadeError::Driver(format!(
                "E11000 duplicate key error collection: {} dup key: {{ _id: {} }}",
                namespace, id,
            )));
        }

        documents.push(document);

        Ok(())
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> FacadeResult<WriteSummary> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        self.admit(&mut state.faults, DriverOperation::UpdateOne)?;

        let documents = state.collection_mut(namespace);

        match position(documents, &filter)? {
            Some(index) => {
                let mut updated = documents[index].clone();
                apply_update(&mut updated, &update)?;

                let modified = updated != documents[index];
                documents[index] = updated;

                Ok(WriteSummary {
                    matched_count: 1,
                    modified_count: modified as u64,
                    upserted: false,
                })
            }
            None if options.upsert == Some(true) => {
                let mut seeded = upsert_seed(&filter)?;
                apply_update(&mut seeded, &update)?;
                documents.push(with_id(seeded));

                Ok(WriteSummary { upserted: true, ..WriteSummary::default() })
            }
            None => Ok(WriteSummary::default()),
        }
    }

    async fn replace_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        replacement: Document,
        options: ReplaceOptions,
    ) -> FacadeResult<WriteSummary> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        self.admit(&mut state.faults, DriverOperation::ReplaceOne)?;

        if replacement.keys().any(|key| key.starts_with('$')) {
            return Err(FacadeError::Driver("replacement document must not contain update operators".into()));
        }

        let documents = state.collection_mut(namespace);

        match position(documents, &filter)? {
            Some(index) => {
                let id = documents[index].get("_id").cloned().unwrap_or(Bson::Null);
                if replacement.get("_id").is_some_and(|new_id| new_id != &id) {
                    return Err(FacadeError::Driver("the _id field is immutable".into()));
                }

                let mut replaced = Document::new();
                replaced.insert("_id", id);
                for (key, value) in replacement {
                    if key != "_id" {
                        replaced.insert(key, value);
                    }
                }

                let modified = replaced != documents[index];
                documents[index] = replaced;

                Ok(WriteSummary {
                    matched_count: 1,
                    modified_count: modified as u64,
                    upserted: false,
                })
            }
            None if options.upsert == Some(true) => {
                let seed = upsert_seed(&filter)?;
                let mut seeded = Document::new();
                if let Some(id) = seed.get("_id").or(replacement.get("_id")) {
                    seeded.insert("_id", id.clone());
                }
                for (key, value) in replacement {
                    if key != "_id" {
                        seeded.insert(key, value);
                    }
                }
                documents.push(with_id(seeded));

                Ok(WriteSummary { upserted: true, ..WriteSummary::default() })
            }
            None => Ok(WriteSummary::default()),
        }
    }

    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        _options: DeleteOptions,
    ) -> FacadeResult<u64> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        self.admit(&mut state.faults, DriverOperation::DeleteOne)?;

        let documents = state.collection_mut(namespace);

        Ok(match position(documents, &filter)? {
            Some(index) => {
                documents.remove(index);
                1
            }
            None => 0,
        })
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        _options: DeleteOptions,
    ) -> FacadeResult<u64> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        self.admit(&mut state.faults, DriverOperation::DeleteMany)?;

        let documents = state.collection_mut(namespace);
        let keep = documents
            .iter()
            .map(|document| DocumentEvaluator::new(document).matches(&filter).map(|matched| !matched))
            .collect::<FacadeResult<Vec<bool>>>()?;

        let before = documents.len();
        let mut flags = keep.into_iter();
        documents.retain(|_| flags.next().unwrap_or(true));

        Ok((before - documents.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use bson::{Binary, doc, spec::BinarySubtype};
    use super::*;

    fn users() -> Namespace {
        Namespace::new("test", "users")
    }

    async fn backend() -> (InMemoryConnector, InMemoryBackend) {
        let connector = InMemoryConnector::new();
        let backend = connector
            .connect("mongodb+srv://u:p@cluster0.example.net/test", Duration::from_secs(10))
            .await
            .unwrap();

        (connector, backend)
    }

    #[tokio::test]
    async fn connect_records_uri_and_rejects_unknown_scheme() {
        let connector = InMemoryConnector::new();

        assert!(connector.connect("postgres://x", Duration::from_secs(1)).await.is_err());
        assert_eq!(connector.last_uri().await.as_deref(), Some("postgres://x"));
        assert_eq!(connector.call_count(DriverOperation::Connect).await, 1);
    }

    #[tokio::test]
    async fn insert_assigns_id_and_rejects_duplicates() {
        let (connector, backend) = backend().await;

        backend.insert_one(&users(), doc! { "name": "Alice" }, Default::default()).await.unwrap();
        backend.insert_one(&users(), doc! { "_id": 7, "name": "Bob" }, Default::default()).await.unwrap();

        let stored = connector.documents(&users()).await;
        assert_eq!(stored.len(), 2);
        assert!(matches!(stored[0].get("_id"), Some(Bson::ObjectId(_))));

        let duplicate = backend.insert_one(&users(), doc! { "_id": 7 }, Default::default()).await;
        assert!(matches!(duplicate, Err(FacadeError::Driver(message)) if message.starts_with("E11000")));
    }

    #[tokio::test]
    async fn find_applies_filter_sort_skip_limit_projection() {
        let (connector, backend) = backend().await;
        connector
            .seed(&users(), (1..=5).map(|n| doc! { "_id": n, "n": n, "even": n % 2 == 0 }))
            .await;

        let found = backend
            .find(
                &users(),
                doc! { "n": { "$gte": 2 } },
                FindOptions::builder()
                    .sort(doc! { "n": -1 })
                    .skip(1)
                    .limit(2)
                    .projection(doc! { "n": 1, "_id": 0 })
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(found, vec![doc! { "n": 4 }, doc! { "n": 3 }]);
    }

    #[tokio::test]
    async fn update_and_replace_keep_id() {
        let (connector, backend) = backend().await;
        connector.seed(&users(), [doc! { "_id": 1, "name": "Alice", "age": 30 }]).await;

        let summary = backend
            .update_one(&users(), doc! { "_id": 1 }, doc! { "$set": { "age": 31 } }, Default::default())
            .await
            .unwrap();
        assert_eq!(summary, WriteSummary { matched_count: 1, modified_count: 1, upserted: false });

        backend
            .replace_one(&users(), doc! { "_id": 1 }, doc! { "name": "Alicia" }, Default::default())
            .await
            .unwrap();

        assert_eq!(connector.documents(&users()).await, vec![doc! { "_id": 1, "name": "Alicia" }]);
    }

    #[tokio::test]
    async fn update_upserts_from_filter() {
        let (connector, backend) = backend().await;

        let summary = backend
            .update_one(
                &users(),
                doc! { "name": "Carol" },
                doc! { "$set": { "age": 40 } },
                UpdateOptions { upsert: Some(true) },
            )
            .await
            .unwrap();

        assert!(summary.upserted);
        let stored = connector.documents(&users()).await;
        assert_eq!(stored[0].get_str("name").unwrap(), "Carol");
        assert_eq!(stored[0].get_i32("age").unwrap(), 40);
    }

    #[tokio::test]
    async fn find_one_tells_binary_keys_apart() {
        let (connector, backend) = backend().await;
        let key = |byte: u8| Binary { subtype: BinarySubtype::Generic, bytes: vec![byte] };
        connector
            .seed(&users(), [doc! { "_id": 1, "key": key(1) }, doc! { "_id": 2, "key": key(2) }])
            .await;

        let found = backend.find_one(&users(), doc! { "key": key(2) }).await.unwrap();
        assert_eq!(found.and_then(|document| document.get_i32("_id").ok()), Some(2));
        assert_eq!(backend.find_one(&users(), doc! { "other": key(2) }).await.unwrap(), None);
    }

    #[tokio::test]
    async fn increment_overflow_fails_and_leaves_document_intact() {
        let (connector, backend) = backend().await;
        connector.seed(&users(), [doc! { "_id": 1, "n": i32::MAX }]).await;

        let result = backend
            .update_one(&users(), doc! { "_id": 1 }, doc! { "$inc": { "n": 1 } }, Default::default())
            .await;

        assert!(matches!(result, Err(FacadeError::Driver(message)) if message.contains("overflow")));
        assert_eq!(connector.documents(&users()).await, vec![doc! { "_id": 1, "n": i32::MAX }]);
        assert!(backend.ping().await.is_ok());
    }

    #[tokio::test]
    async fn delete_one_and_many() {
        let (connector, backend) = backend().await;
        connector
            .seed(&users(), [doc! { "k": 1 }, doc! { "k": 1 }, doc! { "k": 2 }, doc! { "k": 1 }])
            .await;

        assert_eq!(backend.delete_one(&users(), doc! { "k": 1 }, Default::default()).await.unwrap(), 1);
        assert_eq!(backend.delete_many(&users(), doc! { "k": 1 }, Default::default()).await.unwrap(), 2);
        assert_eq!(backend.delete_many(&users(), doc! { "k": 1 }, Default::default()).await.unwrap(), 0);
        assert_eq!(connector.documents(&users()).await.len(), 1);
    }

    #[tokio::test]
    async fn closed_backend_rejects_calls() {
        let (_connector, backend) = backend().await;

        backend.disconnect().await.unwrap();

        assert!(backend.ping().await.is_err());
        assert!(backend.find_one(&users(), doc! {}).await.is_err());
    }

    #[tokio::test]
    async fn reconnect_sees_existing_data() {
        let (connector, backend) = backend().await;
        backend.insert_one(&users(), doc! { "name": "Alice" }, Default::default()).await.unwrap();
        backend.disconnect().await.unwrap();

        let reconnected = connector
            .connect("mongodb://u:p@localhost/test", Duration::from_secs(1))
            .await
            .unwrap();

        assert!(reconnected.find_one(&users(), doc! { "name": "Alice" }).await.unwrap().is_some());
    }
}
