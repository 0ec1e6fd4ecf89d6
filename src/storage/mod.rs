//! Document store abstraction consumed by the stock ledger.
//!
//! The store holds schemaless JSON documents grouped into collections. Mutations that must stay
//! consistent with each other go through [`DocumentStore::run_transaction`], which buffers writes
//! and commits them atomically, re-running the body when a document it read changed underneath it.

pub mod json_backend;
pub mod memory_backend;

use std::fmt;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{Result, StockError};

pub use json_backend::{JsonSnapshotStore, StoreSnapshot, SNAPSHOT_SCHEMA_VERSION};
pub use memory_backend::MemoryStore;

/// Field every document carries to scope it to an account.
pub const OWNER_FIELD: &str = "ownerId";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Products,
    Purchases,
    Sales,
    Customers,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Products,
        Collection::Purchases,
        Collection::Sales,
        Collection::Customers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Purchases => "purchases",
            Collection::Sales => "sales",
            Collection::Customers => "customers",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored document together with its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub data: Value,
}

impl Document {
    pub fn new(id: Uuid, data: Value) -> Self {
        Self { id, data }
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.data.get(OWNER_FIELD).and_then(Value::as_str)
    }

    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner_id() == Some(owner)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Decodes every document of a snapshot, failing on the first malformed entry.
pub fn decode_all<T: DeserializeOwned>(documents: &[Document]) -> Result<Vec<T>> {
    documents.iter().map(Document::decode).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the whole document.
    Replace,
    /// Shallow-merge top-level fields into the existing document.
    Merge,
}

/// Handle passed to a transaction body.
///
/// Reads observe committed state (plus this transaction's own pending writes). Writes are
/// buffered and only become visible when the store commits the transaction.
pub trait StoreTransaction {
    fn read(&mut self, collection: Collection, id: Uuid) -> Result<Option<Value>>;
    fn write(&mut self, collection: Collection, id: Uuid, data: Value, mode: WriteMode);
    fn delete(&mut self, collection: Collection, id: Uuid);
}

impl<'a> dyn StoreTransaction + 'a {
    /// Reads and decodes a document.
    pub fn get<T: DeserializeOwned>(&mut self, collection: Collection, id: Uuid) -> Result<Option<T>> {
        match self.read(collection, id)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serializes and buffers a full replacement of a document.
    pub fn put<T: Serialize>(&mut self, collection: Collection, id: Uuid, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.write(collection, id, value, WriteMode::Replace);
        Ok(())
    }

    /// Serializes `record` and merges its fields over the stored document, keeping extra fields.
    pub fn put_merged<T: Serialize>(
        &mut self,
        collection: Collection,
        id: Uuid,
        record: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.write(collection, id, value, WriteMode::Merge);
        Ok(())
    }
}

pub type TransactionBody<'a> = dyn FnMut(&mut dyn StoreTransaction) -> Result<()> + 'a;

/// Transactional document database with owner-scoped queries and live subscriptions.
pub trait DocumentStore: Send + Sync {
    /// Runs `body` atomically. The body may be invoked more than once when a concurrent commit
    /// touched a document it read; an error returned by the body aborts with no effect.
    fn run_transaction(&self, body: &mut TransactionBody<'_>) -> Result<()>;

    /// Returns every document of `collection` whose owner field equals `owner`.
    fn query(&self, collection: Collection, owner: &str) -> Result<Vec<Document>>;

    /// Pushes the current matching set immediately and again after every change to it.
    fn subscribe(&self, collection: Collection, owner: &str) -> Result<Subscription>;

    /// Inserts a document under a freshly generated id, which is also stored in its `id` field.
    fn insert(&self, collection: Collection, mut data: Value) -> Result<Uuid> {
        let id = Uuid::new_v4();
        if let Value::Object(fields) = &mut data {
            fields.insert("id".into(), Value::String(id.to_string()));
        }
        self.set(collection, id, data, WriteMode::Replace)?;
        Ok(id)
    }

    fn set(&self, collection: Collection, id: Uuid, data: Value, mode: WriteMode) -> Result<()> {
        self.run_transaction(&mut |txn: &mut dyn StoreTransaction| {
            txn.write(collection, id, data.clone(), mode);
            Ok(())
        })
    }

    fn remove(&self, collection: Collection, id: Uuid) -> Result<()> {
        self.run_transaction(&mut |txn: &mut dyn StoreTransaction| {
            txn.delete(collection, id);
            Ok(())
        })
    }
}

/// Runs a transaction body that produces a value.
pub fn transact<T, F>(store: &dyn DocumentStore, mut body: F) -> Result<T>
where
    F: FnMut(&mut dyn StoreTransaction) -> Result<T>,
{
    let mut outcome = None;
    store.run_transaction(&mut |txn: &mut dyn StoreTransaction| {
        outcome = Some(body(txn)?);
        Ok(())
    })?;
    outcome.ok_or_else(|| {
        StockError::StoreUnavailable("transaction committed without producing a result".into())
    })
}

/// Item delivered on a subscription feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Snapshot(Vec<Document>),
    Error(String),
}

/// Live, cancellable feed of full-collection snapshots.
pub struct Subscription {
    collection: Collection,
    receiver: Receiver<FeedEvent>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        collection: Collection,
        receiver: Receiver<FeedEvent>,
        cancel: Box<dyn FnOnce() + Send>,
    ) -> Self {
        Self {
            collection,
            receiver,
            cancel: Some(cancel),
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Blocks until the next event. Returns `None` once the feed is closed and drained.
    pub fn recv(&self) -> Option<FeedEvent> {
        self.receiver.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<FeedEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_recv(&self) -> Option<FeedEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drains pending events and returns the newest snapshot, if any arrived.
    pub fn latest(&self) -> Option<Vec<Document>> {
        let mut newest = None;
        while let Some(event) = self.try_recv() {
            if let FeedEvent::Snapshot(documents) = event {
                newest = Some(documents);
            }
        }
        newest
    }

    pub fn receiver(&self) -> &Receiver<FeedEvent> {
        &self.receiver
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Detaches the feed from the store. Calling it again is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("collection", &self.collection)
            .field("active", &self.is_active())
            .finish()
    }
}
