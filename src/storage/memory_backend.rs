//! In-process document store with optimistic transactions and push subscriptions.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crossbeam_channel::{unbounded, Sender};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{Result, StockError};

use super::{
    Collection, Document, DocumentStore, FeedEvent, StoreSnapshot, StoreTransaction,
    Subscription, TransactionBody, WriteMode, OWNER_FIELD,
};

pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

type DocKey = (Collection, Uuid);

#[derive(Debug, Clone)]
struct Versioned {
    version: u64,
    data: Value,
}

struct Subscriber {
    id: u64,
    collection: Collection,
    owner: String,
    sender: Sender<FeedEvent>,
}

#[derive(Default)]
struct StoreState {
    documents: BTreeMap<DocKey, Versioned>,
    commit_seq: u64,
    next_subscriber: u64,
    subscribers: Vec<Subscriber>,
}

impl StoreState {
    fn matching(&self, collection: Collection, owner: &str) -> Vec<Document> {
        self.documents
            .range((collection, Uuid::nil())..=(collection, Uuid::from_u128(u128::MAX)))
            .filter(|(_, doc)| doc.data.get(OWNER_FIELD).and_then(Value::as_str) == Some(owner))
            .map(|((_, id), doc)| Document::new(*id, doc.data.clone()))
            .collect()
    }

    /// Pushes fresh snapshots to subscribers whose `(collection, owner)` set was touched.
    fn notify(&mut self, touched: &HashSet<(Collection, String)>) {
        let mut closed = Vec::new();
        for subscriber in &self.subscribers {
            if !touched.contains(&(subscriber.collection, subscriber.owner.clone())) {
                continue;
            }
            let snapshot = self.matching(subscriber.collection, &subscriber.owner);
            if subscriber.sender.send(FeedEvent::Snapshot(snapshot)).is_err() {
                closed.push(subscriber.id);
            }
        }
        if !closed.is_empty() {
            self.subscribers.retain(|sub| !closed.contains(&sub.id));
        }
    }

    fn broadcast_error(&self, message: &str) {
        for subscriber in &self.subscribers {
            let _ = subscriber.sender.send(FeedEvent::Error(message.to_string()));
        }
    }
}

fn owner_of(data: &Value) -> Option<String> {
    data.get(OWNER_FIELD).and_then(Value::as_str).map(str::to_string)
}

enum PendingWrite {
    Write(Value, WriteMode),
    Delete,
}

enum CommitOutcome {
    Committed,
    Conflict,
}

/// Shared in-memory document store.
///
/// Cloning is cheap and yields another handle onto the same data, which is how concurrent
/// writers are modelled in tests.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
    available: Arc<AtomicBool>,
    conflicts: Arc<AtomicU64>,
    max_attempts: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(max_attempts: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            available: Arc::new(AtomicBool::new(true)),
            conflicts: Arc::new(AtomicU64::new(0)),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Number of commits rejected because a document read by the transaction had changed.
    pub fn conflict_count(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    /// Simulates a backend outage. Subscribers receive an error event when the store goes down.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        if !available {
            if let Ok(state) = self.state.lock() {
                state.broadcast_error("document store went offline");
            }
        }
    }

    /// Copies every stored document into a serializable snapshot.
    pub fn export(&self) -> Result<StoreSnapshot> {
        let state = self.lock()?;
        let mut snapshot = StoreSnapshot::empty();
        for ((collection, id), doc) in &state.documents {
            snapshot
                .collections
                .entry(*collection)
                .or_default()
                .push(Document::new(*id, doc.data.clone()));
        }
        Ok(snapshot)
    }

    /// Replaces the store contents with `snapshot` and pushes fresh data to every subscriber.
    pub fn restore(&self, snapshot: StoreSnapshot) -> Result<()> {
        let mut state = self.lock()?;
        state.commit_seq += 1;
        let version = state.commit_seq;
        state.documents.clear();
        for (collection, documents) in snapshot.collections {
            for doc in documents {
                state.documents.insert(
                    (collection, doc.id),
                    Versioned {
                        version,
                        data: doc.data,
                    },
                );
            }
        }
        let touched: HashSet<(Collection, String)> = state
            .subscribers
            .iter()
            .map(|sub| (sub.collection, sub.owner.clone()))
            .collect();
        state.notify(&touched);
        Ok(())
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StockError::StoreUnavailable(
                "document store is offline".into(),
            ))
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| StockError::StoreUnavailable("store state lock poisoned".into()))
    }

    fn commit(&self, txn: MemoryTransaction<'_>) -> Result<CommitOutcome> {
        self.ensure_available()?;
        let mut state = self.lock()?;
        for (key, seen) in &txn.reads {
            let current = state.documents.get(key).map(|doc| doc.version);
            if current != *seen {
                return Ok(CommitOutcome::Conflict);
            }
        }
        if txn.writes.is_empty() {
            return Ok(CommitOutcome::Committed);
        }

        state.commit_seq += 1;
        let version = state.commit_seq;
        let mut touched = HashSet::new();
        for (key, pending) in txn.writes {
            if let Some(owner) = state.documents.get(&key).and_then(|doc| owner_of(&doc.data)) {
                touched.insert((key.0, owner));
            }
            match pending {
                PendingWrite::Delete => {
                    state.documents.remove(&key);
                }
                PendingWrite::Write(data, mode) => {
                    let merged = match (mode, state.documents.get(&key)) {
                        (WriteMode::Merge, Some(existing)) => merge_fields(&existing.data, data),
                        _ => data,
                    };
                    if let Some(owner) = owner_of(&merged) {
                        touched.insert((key.0, owner));
                    }
                    state.documents.insert(
                        key,
                        Versioned {
                            version,
                            data: merged,
                        },
                    );
                }
            }
        }
        state.notify(&touched);
        Ok(CommitOutcome::Committed)
    }
}

impl DocumentStore for MemoryStore {
    fn run_transaction(&self, body: &mut TransactionBody<'_>) -> Result<()> {
        for attempt in 1..=self.max_attempts {
            self.ensure_available()?;
            let mut txn = MemoryTransaction::new(self);
            body(&mut txn)?;
            match self.commit(txn)? {
                CommitOutcome::Committed => return Ok(()),
                CommitOutcome::Conflict => {
                    self.conflicts.fetch_add(1, Ordering::Relaxed);
                    debug!(attempt, "transaction conflicted with a concurrent commit; retrying");
                }
            }
        }
        warn!(
            attempts = self.max_attempts,
            "transaction abandoned after repeated conflicts"
        );
        Err(StockError::StoreUnavailable(format!(
            "transaction aborted after {} conflicting attempts",
            self.max_attempts
        )))
    }

    fn query(&self, collection: Collection, owner: &str) -> Result<Vec<Document>> {
        self.ensure_available()?;
        let state = self.lock()?;
        Ok(state.matching(collection, owner))
    }

    fn subscribe(&self, collection: Collection, owner: &str) -> Result<Subscription> {
        self.ensure_available()?;
        let (sender, receiver) = unbounded();
        let mut state = self.lock()?;
        let id = state.next_subscriber;
        state.next_subscriber += 1;
        // Initial snapshot goes out before the subscriber is registered so ordering holds.
        let _ = sender.send(FeedEvent::Snapshot(state.matching(collection, owner)));
        state.subscribers.push(Subscriber {
            id,
            collection,
            owner: owner.to_string(),
            sender,
        });
        drop(state);

        let handle: Weak<Mutex<StoreState>> = Arc::downgrade(&self.state);
        let cancel = Box::new(move || {
            if let Some(state) = handle.upgrade() {
                if let Ok(mut state) = state.lock() {
                    state.subscribers.retain(|sub| sub.id != id);
                }
            }
        });
        Ok(Subscription::new(collection, receiver, cancel))
    }
}

struct MemoryTransaction<'s> {
    store: &'s MemoryStore,
    reads: HashMap<DocKey, Option<u64>>,
    writes: Vec<(DocKey, PendingWrite)>,
}

impl<'s> MemoryTransaction<'s> {
    fn new(store: &'s MemoryStore) -> Self {
        Self {
            store,
            reads: HashMap::new(),
            writes: Vec::new(),
        }
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn read(&mut self, collection: Collection, id: Uuid) -> Result<Option<Value>> {
        self.store.ensure_available()?;
        let key = (collection, id);
        let committed = {
            let state = self.store.lock()?;
            state.documents.get(&key).cloned()
        };
        self.reads
            .entry(key)
            .or_insert_with(|| committed.as_ref().map(|doc| doc.version));

        let mut view = committed.map(|doc| doc.data);
        for (pending_key, pending) in &self.writes {
            if *pending_key != key {
                continue;
            }
            view = match pending {
                PendingWrite::Delete => None,
                PendingWrite::Write(data, WriteMode::Merge) => match view {
                    Some(existing) => Some(merge_fields(&existing, data.clone())),
                    None => Some(data.clone()),
                },
                PendingWrite::Write(data, WriteMode::Replace) => Some(data.clone()),
            };
        }
        Ok(view)
    }

    fn write(&mut self, collection: Collection, id: Uuid, data: Value, mode: WriteMode) {
        self.writes
            .push(((collection, id), PendingWrite::Write(data, mode)));
    }

    fn delete(&mut self, collection: Collection, id: Uuid) {
        self.writes.push(((collection, id), PendingWrite::Delete));
    }
}

fn merge_fields(existing: &Value, incoming: Value) -> Value {
    match (existing, incoming) {
        (Value::Object(base), Value::Object(update)) => {
            let mut merged = base.clone();
            for (field, value) in update {
                merged.insert(field, value);
            }
            Value::Object(merged)
        }
        (_, incoming) => incoming,
    }
}
