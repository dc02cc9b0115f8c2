//! In-process document store.
//!
//! Implements the full adapter contract (queries, live listeners, atomic
//! batches with preconditions, the batch ceiling) so the repository layer
//! can be exercised and run locally without the remote service. It also
//! exposes a few knobs for injecting failures.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{
    DocumentStore, Document, Fields, MAX_BATCH_OPERATIONS, Query, SnapshotStream, WriteBatch,
    WriteOp,
};
use crate::error::{StoreError, StoreResult};

type Collections = HashMap<String, BTreeMap<String, Fields>>;

struct ListenerSlot {
    query: Query,
    tx: mpsc::UnboundedSender<StoreResult<Vec<Document>>>,
    last: Vec<Document>,
}

#[derive(Default)]
struct State {
    collections: Collections,
    listeners: Vec<ListenerSlot>,
    commits: usize,
    commit_budget: Option<usize>,
    interference: Vec<(String, String, Fields)>,
}

pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    batch_limit: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_batch_limit(MAX_BATCH_OPERATIONS)
    }

    pub fn with_batch_limit(batch_limit: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            batch_limit: batch_limit.max(1),
        }
    }

    /// Live store-side listeners (detached ones are pruned first).
    pub fn active_listeners(&self) -> usize {
        let mut state = self.state.lock();
        state.listeners.retain(|slot| !slot.tx.is_closed());
        state.listeners.len()
    }

    /// Number of successful batch commits.
    pub fn commit_count(&self) -> usize {
        self.state.lock().commits
    }

    pub fn document_count(&self, collection: &str) -> usize {
        self.state
            .lock()
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub fn peek(&self, collection: &str, id: &str) -> Option<Fields> {
        self.state
            .lock()
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Lets `n` more commits succeed, then fails every commit after that.
    pub fn fail_commits_after(&self, n: usize) {
        self.state.lock().commit_budget = Some(n);
    }

    pub fn clear_faults(&self) {
        let mut state = self.state.lock();
        state.commit_budget = None;
        state.interference.clear();
    }

    /// Terminates every listener on `collection` with an error.
    pub fn fail_listeners(&self, collection: &str) {
        let mut state = self.state.lock();
        state.listeners.retain(|slot| {
            if slot.query.collection != collection {
                return true;
            }
            let _ = slot.tx.send(Err(StoreError::Unavailable(format!(
                "listener on {collection} terminated"
            ))));
            false
        });
    }

    /// Merges `patch` into a document right before the next commit is
    /// validated, as if another writer got there first.
    pub fn before_next_commit(&self, collection: &str, id: &str, patch: Fields) {
        self.state
            .lock()
            .interference
            .push((collection.to_string(), id.to_string(), patch));
    }

    fn documents(collections: &Collections, collection: &str) -> Vec<Document> {
        collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn notify(state: &mut State, touched: &HashSet<String>) {
        let State {
            collections,
            listeners,
            ..
        } = state;
        listeners.retain_mut(|slot| {
            if slot.tx.is_closed() {
                return false;
            }
            if !touched.contains(&slot.query.collection) {
                return true;
            }
            let snapshot = slot
                .query
                .apply(&Self::documents(collections, &slot.query.collection));
            if snapshot == slot.last {
                return true;
            }
            slot.last = snapshot.clone();
            slot.tx.send(Ok(snapshot)).is_ok()
        });
    }

    fn apply_op(staging: &mut Collections, op: WriteOp) -> StoreResult<()> {
        match op {
            WriteOp::Set {
                collection,
                id,
                fields,
            } => {
                staging.entry(collection).or_default().insert(id, fields);
            }
            WriteOp::Update {
                collection,
                id,
                fields,
                preconditions,
            } => {
                let Some(doc) = staging
                    .get_mut(&collection)
                    .and_then(|docs| docs.get_mut(&id))
                else {
                    return Err(StoreError::NotFound { collection, id });
                };
                for pre in &preconditions {
                    if doc.get(&pre.field) != Some(&pre.expected) {
                        return Err(StoreError::PreconditionFailed {
                            collection,
                            id,
                            field: pre.field.clone(),
                        });
                    }
                }
                doc.extend(fields);
            }
            WriteOp::Delete { collection, id } => {
                if let Some(docs) = staging.get_mut(&collection) {
                    docs.remove(&id);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Ok(self.peek(collection, id).map(|fields| Document {
            id: id.to_string(),
            fields,
        }))
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        let state = self.state.lock();
        Ok(query.apply(&Self::documents(&state.collections, &query.collection)))
    }

    async fn listen(&self, query: &Query) -> StoreResult<SnapshotStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock();
        let initial = query.apply(&Self::documents(&state.collections, &query.collection));
        let _ = tx.send(Ok(initial.clone()));
        state.listeners.push(ListenerSlot {
            query: query.clone(),
            tx,
            last: initial,
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(stream.boxed())
    }

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let id = self.new_id(collection);
        let mut state = self.state.lock();
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Self::notify(&mut state, &HashSet::from([collection.to_string()]));
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut state = self.state.lock();
        let Some(doc) = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
        else {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        };
        doc.extend(fields);
        Self::notify(&mut state, &HashSet::from([collection.to_string()]));
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut state = self.state.lock();
        if let Some(docs) = state.collections.get_mut(collection) {
            docs.remove(id);
        }
        Self::notify(&mut state, &HashSet::from([collection.to_string()]));
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.len() > self.batch_limit {
            return Err(StoreError::BatchTooLarge {
                ops: batch.len(),
                limit: self.batch_limit,
            });
        }

        let mut state = self.state.lock();
        let mut touched: HashSet<String> = HashSet::new();

        for (collection, id, patch) in std::mem::take(&mut state.interference) {
            if let Some(doc) = state
                .collections
                .get_mut(&collection)
                .and_then(|docs| docs.get_mut(&id))
            {
                doc.extend(patch);
                touched.insert(collection);
            }
        }

        if state.commit_budget == Some(0) {
            Self::notify(&mut state, &touched);
            return Err(StoreError::Unavailable("commit rejected".into()));
        }

        let batch_collections: HashSet<String> =
            batch.ops().iter().map(|op| op.collection().to_string()).collect();
        let mut staging: Collections = batch_collections
            .iter()
            .map(|name| {
                let docs = state.collections.get(name).cloned().unwrap_or_default();
                (name.clone(), docs)
            })
            .collect();

        for op in batch.into_ops() {
            if let Err(err) = Self::apply_op(&mut staging, op) {
                Self::notify(&mut state, &touched);
                return Err(err);
            }
        }

        state.collections.extend(staging);
        state.commits += 1;
        if let Some(budget) = state.commit_budget.as_mut() {
            *budget -= 1;
        }
        touched.extend(batch_collections);
        Self::notify(&mut state, &touched);
        Ok(())
    }

    fn new_id(&self, _collection: &str) -> String {
        Uuid::new_v4().to_string()
    }

    fn batch_limit(&self) -> usize {
        self.batch_limit
    }
}
