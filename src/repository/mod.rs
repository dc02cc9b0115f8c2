//! Repository layer: the only code that talks to the document store.
//!
//! `Repository<T>` carries the generic create/update/delete/get/query/
//! subscribe contract for one entity; the per-entity repositories add named
//! operations on top. Multi-document writes are staged into a `WriteSet`
//! and committed through `BatchWriter`, which refuses anything over the
//! store's batch ceiling.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::error::{RepoError, RepoResult, StoreError};
use crate::model::{Entity, decode, encode};
use crate::store::{DocumentStore, Fields, Precondition, Query, WriteBatch, WriteOp};
use crate::subscription::{LiveQuery, SubscriptionManager};

pub mod attendance;
pub mod chat;
pub mod document;
pub mod employee;
pub mod leave_request;
pub mod notification;
pub mod payroll;
pub mod performance;
pub mod shift;

pub use attendance::AttendanceRepository;
pub use chat::ChatRepository;
pub use document::{DocumentRepository, Upload};
pub use employee::EmployeeRepository;
pub use leave_request::LeaveRepository;
pub use notification::NotificationRepository;
pub use payroll::{PayrollInput, PayrollRepository};
pub use performance::PerformanceRepository;
pub use shift::ShiftRepository;

pub(crate) fn store_failure(entity: &str, op: &str, err: StoreError) -> RepoError {
    error!(entity, op, error = %err, "Store call failed");
    RepoError::from(err)
}

pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    live: SubscriptionManager,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            live: self.live.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>, live: SubscriptionManager) -> Self {
        Self {
            store,
            live,
            _entity: PhantomData,
        }
    }

    /// Empty query on this entity's collection.
    pub fn query_all(&self) -> Query {
        Query::collection(T::COLLECTION)
    }

    pub async fn create(&self, record: &T) -> RepoResult<String> {
        record.validate()?;
        let fields = encode(record)?;
        let id = self
            .store
            .add(T::COLLECTION, fields)
            .await
            .map_err(|e| store_failure(T::NAME, "create", e))?;
        debug!(entity = T::NAME, id = %id, "Created");
        Ok(id)
    }

    /// Partial update. The merged document must still decode and validate
    /// as `T`, so a patch can never leave a malformed record behind.
    pub async fn update(&self, id: &str, patch: Fields) -> RepoResult<()> {
        if patch.is_empty() {
            return Err(RepoError::Validation("no fields provided for update".into()));
        }
        let current = self
            .store
            .get(T::COLLECTION, id)
            .await
            .map_err(|e| store_failure(T::NAME, "update", e))?
            .ok_or_else(|| RepoError::not_found(T::NAME, id))?;

        let mut merged = current;
        merged.fields.extend(patch.clone());
        let record: T = decode(merged).map_err(|e| match e {
            RepoError::Malformed { reason, .. } => RepoError::Validation(reason),
            other => other,
        })?;
        record.validate()?;

        self.store
            .update(T::COLLECTION, id, patch)
            .await
            .map_err(|e| store_failure(T::NAME, "update", e))?;
        debug!(entity = T::NAME, id, "Updated");
        Ok(())
    }

    /// Commits `fields` only if `guard_field` still equals `expected`;
    /// otherwise `StaleState`.
    pub async fn update_if(
        &self,
        id: &str,
        guard_field: &str,
        expected: impl Into<Value>,
        fields: Fields,
    ) -> RepoResult<()> {
        let mut set = WriteSet::new();
        self.stage_update(
            &mut set,
            id,
            fields,
            vec![Precondition::field_equals(guard_field, expected)],
        );
        BatchWriter::new(Arc::clone(&self.store)).commit(set).await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        if self.get_by_id(id).await?.is_none() {
            return Err(RepoError::not_found(T::NAME, id));
        }
        self.store
            .delete(T::COLLECTION, id)
            .await
            .map_err(|e| store_failure(T::NAME, "delete", e))?;
        debug!(entity = T::NAME, id, "Deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> RepoResult<Option<T>> {
        self.store
            .get(T::COLLECTION, id)
            .await
            .map_err(|e| store_failure(T::NAME, "get", e))?
            .map(decode)
            .transpose()
    }

    /// Like `get_by_id`, but absence is `NotFound`.
    pub async fn require(&self, id: &str) -> RepoResult<T> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| RepoError::not_found(T::NAME, id))
    }

    pub async fn query(&self, query: &Query) -> RepoResult<Vec<T>> {
        self.check_collection(query)?;
        self.store
            .query(query)
            .await
            .map_err(|e| store_failure(T::NAME, "query", e))?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn first(&self, query: Query) -> RepoResult<Option<T>> {
        Ok(self.query(&query.limit(1)).await?.into_iter().next())
    }

    /// Live result set for `query`; shares the store listener with every
    /// other subscriber of the same query.
    pub fn subscribe(&self, query: Query) -> RepoResult<LiveQuery<T>> {
        self.check_collection(&query)?;
        Ok(LiveQuery::new(self.live.subscribe(query)?))
    }

    /// Stages a new document and returns the id it will have.
    pub fn stage_create(&self, set: &mut WriteSet, record: &T) -> RepoResult<String> {
        record.validate()?;
        let fields = encode(record)?;
        let id = self.store.new_id(T::COLLECTION);
        set.push(WriteOp::Set {
            collection: T::COLLECTION.to_string(),
            id: id.clone(),
            fields,
        });
        Ok(id)
    }

    pub fn stage_update(
        &self,
        set: &mut WriteSet,
        id: &str,
        fields: Fields,
        preconditions: Vec<Precondition>,
    ) {
        set.push(WriteOp::Update {
            collection: T::COLLECTION.to_string(),
            id: id.to_string(),
            fields,
            preconditions,
        });
    }

    pub fn stage_delete(&self, set: &mut WriteSet, id: &str) {
        set.push(WriteOp::Delete {
            collection: T::COLLECTION.to_string(),
            id: id.to_string(),
        });
    }

    pub fn writer(&self) -> BatchWriter {
        BatchWriter::new(Arc::clone(&self.store))
    }

    fn check_collection(&self, query: &Query) -> RepoResult<()> {
        if query.collection == T::COLLECTION {
            Ok(())
        } else {
            Err(RepoError::Validation(format!(
                "{} repository cannot query collection {}",
                T::NAME,
                query.collection
            )))
        }
    }
}

/// Writes staged by one or more repositories, committed together.
#[derive(Debug, Default)]
pub struct WriteSet {
    ops: Vec<WriteOp>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn append(&mut self, other: WriteSet) {
        self.ops.extend(other.ops);
    }

    /// Splits into consecutive sets of at most `size` operations,
    /// preserving order.
    pub fn into_chunks(self, size: usize) -> Vec<WriteSet> {
        let size = size.max(1);
        let mut chunks = Vec::with_capacity(self.ops.len().div_ceil(size));
        let mut ops = self.ops.into_iter().peekable();
        while ops.peek().is_some() {
            chunks.push(WriteSet {
                ops: ops.by_ref().take(size).collect(),
            });
        }
        chunks
    }

    fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }
}

/// Commits write sets as single atomic store batches.
#[derive(Clone)]
pub struct BatchWriter {
    store: Arc<dyn DocumentStore>,
}

impl BatchWriter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Effective ceiling: the lower of the configured and the store limit.
    pub fn ceiling(&self, configured: usize) -> usize {
        configured.min(self.store.batch_limit()).max(1)
    }

    /// Commits `set` atomically and returns the number of operations
    /// written. An oversized set is a caller bug and is refused before it
    /// reaches the store.
    pub async fn commit(&self, set: WriteSet) -> RepoResult<usize> {
        let ops = set.len();
        if ops == 0 {
            return Ok(0);
        }
        let limit = self.store.batch_limit();
        if ops > limit {
            error!(ops, limit, "Refusing oversized batch");
            return Err(RepoError::BatchLimitExceeded { ops, limit });
        }
        self.store
            .commit(WriteBatch::from(set.ops))
            .await
            .map_err(|e| store_failure("batch", "commit", e))?;
        debug!(ops, "Batch committed");
        Ok(ops)
    }
}
