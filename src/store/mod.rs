//! Adapter seam to the remote document store and blob store.
//!
//! Repositories are the only callers of these traits. Everything above the
//! repository layer sees `RepoError` and typed entities, never raw
//! documents.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::error::StoreResult;

pub mod blob;
pub mod memory;
pub mod query;

pub use blob::{BlobStore, MemoryBlobStore};
pub use memory::MemoryStore;
pub use query::{Direction, Filter, FilterOp, OrderBy, Query, QueryKey};

/// Upper bound on operations in one atomic commit.
pub const MAX_BATCH_OPERATIONS: usize = 500;

pub type Fields = serde_json::Map<String, Value>;

/// Full result set of a listener, emitted on every change.
pub type SnapshotStream = BoxStream<'static, StoreResult<Vec<Document>>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// "Field currently equals value", checked atomically at commit.
#[derive(Debug, Clone, PartialEq)]
pub struct Precondition {
    pub field: String,
    pub expected: Value,
}

impl Precondition {
    pub fn field_equals(field: &str, expected: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            expected: expected.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set {
        collection: String,
        id: String,
        fields: Fields,
    },
    Update {
        collection: String,
        id: String,
        fields: Fields,
        preconditions: Vec<Precondition>,
    },
    Delete {
        collection: String,
        id: String,
    },
}

impl WriteOp {
    pub fn collection(&self) -> &str {
        match self {
            WriteOp::Set { collection, .. }
            | WriteOp::Update { collection, .. }
            | WriteOp::Delete { collection, .. } => collection,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

impl From<Vec<WriteOp>> for WriteBatch {
    fn from(ops: Vec<WriteOp>) -> Self {
        Self { ops }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    async fn query(&self, query: &Query) -> StoreResult<Vec<Document>>;

    /// Opens a live listener. Dropping the stream detaches it.
    async fn listen(&self, query: &Query) -> StoreResult<SnapshotStream>;

    async fn add(&self, collection: &str, fields: Fields) -> StoreResult<String>;

    /// Partial update by field name. Fails with `NotFound` if absent.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Applies every op or none of them.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Id for a document that will be created through a batch `Set`.
    fn new_id(&self, collection: &str) -> String;

    fn batch_limit(&self) -> usize {
        MAX_BATCH_OPERATIONS
    }
}
