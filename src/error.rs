use chrono::NaiveDate;
use thiserror::Error;

/// Failures reported by a document or blob store adapter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("document {collection}/{id} does not exist")]
    NotFound { collection: String, id: String },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("precondition failed on {collection}/{id}: {field}")]
    PreconditionFailed {
        collection: String,
        id: String,
        field: String,
    },

    #[error("batch of {ops} operations exceeds the limit of {limit}")]
    BatchTooLarge { ops: usize, limit: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by repositories, the mutation coordinator and reports.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepoError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("document store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("stale state: {0}")]
    StaleState(String),

    #[error("batch of {ops} operations exceeds the store limit of {limit}")]
    BatchLimitExceeded { ops: usize, limit: usize },

    #[error("no shift assignment for employee {employee_id} on {date}")]
    AssignmentNotFound { employee_id: String, date: NaiveDate },

    #[error("{entity} already exists with {field} = {value}")]
    AlreadyExists {
        entity: String,
        field: String,
        value: String,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("malformed {entity} document {id}: {reason}")]
    Malformed {
        entity: String,
        id: String,
        reason: String,
    },
}

pub type RepoResult<T> = Result<T, RepoError>;

impl RepoError {
    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        RepoError::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        }
    }

    pub fn already_exists(entity: &str, field: &str, value: impl Into<String>) -> Self {
        RepoError::AlreadyExists {
            entity: entity.to_string(),
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RepoError::NotFound { .. } | RepoError::AssignmentNotFound { .. }
        )
    }
}

impl From<StoreError> for RepoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => RepoError::NotFound {
                entity: collection,
                id,
            },
            StoreError::PermissionDenied(reason) => RepoError::PermissionDenied(reason),
            StoreError::Unavailable(reason) => RepoError::StoreUnavailable(reason),
            StoreError::PreconditionFailed {
                collection,
                id,
                field,
            } => RepoError::StaleState(format!("{collection}/{id} changed ({field})")),
            StoreError::BatchTooLarge { ops, limit } => RepoError::BatchLimitExceeded { ops, limit },
            StoreError::InvalidArgument(reason) => RepoError::Validation(reason),
        }
    }
}

/// A multi-batch write that stopped partway.
///
/// `committed` counts the write operations that are durable; everything
/// after them was not attempted.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("bulk write stopped after {committed} of {requested} operations ({batches} batches): {source}")]
pub struct BulkError {
    pub committed: usize,
    pub requested: usize,
    pub batches: usize,
    #[source]
    pub source: RepoError,
}
