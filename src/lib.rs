//! Record synchronization and aggregation for a workforce management
//! system: typed repositories over a document store, shared live queries,
//! atomic multi-document mutations and derived dashboard figures.

pub mod aggregate;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod reports;
pub mod repository;
pub mod store;
pub mod subscription;
pub mod utils;

pub use config::{Config, Policy};
pub use context::AppContext;
pub use coordinator::{BulkReport, MutationCoordinator};
pub use error::{BulkError, RepoError, RepoResult, StoreError, StoreResult};
pub use reports::Reports;
pub use store::{BlobStore, DocumentStore, MemoryBlobStore, MemoryStore};
pub use subscription::{LiveQuery, Snapshot, Subscription, SubscriptionManager};
