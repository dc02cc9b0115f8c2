use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::{Repository, store_failure};
use crate::error::{RepoError, RepoResult, StoreError};
use crate::model::{
    DocumentType, EmployeeDocument, Entity, ExpiryStatus, instant_value, warning_end,
};
use crate::store::{BlobStore, Direction, DocumentStore, Query};
use crate::subscription::{LiveQuery, SubscriptionManager};

/// A file to attach to an employee.
#[derive(Debug, Clone)]
pub struct Upload {
    pub employee_id: String,
    pub document_type: DocumentType,
    pub document_name: String,
    pub bytes: Vec<u8>,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Employee documents: metadata in the document store, bytes in the blob
/// store.
#[derive(Clone)]
pub struct DocumentRepository {
    records: Repository<EmployeeDocument>,
    blobs: Arc<dyn BlobStore>,
    warning_days: i64,
}

impl DocumentRepository {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        live: SubscriptionManager,
        blobs: Arc<dyn BlobStore>,
        warning_days: i64,
    ) -> Self {
        Self {
            records: Repository::new(store, live),
            blobs,
            warning_days,
        }
    }

    pub fn records(&self) -> &Repository<EmployeeDocument> {
        &self.records
    }

    /// Stores the bytes, then the record. If the record cannot be written
    /// the blob is removed again.
    pub async fn upload(&self, upload: Upload) -> RepoResult<EmployeeDocument> {
        let mut document = EmployeeDocument {
            id: String::new(),
            employee_id: upload.employee_id,
            document_type: upload.document_type,
            document_name: upload.document_name,
            document_uri: String::new(),
            uploaded_at: Utc::now(),
            expiry_date: upload.expiry_date,
        };
        document.validate()?;

        let path = format!(
            "documents/{}/{}_{}",
            document.employee_id,
            Uuid::new_v4(),
            document.document_name
        );
        document.document_uri = self
            .blobs
            .put_file(&path, upload.bytes)
            .await
            .map_err(|e| store_failure(EmployeeDocument::NAME, "put_file", e))?;

        match self.records.create(&document).await {
            Ok(id) => {
                document.set_id(id);
                info!(
                    id = %document.id,
                    employee = %document.employee_id,
                    kind = %document.document_type,
                    "Document uploaded"
                );
                Ok(document)
            }
            Err(err) => {
                if let Err(cleanup) = self.blobs.delete_by_url(&document.document_uri).await {
                    warn!(
                        uri = %document.document_uri,
                        error = %cleanup,
                        "Orphaned blob left behind"
                    );
                }
                Err(err)
            }
        }
    }

    pub async fn for_employee(&self, employee_id: &str) -> RepoResult<Vec<EmployeeDocument>> {
        self.records.query(&self.employee_query(employee_id)).await
    }

    pub fn subscribe_for_employee(
        &self,
        employee_id: &str,
    ) -> RepoResult<LiveQuery<EmployeeDocument>> {
        self.records.subscribe(self.employee_query(employee_id))
    }

    pub async fn download_url(&self, id: &str) -> RepoResult<String> {
        let document = self.records.require(id).await?;
        self.blobs
            .download_url(&document.document_uri)
            .await
            .map_err(|e| store_failure(EmployeeDocument::NAME, "download_url", e))
    }

    /// Deletes the blob, then the record. A blob that is already gone does
    /// not block removal of the record.
    pub async fn remove(&self, id: &str) -> RepoResult<()> {
        let document = self.records.require(id).await?;
        match self.blobs.delete_by_url(&document.document_uri).await {
            Ok(()) | Err(StoreError::NotFound { .. }) => {}
            Err(err) => return Err(store_failure(EmployeeDocument::NAME, "delete_by_url", err)),
        }
        self.records.delete(id).await?;
        info!(id, "Document removed");
        Ok(())
    }

    /// Documents that have not expired yet but will within `days`, soonest
    /// first. A negative or unrepresentable window is a `Validation` error.
    pub async fn expiring_within(
        &self,
        days: i64,
        now: DateTime<Utc>,
    ) -> RepoResult<Vec<EmployeeDocument>> {
        let end = warning_end(now, days)
            .filter(|_| days >= 0)
            .ok_or_else(|| {
                RepoError::Validation(format!("expiry window of {days} days is out of range"))
            })?;
        let query = self
            .records
            .query_all()
            .gte("expiryDate", instant_value(now))
            .lte("expiryDate", instant_value(end))
            .order_by("expiryDate", Direction::Ascending);
        self.records.query(&query).await
    }

    /// Expiry status with the configured warning window.
    pub fn status_of(&self, document: &EmployeeDocument, now: DateTime<Utc>) -> ExpiryStatus {
        document.expiry_status(now, self.warning_days)
    }

    fn employee_query(&self, employee_id: &str) -> Query {
        self.records
            .query_all()
            .eq("employeeId", employee_id)
            .order_by("uploadedAt", Direction::Descending)
    }
}
