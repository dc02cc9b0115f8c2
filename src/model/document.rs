use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{RepoError, RepoResult};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum DocumentType {
    #[serde(rename = "ID Proof")]
    #[strum(serialize = "ID Proof")]
    IdProof,
    #[serde(rename = "Address Proof")]
    #[strum(serialize = "Address Proof")]
    AddressProof,
    Educational,
    Experience,
    Contract,
    Other,
}

/// Derived from `expiry_date`, never stored.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Display)]
pub enum ExpiryStatus {
    Valid,
    Expiring,
    Expired,
    NoExpiry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDocument {
    #[serde(skip)]
    pub id: String,
    pub employee_id: String,
    pub document_type: DocumentType,
    pub document_name: String,
    pub document_uri: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub expiry_date: Option<DateTime<Utc>>,
}

impl EmployeeDocument {
    pub fn expiry_status(&self, now: DateTime<Utc>, warning_days: i64) -> ExpiryStatus {
        match self.expiry_date {
            None => ExpiryStatus::NoExpiry,
            Some(expiry) if expiry < now => ExpiryStatus::Expired,
            Some(expiry) => match warning_end(now, warning_days) {
                Some(end) if expiry > end => ExpiryStatus::Valid,
                _ => ExpiryStatus::Expiring,
            },
        }
    }

    fn check(&self) -> RepoResult<()> {
        if self.document_name.trim().is_empty() {
            return Err(RepoError::Validation("documentName is required".into()));
        }
        Ok(())
    }
}

impl_entity!(EmployeeDocument, "documents", "EmployeeDocument");

/// End of a warning window of `days` from `now`, or `None` when that
/// instant is out of range.
pub fn warning_end(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(days).and_then(|window| now.checked_add_signed(window))
}
