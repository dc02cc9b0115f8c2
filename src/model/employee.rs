use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;
use crate::error::{RepoError, RepoResult};

/// Soft-deleted via `is_active = false`; never hard-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Human-readable business code, e.g. `EMP-001`.
    pub employee_id: String,
    /// Auth identity this employee signs in as.
    pub user_id: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub designation: String,
    pub role: Role,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub joining_date: DateTime<Utc>,
    pub added_by: String,
    pub is_active: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Employee {
    fn check(&self) -> RepoResult<()> {
        if self.name.trim().is_empty() {
            return Err(RepoError::Validation("employee name is required".into()));
        }
        if self.employee_id.trim().is_empty() {
            return Err(RepoError::Validation("employee code is required".into()));
        }
        if self.user_id.trim().is_empty() {
            return Err(RepoError::Validation("userId is required".into()));
        }
        if !self.email.contains('@') {
            return Err(RepoError::Validation(format!(
                "invalid email address: {}",
                self.email
            )));
        }
        Ok(())
    }
}

impl_entity!(Employee, "employees", "Employee");
