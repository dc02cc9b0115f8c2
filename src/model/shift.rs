use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{RepoError, RepoResult};

/// A named working window, e.g. "Morning" 09:00–17:00.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

impl Shift {
    fn check(&self) -> RepoResult<()> {
        for (label, value) in [("startTime", &self.start_time), ("endTime", &self.end_time)] {
            NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
                RepoError::Validation(format!("{label} must be HH:MM, got {value:?}"))
            })?;
        }
        if self.name.trim().is_empty() {
            return Err(RepoError::Validation("shift name is required".into()));
        }
        Ok(())
    }
}

impl_entity!(Shift, "shifts", "Shift");

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum AssignmentStatus {
    Assigned,
    Completed,
    Cancelled,
}

/// One (employee, date) slot. Uniqueness per (employee, date) is kept by
/// the repository and the swap coordinator, not the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftAssignment {
    #[serde(skip)]
    pub id: String,
    pub employee_id: String,
    pub shift_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    pub status: AssignmentStatus,
    #[serde(default)]
    pub assigned_by_admin_id: String,
}

impl ShiftAssignment {
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }

    fn check(&self) -> RepoResult<()> {
        if self.employee_id.trim().is_empty() || self.shift_id.trim().is_empty() {
            return Err(RepoError::Validation(
                "assignment needs employeeId and shiftId".into(),
            ));
        }
        Ok(())
    }
}

impl_entity!(ShiftAssignment, "shiftAssignments", "ShiftAssignment");

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum SwapStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSwapRequest {
    #[serde(skip)]
    pub id: String,
    pub requester_id: String,
    pub target_employee_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub requester_shift_date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub target_shift_date: DateTime<Utc>,
    #[serde(default)]
    pub reason: String,
    pub status: SwapStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_by_id: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl ShiftSwapRequest {
    pub fn requester_day(&self) -> NaiveDate {
        self.requester_shift_date.date_naive()
    }

    pub fn target_day(&self) -> NaiveDate {
        self.target_shift_date.date_naive()
    }

    fn check(&self) -> RepoResult<()> {
        if self.requester_id == self.target_employee_id {
            return Err(RepoError::Validation(
                "cannot swap a shift with yourself".into(),
            ));
        }
        Ok(())
    }
}

impl_entity!(ShiftSwapRequest, "shiftSwapRequests", "ShiftSwapRequest");
