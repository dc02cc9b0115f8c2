use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::{RepoError, RepoResult};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum LeaveType {
    #[serde(rename = "Sick Leave")]
    #[strum(serialize = "Sick Leave")]
    Sick,
    #[serde(rename = "Casual Leave")]
    #[strum(serialize = "Casual Leave")]
    Casual,
    #[serde(rename = "Earned Leave")]
    #[strum(serialize = "Earned Leave")]
    Earned,
    #[serde(rename = "Unpaid Leave")]
    #[strum(serialize = "Unpaid Leave")]
    Unpaid,
}

impl LeaveType {
    /// Days per calendar year; `None` means unbounded.
    pub fn allocation(&self) -> Option<u32> {
        match self {
            LeaveType::Sick => Some(10),
            LeaveType::Casual => Some(10),
            LeaveType::Earned => Some(15),
            LeaveType::Unpaid => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Only a pending request may move, and only to a terminal state.
    pub fn can_become(self, next: LeaveStatus) -> bool {
        self == LeaveStatus::Pending && next != LeaveStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    #[serde(skip)]
    pub id: String,
    pub employee_id: String,
    #[serde(default)]
    pub employee_name: String,
    pub leave_type: LeaveType,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub reason: String,
    pub status: LeaveStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub applied_date: DateTime<Utc>,
    #[serde(default)]
    pub reviewer_id: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub reviewed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewer_comments: Option<String>,
}

impl LeaveRequest {
    pub fn start_day(&self) -> NaiveDate {
        self.start_date.date_naive()
    }

    pub fn end_day(&self) -> NaiveDate {
        self.end_date.date_naive()
    }

    /// Inclusive day count.
    pub fn days(&self) -> i64 {
        (self.end_day() - self.start_day()).num_days() + 1
    }

    fn check(&self) -> RepoResult<()> {
        if self.end_day() < self.start_day() {
            return Err(RepoError::Validation(format!(
                "endDate {} is before startDate {}",
                self.end_day(),
                self.start_day()
            )));
        }
        if self.employee_id.trim().is_empty() {
            return Err(RepoError::Validation("employeeId is required".into()));
        }
        Ok(())
    }
}

impl_entity!(LeaveRequest, "leaveRequests", "LeaveRequest");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn stored_strings_parse_back() {
        assert_eq!(LeaveType::from_str("Casual Leave").unwrap(), LeaveType::Casual);
        assert_eq!(LeaveType::Earned.to_string(), "Earned Leave");
        assert_eq!(
            serde_json::to_value(LeaveType::Sick).unwrap(),
            serde_json::json!("Sick Leave")
        );
    }

    #[test]
    fn only_pending_transitions() {
        assert!(LeaveStatus::Pending.can_become(LeaveStatus::Approved));
        assert!(LeaveStatus::Pending.can_become(LeaveStatus::Cancelled));
        assert!(!LeaveStatus::Pending.can_become(LeaveStatus::Pending));
        assert!(!LeaveStatus::Approved.can_become(LeaveStatus::Rejected));
        assert!(!LeaveStatus::Rejected.can_become(LeaveStatus::Approved));
    }
}
