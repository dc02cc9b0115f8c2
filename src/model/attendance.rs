use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{RepoError, RepoResult};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum AttendanceStatus {
    #[serde(rename = "Checked In")]
    #[strum(serialize = "Checked In")]
    CheckedIn,
    #[serde(rename = "Checked Out")]
    #[strum(serialize = "Checked Out")]
    CheckedOut,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(skip)]
    pub id: String,
    pub employee_id: String,
    #[serde(default)]
    pub employee_name: String,
    /// Midnight of the working day.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub check_in_time: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub check_out_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub check_in_location: String,
    #[serde(default)]
    pub check_out_location: Option<String>,
    #[serde(default)]
    pub total_working_hours: Option<f64>,
    pub is_late: bool,
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }

    /// Hours between check-in and check-out, if checked out.
    pub fn worked_hours(&self) -> Option<f64> {
        self.total_working_hours.or_else(|| {
            self.check_out_time
                .map(|out| hours_between(self.check_in_time, out))
        })
    }

    fn check(&self) -> RepoResult<()> {
        if let Some(out) = self.check_out_time {
            if out < self.check_in_time {
                return Err(RepoError::Validation(
                    "checkOutTime precedes checkInTime".into(),
                ));
            }
        }
        if self.total_working_hours.is_some_and(|h| h < 0.0) {
            return Err(RepoError::Validation(
                "totalWorkingHours cannot be negative".into(),
            ));
        }
        Ok(())
    }
}

pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let minutes = (to - from).num_minutes().max(0);
    (minutes as f64 / 60.0 * 100.0).round() / 100.0
}

impl_entity!(AttendanceRecord, "attendance", "AttendanceRecord");
