//! Entity models, field-for-field with the store schema.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{RepoError, RepoResult};
use crate::store::{Document, Fields};

/// A record stored as one document in `COLLECTION`.
///
/// The id lives outside the field set; implementors mark it
/// `#[serde(skip)]` and it is filled in by `decode`.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;
    const NAME: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn validate(&self) -> RepoResult<()> {
        Ok(())
    }
}

pub fn encode<T: Entity>(record: &T) -> RepoResult<Fields> {
    match serde_json::to_value(record) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(RepoError::Validation(format!(
            "{} did not serialize to a field map",
            T::NAME
        ))),
        Err(e) => Err(RepoError::Validation(format!(
            "{} could not be serialized: {e}",
            T::NAME
        ))),
    }
}

pub fn decode<T: Entity>(doc: Document) -> RepoResult<T> {
    let Document { id, fields } = doc;
    let mut record: T =
        serde_json::from_value(Value::Object(fields)).map_err(|e| RepoError::Malformed {
            entity: T::NAME.to_string(),
            id: id.clone(),
            reason: e.to_string(),
        })?;
    record.set_id(id);
    Ok(record)
}

/// Calendar dates are stored as their UTC-midnight instant.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Store value of a calendar date.
pub fn date_value(date: NaiveDate) -> i64 {
    day_start(date).timestamp_millis()
}

/// Store value of an instant.
pub fn instant_value(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

macro_rules! impl_entity {
    ($ty:ty, $collection:expr, $name:expr) => {
        impl $crate::model::Entity for $ty {
            const COLLECTION: &'static str = $collection;
            const NAME: &'static str = $name;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn validate(&self) -> $crate::error::RepoResult<()> {
                self.check()
            }
        }
    };
}

pub mod attendance;
pub mod chat;
pub mod document;
pub mod employee;
pub mod leave_request;
pub mod notification;
pub mod payroll;
pub mod performance;
pub mod role;
pub mod shift;

pub use attendance::{AttendanceRecord, AttendanceStatus};
pub use chat::{ChatGroup, GroupMember, GroupType, Message};
pub use document::{DocumentType, EmployeeDocument, ExpiryStatus, warning_end};
pub use employee::Employee;
pub use leave_request::{LeaveRequest, LeaveStatus, LeaveType};
pub use notification::{Notification, NotificationTemplate, NotificationType};
pub use payroll::{PayrollRecord, PayrollStatus};
pub use performance::PerformanceReview;
pub use role::Role;
pub use shift::{AssignmentStatus, Shift, ShiftAssignment, ShiftSwapRequest, SwapStatus};
