use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::json;
use tracing::info;

use super::Repository;
use crate::error::{RepoError, RepoResult};
use crate::model::attendance::hours_between;
use crate::model::{AttendanceRecord, AttendanceStatus, Employee, Entity, date_value, day_start};
use crate::store::{Direction, DocumentStore, Fields, Query};
use crate::subscription::{LiveQuery, SubscriptionManager};

#[derive(Clone)]
pub struct AttendanceRepository {
    records: Repository<AttendanceRecord>,
    late_after: NaiveTime,
}

impl AttendanceRepository {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        live: SubscriptionManager,
        late_after: NaiveTime,
    ) -> Self {
        Self {
            records: Repository::new(store, live),
            late_after,
        }
    }

    pub fn records(&self) -> &Repository<AttendanceRecord> {
        &self.records
    }

    pub fn is_late(&self, at: DateTime<Utc>) -> bool {
        at.time() > self.late_after
    }

    /// Opens the day's record. Fails with `InvalidState` while a record
    /// for the same day is still checked in.
    pub async fn check_in(
        &self,
        employee: &Employee,
        location: &str,
        at: DateTime<Utc>,
    ) -> RepoResult<AttendanceRecord> {
        let day = at.date_naive();
        if self.open_record(&employee.id, day).await?.is_some() {
            return Err(RepoError::InvalidState(format!(
                "employee {} is already checked in on {day}",
                employee.id
            )));
        }

        let mut record = AttendanceRecord {
            id: String::new(),
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            date: day_start(day),
            check_in_time: at,
            check_out_time: None,
            check_in_location: location.to_string(),
            check_out_location: None,
            total_working_hours: None,
            is_late: self.is_late(at),
            status: AttendanceStatus::CheckedIn,
        };
        let id = self.records.create(&record).await?;
        record.set_id(id);
        info!(
            id = %record.id,
            employee = %record.employee_id,
            late = record.is_late,
            "Checked in"
        );
        Ok(record)
    }

    /// Closes the open record for the day of `at`. The write only lands if
    /// the record is still checked in.
    pub async fn check_out(
        &self,
        employee_id: &str,
        location: &str,
        at: DateTime<Utc>,
    ) -> RepoResult<AttendanceRecord> {
        let day = at.date_naive();
        let mut record = self.open_record(employee_id, day).await?.ok_or_else(|| {
            RepoError::not_found(
                AttendanceRecord::NAME,
                format!("open record for {employee_id} on {day}"),
            )
        })?;
        if at < record.check_in_time {
            return Err(RepoError::InvalidState(format!(
                "check-out at {at} precedes check-in at {}",
                record.check_in_time
            )));
        }

        let hours = hours_between(record.check_in_time, at);
        let mut fields = Fields::new();
        fields.insert("checkOutTime".into(), json!(at.timestamp_millis()));
        fields.insert("checkOutLocation".into(), json!(location));
        fields.insert("totalWorkingHours".into(), json!(hours));
        fields.insert(
            "status".into(),
            json!(AttendanceStatus::CheckedOut.to_string()),
        );
        self.records
            .update_if(
                &record.id,
                "status",
                AttendanceStatus::CheckedIn.to_string(),
                fields,
            )
            .await?;

        record.check_out_time = Some(at);
        record.check_out_location = Some(location.to_string());
        record.total_working_hours = Some(hours);
        record.status = AttendanceStatus::CheckedOut;
        info!(id = %record.id, employee = employee_id, hours, "Checked out");
        Ok(record)
    }

    pub async fn for_date(&self, date: NaiveDate) -> RepoResult<Vec<AttendanceRecord>> {
        self.records.query(&self.date_query(date)).await
    }

    pub fn subscribe_for_date(&self, date: NaiveDate) -> RepoResult<LiveQuery<AttendanceRecord>> {
        self.records.subscribe(self.date_query(date))
    }

    /// Records with `from <= date <= to`, newest first.
    pub async fn for_employee_between(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        let query = self
            .records
            .query_all()
            .eq("employeeId", employee_id)
            .gte("date", date_value(from))
            .lte("date", date_value(to))
            .order_by("date", Direction::Descending);
        self.records.query(&query).await
    }

    pub fn subscribe_for_employee(
        &self,
        employee_id: &str,
        limit: usize,
    ) -> RepoResult<LiveQuery<AttendanceRecord>> {
        self.records.subscribe(
            self.records
                .query_all()
                .eq("employeeId", employee_id)
                .order_by("date", Direction::Descending)
                .limit(limit),
        )
    }

    /// Latest record of `employee_id` on `today`, open or closed.
    pub async fn today_for(
        &self,
        employee_id: &str,
        today: NaiveDate,
    ) -> RepoResult<Option<AttendanceRecord>> {
        self.records
            .first(
                self.records
                    .query_all()
                    .eq("employeeId", employee_id)
                    .eq("date", date_value(today))
                    .order_by("checkInTime", Direction::Descending),
            )
            .await
    }

    async fn open_record(
        &self,
        employee_id: &str,
        day: NaiveDate,
    ) -> RepoResult<Option<AttendanceRecord>> {
        self.records
            .first(
                self.records
                    .query_all()
                    .eq("employeeId", employee_id)
                    .eq("date", date_value(day))
                    .eq("status", AttendanceStatus::CheckedIn.to_string()),
            )
            .await
    }

    fn date_query(&self, date: NaiveDate) -> Query {
        self.records
            .query_all()
            .eq("date", date_value(date))
            .order_by("checkInTime", Direction::Ascending)
    }
}
