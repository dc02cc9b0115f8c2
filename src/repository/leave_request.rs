use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::{Value, json};
use tracing::info;

use super::Repository;
use crate::error::{RepoError, RepoResult};
use crate::model::{Entity, LeaveRequest, LeaveStatus, LeaveType, date_value};
use crate::store::{Direction, DocumentStore, Fields, Query};
use crate::subscription::{LiveQuery, SubscriptionManager};

#[derive(Clone)]
pub struct LeaveRepository {
    records: Repository<LeaveRequest>,
}

impl LeaveRepository {
    pub fn new(store: Arc<dyn DocumentStore>, live: SubscriptionManager) -> Self {
        Self {
            records: Repository::new(store, live),
        }
    }

    pub fn records(&self) -> &Repository<LeaveRequest> {
        &self.records
    }

    /// New requests always start `Pending` with no review attached.
    pub async fn submit(&self, mut request: LeaveRequest) -> RepoResult<LeaveRequest> {
        request.status = LeaveStatus::Pending;
        request.reviewer_id = None;
        request.reviewed_date = None;
        request.reviewer_comments = None;

        let id = self.records.create(&request).await?;
        request.set_id(id);
        info!(
            id = %request.id,
            employee = %request.employee_id,
            leave_type = %request.leave_type,
            days = request.days(),
            "Leave submitted"
        );
        Ok(request)
    }

    pub async fn approve(
        &self,
        id: &str,
        reviewer_id: &str,
        comments: Option<String>,
    ) -> RepoResult<LeaveRequest> {
        self.transition(id, LeaveStatus::Approved, Some(reviewer_id), comments)
            .await
    }

    pub async fn reject(
        &self,
        id: &str,
        reviewer_id: &str,
        comments: Option<String>,
    ) -> RepoResult<LeaveRequest> {
        self.transition(id, LeaveStatus::Rejected, Some(reviewer_id), comments)
            .await
    }

    /// Withdrawn by the requester; no reviewer is recorded.
    pub async fn cancel(&self, id: &str) -> RepoResult<LeaveRequest> {
        self.transition(id, LeaveStatus::Cancelled, None, None).await
    }

    pub async fn for_employee(&self, employee_id: &str) -> RepoResult<Vec<LeaveRequest>> {
        self.records.query(&self.employee_query(employee_id)).await
    }

    pub fn subscribe_for_employee(&self, employee_id: &str) -> RepoResult<LiveQuery<LeaveRequest>> {
        self.records.subscribe(self.employee_query(employee_id))
    }

    /// Oldest first, the review queue order.
    pub async fn pending(&self) -> RepoResult<Vec<LeaveRequest>> {
        self.records.query(&self.pending_query()).await
    }

    pub fn subscribe_pending(&self) -> RepoResult<LiveQuery<LeaveRequest>> {
        self.records.subscribe(self.pending_query())
    }

    /// Approved requests starting in `year`, optionally of one type.
    pub async fn approved_in_year(
        &self,
        employee_id: &str,
        leave_type: Option<LeaveType>,
        year: i32,
    ) -> RepoResult<Vec<LeaveRequest>> {
        let (from, until) = year_bounds(year)?;
        let mut query = self
            .records
            .query_all()
            .eq("employeeId", employee_id)
            .eq("status", LeaveStatus::Approved.to_string())
            .gte("startDate", date_value(from))
            .lt("startDate", date_value(until));
        if let Some(leave_type) = leave_type {
            query = query.eq("leaveType", leave_type.to_string());
        }
        self.records
            .query(&query.order_by("startDate", Direction::Ascending))
            .await
    }

    async fn transition(
        &self,
        id: &str,
        next: LeaveStatus,
        reviewer_id: Option<&str>,
        comments: Option<String>,
    ) -> RepoResult<LeaveRequest> {
        let mut request = self.records.require(id).await?;
        if !request.status.can_become(next) {
            return Err(RepoError::InvalidState(format!(
                "leave request {id} is {} and cannot become {next}",
                request.status
            )));
        }

        let now = Utc::now();
        let mut fields = Fields::new();
        fields.insert("status".into(), json!(next.to_string()));
        if let Some(reviewer_id) = reviewer_id {
            fields.insert("reviewerId".into(), json!(reviewer_id));
            fields.insert("reviewedDate".into(), json!(now.timestamp_millis()));
            fields.insert(
                "reviewerComments".into(),
                comments.clone().map_or(Value::Null, Value::from),
            );
        }

        self.records
            .update_if(id, "status", LeaveStatus::Pending.to_string(), fields)
            .await?;

        request.status = next;
        if let Some(reviewer_id) = reviewer_id {
            request.reviewer_id = Some(reviewer_id.to_string());
            request.reviewed_date = Some(now);
            request.reviewer_comments = comments;
        }
        info!(id, status = %next, "Leave request transitioned");
        Ok(request)
    }

    fn employee_query(&self, employee_id: &str) -> Query {
        self.records
            .query_all()
            .eq("employeeId", employee_id)
            .order_by("appliedDate", Direction::Descending)
    }

    fn pending_query(&self) -> Query {
        self.records
            .query_all()
            .eq("status", LeaveStatus::Pending.to_string())
            .order_by("appliedDate", Direction::Ascending)
    }
}

pub(crate) fn year_bounds(year: i32) -> RepoResult<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1);
    start
        .zip(end)
        .ok_or_else(|| RepoError::Validation(format!("year {year} is out of range")))
}

