use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use tracing::info;

use super::{Repository, WriteSet};
use crate::error::{RepoError, RepoResult};
use crate::model::{
    AssignmentStatus, Entity, Shift, ShiftAssignment, ShiftSwapRequest, SwapStatus, date_value,
    instant_value,
};
use crate::store::{Direction, DocumentStore, Fields, Precondition};
use crate::subscription::{LiveQuery, SubscriptionManager};

/// Shifts, their per-day assignments and swap requests between employees.
#[derive(Clone)]
pub struct ShiftRepository {
    shifts: Repository<Shift>,
    assignments: Repository<ShiftAssignment>,
    swaps: Repository<ShiftSwapRequest>,
}

impl ShiftRepository {
    pub fn new(store: Arc<dyn DocumentStore>, live: SubscriptionManager) -> Self {
        Self {
            shifts: Repository::new(Arc::clone(&store), live.clone()),
            assignments: Repository::new(Arc::clone(&store), live.clone()),
            swaps: Repository::new(store, live),
        }
    }

    pub fn shifts(&self) -> &Repository<Shift> {
        &self.shifts
    }

    pub fn assignments(&self) -> &Repository<ShiftAssignment> {
        &self.assignments
    }

    pub fn swaps(&self) -> &Repository<ShiftSwapRequest> {
        &self.swaps
    }

    pub async fn create_shift(&self, mut shift: Shift) -> RepoResult<Shift> {
        let id = self.shifts.create(&shift).await?;
        shift.set_id(id);
        info!(id = %shift.id, name = %shift.name, "Shift created");
        Ok(shift)
    }

    pub async fn active_shifts(&self) -> RepoResult<Vec<Shift>> {
        self.shifts
            .query(
                &self
                    .shifts
                    .query_all()
                    .eq("isActive", true)
                    .order_by("startTime", Direction::Ascending),
            )
            .await
    }

    /// One live assignment per (employee, date); a second one is
    /// `AlreadyExists`.
    pub async fn assign(&self, mut assignment: ShiftAssignment) -> RepoResult<ShiftAssignment> {
        self.shifts.require(&assignment.shift_id).await?;
        let day = assignment.day();
        if self
            .assignment_for(&assignment.employee_id, day)
            .await?
            .is_some()
        {
            return Err(RepoError::already_exists(
                ShiftAssignment::NAME,
                "employeeId/date",
                format!("{} {day}", assignment.employee_id),
            ));
        }

        let id = self.assignments.create(&assignment).await?;
        assignment.set_id(id);
        info!(
            id = %assignment.id,
            employee = %assignment.employee_id,
            date = %day,
            "Shift assigned"
        );
        Ok(assignment)
    }

    /// The non-cancelled assignment of `employee_id` on `date`.
    pub async fn assignment_for(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> RepoResult<Option<ShiftAssignment>> {
        Ok(self
            .assignments_on(employee_id, date)
            .await?
            .into_iter()
            .next())
    }

    /// Every non-cancelled assignment of `employee_id` on `date`. More than
    /// one means the store was written around this repository.
    pub async fn assignments_on(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> RepoResult<Vec<ShiftAssignment>> {
        self.assignments
            .query(
                &self
                    .assignments
                    .query_all()
                    .eq("employeeId", employee_id)
                    .eq("date", date_value(date))
                    .not_eq("status", AssignmentStatus::Cancelled.to_string()),
            )
            .await
    }

    pub async fn assignments_for_date(&self, date: NaiveDate) -> RepoResult<Vec<ShiftAssignment>> {
        self.assignments
            .query(
                &self
                    .assignments
                    .query_all()
                    .eq("date", date_value(date))
                    .order_by("employeeId", Direction::Ascending),
            )
            .await
    }

    pub fn subscribe_assignments_for_employee(
        &self,
        employee_id: &str,
    ) -> RepoResult<LiveQuery<ShiftAssignment>> {
        self.assignments.subscribe(
            self.assignments
                .query_all()
                .eq("employeeId", employee_id)
                .order_by("date", Direction::Ascending),
        )
    }

    pub async fn request_swap(&self, mut request: ShiftSwapRequest) -> RepoResult<ShiftSwapRequest> {
        request.status = SwapStatus::Pending;
        request.reviewed_by_id = None;
        request.reviewed_at = None;

        let id = self.swaps.create(&request).await?;
        request.set_id(id);
        info!(
            id = %request.id,
            requester = %request.requester_id,
            target = %request.target_employee_id,
            "Shift swap requested"
        );
        Ok(request)
    }

    pub async fn swap_request(&self, id: &str) -> RepoResult<ShiftSwapRequest> {
        self.swaps.require(id).await
    }

    pub async fn pending_swaps(&self) -> RepoResult<Vec<ShiftSwapRequest>> {
        self.swaps
            .query(
                &self
                    .swaps
                    .query_all()
                    .eq("status", SwapStatus::Pending.to_string())
                    .order_by("createdAt", Direction::Ascending),
            )
            .await
    }

    /// Requests the employee made or is the target of, newest first.
    pub async fn swaps_for_employee(&self, employee_id: &str) -> RepoResult<Vec<ShiftSwapRequest>> {
        let mut found = Vec::new();
        for field in ["requesterId", "targetEmployeeId"] {
            found.extend(
                self.swaps
                    .query(&self.swaps.query_all().eq(field, employee_id))
                    .await?,
            );
        }
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        found.dedup_by(|a, b| a.id == b.id);
        Ok(found)
    }

    pub async fn reject_swap(&self, id: &str, reviewer_id: &str) -> RepoResult<ShiftSwapRequest> {
        let mut request = self.swaps.require(id).await?;
        if request.status != SwapStatus::Pending {
            return Err(RepoError::InvalidState(format!(
                "swap request {id} is already {}",
                request.status
            )));
        }
        let now = Utc::now();
        self.swaps
            .update_if(
                id,
                "status",
                SwapStatus::Pending.to_string(),
                review_fields(SwapStatus::Rejected, reviewer_id, now),
            )
            .await?;

        request.status = SwapStatus::Rejected;
        request.reviewed_by_id = Some(reviewer_id.to_string());
        request.reviewed_at = Some(now);
        info!(id, reviewer = reviewer_id, "Shift swap rejected");
        Ok(request)
    }

    /// Stages the approval of `request` together with the exchange of
    /// `employeeId` between the two assignments. Each write is guarded by
    /// the value it expects to replace.
    pub fn stage_swap(
        &self,
        set: &mut WriteSet,
        request: &ShiftSwapRequest,
        reviewer_id: &str,
        at: DateTime<Utc>,
        requester_slot: &ShiftAssignment,
        target_slot: &ShiftAssignment,
    ) {
        self.swaps.stage_update(
            set,
            &request.id,
            review_fields(SwapStatus::Approved, reviewer_id, at),
            vec![Precondition::field_equals(
                "status",
                SwapStatus::Pending.to_string(),
            )],
        );
        for (slot, new_holder) in [
            (requester_slot, &target_slot.employee_id),
            (target_slot, &requester_slot.employee_id),
        ] {
            let mut fields = Fields::new();
            fields.insert("employeeId".into(), json!(new_holder));
            self.assignments.stage_update(
                set,
                &slot.id,
                fields,
                vec![Precondition::field_equals(
                    "employeeId",
                    slot.employee_id.clone(),
                )],
            );
        }
    }
}

fn review_fields(status: SwapStatus, reviewer_id: &str, at: DateTime<Utc>) -> Fields {
    let mut fields = Fields::new();
    fields.insert("status".into(), json!(status.to_string()));
    fields.insert("reviewedById".into(), json!(reviewer_id));
    fields.insert("reviewedAt".into(), json!(instant_value(at)));
    fields
}
