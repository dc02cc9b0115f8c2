//! Multi-document mutations.
//!
//! Everything here goes through repositories; the coordinator only decides
//! what is staged together and how it is split under the batch ceiling.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Policy;
use crate::error::{BulkError, RepoError, RepoResult};
use crate::model::{
    ChatGroup, Entity, NotificationTemplate, ShiftAssignment, ShiftSwapRequest, SwapStatus,
};
use crate::repository::{
    BatchWriter, ChatRepository, EmployeeRepository, NotificationRepository, ShiftRepository,
    WriteSet,
};

/// Outcome of a chunked write that ran to completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub written: usize,
    pub batches: usize,
}

#[derive(Clone)]
pub struct MutationCoordinator {
    employees: EmployeeRepository,
    shifts: ShiftRepository,
    notifications: NotificationRepository,
    chat: ChatRepository,
    writer: BatchWriter,
    ceiling: usize,
}

impl MutationCoordinator {
    pub fn new(
        employees: EmployeeRepository,
        shifts: ShiftRepository,
        notifications: NotificationRepository,
        chat: ChatRepository,
        policy: &Policy,
    ) -> Self {
        let writer = shifts.swaps().writer();
        let ceiling = writer.ceiling(policy.batch_ceiling);
        Self {
            employees,
            shifts,
            notifications,
            chat,
            writer,
            ceiling,
        }
    }

    /// Operations per committed batch.
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Approves a pending swap request and exchanges the two assignments in
    /// one atomic batch. Nothing is written unless both assignments exist,
    /// neither employee would end up double-booked, and neither the request
    /// nor the assignments changed since they were read.
    ///
    /// Approval and the swap are a single step, so an `Approved` request has
    /// already been applied and is refused with `InvalidState`.
    pub async fn process_shift_swap(
        &self,
        request_id: &str,
        reviewer_id: &str,
    ) -> RepoResult<ShiftSwapRequest> {
        let mut request = self.shifts.swap_request(request_id).await?;
        match request.status {
            SwapStatus::Pending => {}
            SwapStatus::Approved => {
                return Err(RepoError::InvalidState(format!(
                    "swap request {request_id} was already approved and applied"
                )));
            }
            SwapStatus::Rejected => {
                return Err(RepoError::InvalidState(format!(
                    "swap request {request_id} was rejected"
                )));
            }
        }

        let requester_slot = self
            .slot(&request.requester_id, request.requester_day())
            .await?;
        let target_slot = self
            .slot(&request.target_employee_id, request.target_day())
            .await?;

        self.ensure_free(&request.target_employee_id, &requester_slot, &target_slot)
            .await?;
        self.ensure_free(&request.requester_id, &target_slot, &requester_slot)
            .await?;

        let now = Utc::now();
        let mut set = WriteSet::new();
        self.shifts
            .stage_swap(&mut set, &request, reviewer_id, now, &requester_slot, &target_slot);
        self.writer.commit(set).await.inspect_err(|err| {
            warn!(request = request_id, error = %err, "Shift swap not applied");
        })?;

        request.status = SwapStatus::Approved;
        request.reviewed_by_id = Some(reviewer_id.to_string());
        request.reviewed_at = Some(now);
        info!(
            request = request_id,
            requester = %request.requester_id,
            target = %request.target_employee_id,
            "Shift swap applied"
        );
        Ok(request)
    }

    /// Creates a chat group with its creator as admin and the other members,
    /// `ceiling` operations per batch. The group and creator land in the
    /// first batch, so an interrupted run leaves a usable group and reports
    /// how many documents were written.
    pub async fn create_chat_group(
        &self,
        mut group: ChatGroup,
        member_ids: &[String],
    ) -> Result<ChatGroup, BulkError> {
        let mut set = WriteSet::new();
        let group_id = self
            .chat
            .stage_group(&mut set, &group, member_ids, Utc::now())
            .map_err(not_started)?;

        let requested = set.len();
        let report = self
            .commit_chunks(
                "create_chat_group",
                requested,
                set.into_chunks(self.ceiling).into_iter().map(Ok),
            )
            .await?;
        group.set_id(group_id);
        info!(
            id = %group.id,
            name = %group.name,
            members = report.written - 1,
            batches = report.batches,
            "Chat group created"
        );
        Ok(group)
    }

    /// Deletes a chat group with all its messages and memberships. Children
    /// go first and the group document last, so an interrupted run leaves
    /// the group in place to retry.
    pub async fn delete_chat_group(&self, group_id: &str) -> Result<BulkReport, BulkError> {
        let fetched = async {
            self.chat.groups().require(group_id).await?;
            let messages = self.chat.messages_of(group_id).await?;
            let members = self.chat.members_of(group_id).await?;
            Ok::<_, RepoError>((messages, members))
        }
        .await;
        let (messages, members) = fetched.map_err(not_started)?;

        let mut set = WriteSet::new();
        for message in &messages {
            self.chat.messages().stage_delete(&mut set, &message.id);
        }
        for member in &members {
            self.chat.members().stage_delete(&mut set, &member.id);
        }
        self.chat.groups().stage_delete(&mut set, group_id);

        let requested = set.len();
        let report = self
            .commit_chunks(
                "delete_chat_group",
                requested,
                set.into_chunks(self.ceiling).into_iter().map(Ok),
            )
            .await?;
        info!(
            group = group_id,
            messages = messages.len(),
            members = members.len(),
            batches = report.batches,
            "Chat group deleted"
        );
        Ok(report)
    }

    /// One notification per recipient, committed `ceiling` at a time.
    pub async fn fan_out(
        &self,
        template: &NotificationTemplate,
        recipients: &[String],
    ) -> Result<BulkReport, BulkError> {
        let now = Utc::now();
        let chunks = recipients.chunks(self.ceiling).map(|chunk| {
            let mut set = WriteSet::new();
            for user_id in chunk {
                self.notifications
                    .stage_create(&mut set, &template.for_user(user_id, now))?;
            }
            Ok::<_, RepoError>(set)
        });
        let report = self
            .commit_chunks("fan_out", recipients.len(), chunks)
            .await?;
        info!(
            kind = %template.kind,
            written = report.written,
            batches = report.batches,
            "Notification fanned out"
        );
        Ok(report)
    }

    pub async fn notify_all_active(
        &self,
        template: &NotificationTemplate,
    ) -> Result<BulkReport, BulkError> {
        let recipients = self
            .employees
            .active_user_ids()
            .await
            .map_err(not_started)?;
        self.fan_out(template, &recipients).await
    }

    pub async fn mark_all_read(&self, user_id: &str) -> Result<BulkReport, BulkError> {
        let unread = self
            .notifications
            .unread_for_user(user_id)
            .await
            .map_err(not_started)?;

        let chunks = unread.chunks(self.ceiling).map(|chunk| {
            let mut set = WriteSet::new();
            for notification in chunk {
                self.notifications.stage_mark_read(&mut set, &notification.id);
            }
            Ok::<_, RepoError>(set)
        });
        self.commit_chunks("mark_all_read", unread.len(), chunks)
            .await
    }

    /// Commits each chunk before the next one is built. Stops at the first
    /// failure and reports what is already durable.
    async fn commit_chunks<I>(
        &self,
        op: &str,
        requested: usize,
        chunks: I,
    ) -> Result<BulkReport, BulkError>
    where
        I: IntoIterator<Item = RepoResult<WriteSet>>,
    {
        let mut report = BulkReport::default();
        for chunk in chunks {
            let committed = match chunk {
                Ok(set) => self.writer.commit(set).await,
                Err(err) => Err(err),
            };
            match committed {
                Ok(written) => {
                    report.written += written;
                    report.batches += 1;
                }
                Err(source) => {
                    error!(
                        op,
                        committed = report.written,
                        requested,
                        batches = report.batches,
                        error = %source,
                        "Chunked write stopped"
                    );
                    return Err(BulkError {
                        committed: report.written,
                        requested,
                        batches: report.batches,
                        source,
                    });
                }
            }
        }
        Ok(report)
    }

    async fn slot(&self, employee_id: &str, date: NaiveDate) -> RepoResult<ShiftAssignment> {
        self.shifts
            .assignment_for(employee_id, date)
            .await?
            .ok_or_else(|| RepoError::AssignmentNotFound {
                employee_id: employee_id.to_string(),
                date,
            })
    }

    /// `employee_id` is about to take over `incoming` and give up
    /// `outgoing`; it must hold nothing else on the incoming day.
    async fn ensure_free(
        &self,
        employee_id: &str,
        incoming: &ShiftAssignment,
        outgoing: &ShiftAssignment,
    ) -> RepoResult<()> {
        let clash = self
            .shifts
            .assignments_on(employee_id, incoming.day())
            .await?
            .into_iter()
            .any(|a| a.id != outgoing.id);
        if clash {
            return Err(RepoError::InvalidState(format!(
                "employee {employee_id} already has a shift on {}",
                incoming.day()
            )));
        }
        Ok(())
    }
}

fn not_started(source: RepoError) -> BulkError {
    BulkError {
        committed: 0,
        requested: 0,
        batches: 0,
        source,
    }
}
