use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::{Repository, WriteSet};
use crate::error::{RepoError, RepoResult};
use crate::model::{ChatGroup, Entity, GroupMember, Message};
use crate::store::{Direction, DocumentStore, Query};
use crate::subscription::{LiveQuery, SubscriptionManager};

/// Chat groups with their memberships and messages.
#[derive(Clone)]
pub struct ChatRepository {
    groups: Repository<ChatGroup>,
    members: Repository<GroupMember>,
    messages: Repository<Message>,
}

impl ChatRepository {
    pub fn new(store: Arc<dyn DocumentStore>, live: SubscriptionManager) -> Self {
        Self {
            groups: Repository::new(Arc::clone(&store), live.clone()),
            members: Repository::new(Arc::clone(&store), live.clone()),
            messages: Repository::new(store, live),
        }
    }

    pub fn groups(&self) -> &Repository<ChatGroup> {
        &self.groups
    }

    pub fn members(&self) -> &Repository<GroupMember> {
        &self.members
    }

    pub fn messages(&self) -> &Repository<Message> {
        &self.messages
    }

    /// Stages the group, then its creator as admin, then every other
    /// member once. Returns the new group id. The order matters to callers
    /// that split the set: the group and its creator come first.
    pub fn stage_group(
        &self,
        set: &mut WriteSet,
        group: &ChatGroup,
        member_ids: &[String],
        joined_at: DateTime<Utc>,
    ) -> RepoResult<String> {
        let group_id = self.groups.stage_create(set, group)?;

        let others: BTreeSet<&str> = member_ids
            .iter()
            .map(String::as_str)
            .filter(|id| *id != group.created_by)
            .collect();
        let creator = std::iter::once((group.created_by.as_str(), true));
        for (employee_id, is_admin) in creator.chain(others.into_iter().map(|id| (id, false))) {
            let member = GroupMember {
                id: String::new(),
                group_id: group_id.clone(),
                employee_id: employee_id.to_string(),
                is_admin,
                joined_at,
            };
            self.members.stage_create(set, &member)?;
        }
        Ok(group_id)
    }

    pub async fn add_member(
        &self,
        group_id: &str,
        employee_id: &str,
        is_admin: bool,
    ) -> RepoResult<GroupMember> {
        self.groups.require(group_id).await?;
        if self.membership(group_id, employee_id).await?.is_some() {
            return Err(RepoError::already_exists(
                GroupMember::NAME,
                "groupId/employeeId",
                format!("{group_id} {employee_id}"),
            ));
        }

        let mut member = GroupMember {
            id: String::new(),
            group_id: group_id.to_string(),
            employee_id: employee_id.to_string(),
            is_admin,
            joined_at: Utc::now(),
        };
        let id = self.members.create(&member).await?;
        member.set_id(id);
        info!(group = group_id, employee = employee_id, "Member added");
        Ok(member)
    }

    pub async fn remove_member(&self, group_id: &str, employee_id: &str) -> RepoResult<()> {
        let member = self
            .membership(group_id, employee_id)
            .await?
            .ok_or_else(|| {
                RepoError::not_found(GroupMember::NAME, format!("{employee_id} in {group_id}"))
            })?;
        self.members.delete(&member.id).await?;
        info!(group = group_id, employee = employee_id, "Member removed");
        Ok(())
    }

    pub async fn members_of(&self, group_id: &str) -> RepoResult<Vec<GroupMember>> {
        self.members
            .query(
                &self
                    .members
                    .query_all()
                    .eq("groupId", group_id)
                    .order_by("joinedAt", Direction::Ascending),
            )
            .await
    }

    /// Active groups the employee belongs to, by name.
    pub async fn groups_for_employee(&self, employee_id: &str) -> RepoResult<Vec<ChatGroup>> {
        let memberships = self
            .members
            .query(&self.members.query_all().eq("employeeId", employee_id))
            .await?;

        let mut groups = Vec::with_capacity(memberships.len());
        for membership in memberships {
            if let Some(group) = self.groups.get_by_id(&membership.group_id).await? {
                if group.is_active {
                    groups.push(group);
                }
            }
        }
        groups.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        groups.dedup_by(|a, b| a.id == b.id);
        Ok(groups)
    }

    /// Posts to an active group. Only members may post.
    pub async fn send_message(
        &self,
        group_id: &str,
        sender_id: &str,
        sender_name: &str,
        text: &str,
    ) -> RepoResult<Message> {
        let group = self.groups.require(group_id).await?;
        if !group.is_active {
            return Err(RepoError::InvalidState(format!(
                "chat group {group_id} is closed"
            )));
        }
        if self.membership(group_id, sender_id).await?.is_none() {
            return Err(RepoError::PermissionDenied(format!(
                "{sender_id} is not a member of {group_id}"
            )));
        }

        let mut message = Message {
            id: String::new(),
            group_id: group_id.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            message: text.to_string(),
            timestamp: Utc::now(),
        };
        let id = self.messages.create(&message).await?;
        message.set_id(id);
        Ok(message)
    }

    /// Full history, oldest first.
    pub async fn messages_of(&self, group_id: &str) -> RepoResult<Vec<Message>> {
        self.messages
            .query(
                &self
                    .messages
                    .query_all()
                    .eq("groupId", group_id)
                    .order_by("timestamp", Direction::Ascending),
            )
            .await
    }

    /// Latest `limit` messages, newest first.
    pub fn subscribe_messages(&self, group_id: &str, limit: usize) -> RepoResult<LiveQuery<Message>> {
        self.messages.subscribe(self.latest_messages(group_id).limit(limit))
    }

    fn latest_messages(&self, group_id: &str) -> Query {
        self.messages
            .query_all()
            .eq("groupId", group_id)
            .order_by("timestamp", Direction::Descending)
    }

    async fn membership(&self, group_id: &str, employee_id: &str) -> RepoResult<Option<GroupMember>> {
        self.members
            .first(
                self.members
                    .query_all()
                    .eq("groupId", group_id)
                    .eq("employeeId", employee_id),
            )
            .await
    }
}
