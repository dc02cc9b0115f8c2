use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::debug;

use super::{Repository, WriteSet};
use crate::error::RepoResult;
use crate::model::{Entity, Notification, NotificationTemplate};
use crate::store::{Direction, DocumentStore, Fields, Query};
use crate::subscription::{LiveQuery, SubscriptionManager};

#[derive(Clone)]
pub struct NotificationRepository {
    records: Repository<Notification>,
}

impl NotificationRepository {
    pub fn new(store: Arc<dyn DocumentStore>, live: SubscriptionManager) -> Self {
        Self {
            records: Repository::new(store, live),
        }
    }

    pub fn records(&self) -> &Repository<Notification> {
        &self.records
    }

    /// Single-recipient notification. Use the coordinator for fan-out.
    pub async fn notify(
        &self,
        user_id: &str,
        template: &NotificationTemplate,
    ) -> RepoResult<Notification> {
        let mut notification = template.for_user(user_id, Utc::now());
        let id = self.records.create(&notification).await?;
        notification.set_id(id);
        debug!(id = %notification.id, user = user_id, kind = %notification.kind, "Notified");
        Ok(notification)
    }

    pub async fn for_user(&self, user_id: &str) -> RepoResult<Vec<Notification>> {
        self.records.query(&self.user_query(user_id)).await
    }

    /// Newest `limit` notifications of `user_id`.
    pub fn subscribe_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> RepoResult<LiveQuery<Notification>> {
        self.records.subscribe(self.user_query(user_id).limit(limit))
    }

    pub async fn unread_for_user(&self, user_id: &str) -> RepoResult<Vec<Notification>> {
        self.records
            .query(&self.user_query(user_id).eq("isRead", false))
            .await
    }

    pub async fn mark_read(&self, id: &str) -> RepoResult<()> {
        self.records.update(id, read_flag()).await
    }

    pub fn stage_create(&self, set: &mut WriteSet, notification: &Notification) -> RepoResult<String> {
        self.records.stage_create(set, notification)
    }

    pub fn stage_mark_read(&self, set: &mut WriteSet, id: &str) {
        self.records.stage_update(set, id, read_flag(), Vec::new());
    }

    fn user_query(&self, user_id: &str) -> Query {
        self.records
            .query_all()
            .eq("userId", user_id)
            .order_by("createdAt", Direction::Descending)
    }
}

fn read_flag() -> Fields {
    let mut fields = Fields::new();
    fields.insert("isRead".into(), json!(true));
    fields
}
