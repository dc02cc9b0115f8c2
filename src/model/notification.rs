use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{RepoError, RepoResult};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum NotificationType {
    Leave,
    Attendance,
    Payroll,
    Shift,
    Document,
    Announcement,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(skip)]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub related_id: Option<String>,
    pub is_read: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn check(&self) -> RepoResult<()> {
        if self.user_id.trim().is_empty() {
            return Err(RepoError::Validation("notification needs a userId".into()));
        }
        if self.title.trim().is_empty() {
            return Err(RepoError::Validation("notification title is empty".into()));
        }
        Ok(())
    }
}

impl_entity!(Notification, "notifications", "Notification");

/// One logical notification, expanded into a record per recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationTemplate {
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
    #[serde(default)]
    pub related_id: Option<String>,
}

impl NotificationTemplate {
    pub fn new(kind: NotificationType, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            related_id: None,
        }
    }

    pub fn related_to(mut self, id: impl Into<String>) -> Self {
        self.related_id = Some(id.into());
        self
    }

    pub fn for_user(&self, user_id: &str, now: DateTime<Utc>) -> Notification {
        Notification {
            id: String::new(),
            user_id: user_id.to_string(),
            title: self.title.clone(),
            message: self.message.clone(),
            kind: self.kind,
            related_id: self.related_id.clone(),
            is_read: false,
            created_at: now,
        }
    }
}
