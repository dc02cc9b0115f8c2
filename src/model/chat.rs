use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{RepoError, RepoResult};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum GroupType {
    Department,
    Project,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatGroup {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: GroupType,
    pub created_by: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl ChatGroup {
    fn check(&self) -> RepoResult<()> {
        if self.name.trim().is_empty() {
            return Err(RepoError::Validation("group name is required".into()));
        }
        Ok(())
    }
}

impl_entity!(ChatGroup, "chatGroups", "ChatGroup");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    #[serde(skip)]
    pub id: String,
    pub group_id: String,
    pub employee_id: String,
    pub is_admin: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub joined_at: DateTime<Utc>,
}

impl GroupMember {
    fn check(&self) -> RepoResult<()> {
        Ok(())
    }
}

impl_entity!(GroupMember, "groupMembers", "GroupMember");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(skip)]
    pub id: String,
    pub group_id: String,
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: String,
    pub message: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn check(&self) -> RepoResult<()> {
        if self.message.trim().is_empty() {
            return Err(RepoError::Validation("message is empty".into()));
        }
        Ok(())
    }
}

impl_entity!(Message, "messages", "Message");
