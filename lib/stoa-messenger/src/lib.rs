use chrono::DateTime;
use serde::Serialize;
use uuid::Uuid;

pub use stoa_campus::{Role, User, UserId};

pub mod authorization;
pub mod data_access;
pub mod messenger;
pub mod registry;

pub type MessageId = Uuid;

#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct Message {
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub id: MessageId,
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub from: UserId,
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub to: UserId,
    pub content: String,
    pub read: bool,
    #[serde(serialize_with = "stoa_utils::serde::serialize_datetime")]
    pub sent_at: DateTime<chrono::Utc>,
}

/// A message the way it leaves the process: the stored row together with
/// who sent it and who it is for, so clients never have to resolve ids
/// themselves.
#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct MessageDelivery {
    pub message: Message,
    pub sender: UserSummary,
    pub receiver: UserSummary,
}

#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct UserSummary {
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary { id: user.id, name: user.name.clone(), role: user.role }
    }
}
