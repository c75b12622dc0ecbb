use std::str::FromStr;

use chrono::DateTime;
use serde::Serialize;
use uuid::Uuid;

pub mod authorization;
pub mod campus;
pub mod data_access;

pub type UserId = Uuid;
pub type ProfileId = Uuid;
pub type EventId = Uuid;
pub type JobId = Uuid;
pub type NotificationId = Uuid;

/// Closed set of account roles. Everything access-related dispatches on
/// this enum, so a new role fails to compile until every gate has an arm
/// for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Faculty,
    Alumni,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Faculty => "faculty",
            Role::Alumni => "alumni",
            Role::Student => "student",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct RoleParseError(String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "faculty" => Ok(Role::Faculty),
            "alumni" => Ok(Role::Alumni),
            "student" => Ok(Role::Student),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}

/// An account. Credentials never live here; they sit in a separate auth
/// store keyed by [`UserId`]. `profile_id` is the denormalized pointer to
/// the role-specific profile document, populated once that document exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(serialize_with = "stoa_utils::serde::serialize_opt_uuid")]
    pub profile_id: Option<ProfileId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentProfile {
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub id: ProfileId,
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub user_id: UserId,
    pub department: String,
    pub enrollment_year: i32,
    pub bio: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlumniProfile {
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub id: ProfileId,
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub user_id: UserId,
    pub graduation_year: i32,
    pub company: String,
    pub position: String,
    pub bio: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacultyProfile {
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub id: ProfileId,
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub user_id: UserId,
    pub department: String,
    pub designation: String,
    pub bio: String,
}

/// One of the three parallel profile shapes. Stored in separate
/// collections; joined to a [`User`] by reference, never embedded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Profile {
    Student(StudentProfile),
    Alumni(AlumniProfile),
    Faculty(FacultyProfile),
}

impl Profile {
    pub fn id(&self) -> ProfileId {
        match self {
            Profile::Student(p) => p.id,
            Profile::Alumni(p) => p.id,
            Profile::Faculty(p) => p.id,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            Profile::Student(p) => p.user_id,
            Profile::Alumni(p) => p.user_id,
            Profile::Faculty(p) => p.user_id,
        }
    }

    /// The role whose accounts this profile shape belongs to.
    pub fn role(&self) -> Role {
        match self {
            Profile::Student(_) => Role::Student,
            Profile::Alumni(_) => Role::Alumni,
            Profile::Faculty(_) => Role::Faculty,
        }
    }
}

/// A [`User`] joined with its role-specific profile document. Admins have
/// no profile shape, so the join is optional by construction.
#[derive(Debug, Clone, Serialize)]
pub struct UserOverview {
    pub user: User,
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub venue: String,
    #[serde(serialize_with = "stoa_utils::serde::serialize_datetime")]
    pub starts_at: DateTime<chrono::Utc>,
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub created_by: UserId,
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid_seq")]
    pub attendees: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub description: String,
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub posted_by: UserId,
    #[serde(serialize_with = "stoa_utils::serde::serialize_datetime")]
    pub posted_at: DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub id: NotificationId,
    #[serde(serialize_with = "stoa_utils::serde::serialize_uuid")]
    pub recipient: UserId,
    pub body: String,
    pub read: bool,
    #[serde(serialize_with = "stoa_utils::serde::serialize_datetime")]
    pub created_at: DateTime<chrono::Utc>,
}
