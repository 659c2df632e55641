use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Admin,
    Executive,
    Manager,
    Operator,
}

impl UserType {
    /// Roles allowed through the executive login. Admin accounts in the
    /// user roster must use the admin login instead.
    pub fn can_use_executive_login(&self) -> bool {
        matches!(self, UserType::Executive | UserType::Manager | UserType::Operator)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserType::Admin => "admin",
            UserType::Executive => "executive",
            UserType::Manager => "manager",
            UserType::Operator => "operator",
        };
        f.write_str(s)
    }
}

impl FromStr for UserType {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "admin" => Ok(UserType::Admin),
            "executive" => Ok(UserType::Executive),
            "manager" => Ok(UserType::Manager),
            "operator" => Ok(UserType::Operator),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "satisfaction", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Satisfaction {
    Satisfied,
    NotSatisfied,
}

impl Satisfaction {
    /// Status a new record gets when the submitter does not set one.
    pub fn default_status(&self) -> FeedbackStatus {
        match self {
            Satisfaction::Satisfied => FeedbackStatus::Resolved,
            Satisfaction::NotSatisfied => FeedbackStatus::Pending,
        }
    }
}

impl FromStr for Satisfaction {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "satisfied" => Ok(Satisfaction::Satisfied),
            "not-satisfied" => Ok(Satisfaction::NotSatisfied),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "feedback_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Pending,
    Resolved,
}

impl FromStr for FeedbackStatus {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "pending" => Ok(FeedbackStatus::Pending),
            "resolved" => Ok(FeedbackStatus::Resolved),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: Uuid,
    pub call_id: String,
    pub citizen_mobile: String,
    pub citizen_name: String,
    pub query_type: String,
    pub satisfaction: Satisfaction,
    pub description: String,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub status: FeedbackStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct AdminCredential {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}
