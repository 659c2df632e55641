pub mod seed;

use crate::domain::models::{
    AdminCredential, Feedback, FeedbackStatus, Satisfaction, UserAccount, UserType,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Fields of a feedback record as validated from a submission, before the
/// database assigns the bookkeeping timestamps.
#[derive(Debug)]
pub struct NewFeedback {
    pub call_id: String,
    pub citizen_mobile: String,
    pub citizen_name: String,
    pub query_type: String,
    pub satisfaction: Satisfaction,
    pub description: String,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub status: FeedbackStatus,
}

#[derive(Debug)]
pub struct FeedbackCounts {
    pub total: i64,
    pub pending: i64,
    pub resolved: i64,
    pub satisfied: i64,
}

/// True when the error is a Postgres unique-constraint violation. The
/// unique indexes on usernames and call ids are the only duplicate guard;
/// there is no pre-check read.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

// ========== Feedback ==========

pub async fn list_feedback(
    pool: &PgPool,
    status: Option<FeedbackStatus>,
    search: Option<&str>,
) -> Result<Vec<Feedback>> {
    let records = sqlx::query_as::<_, Feedback>(
        r#"
        SELECT
            id,
            call_id,
            citizen_mobile,
            citizen_name,
            query_type,
            satisfaction,
            description,
            submitted_by,
            submitted_at,
            status,
            created_at,
            updated_at
        FROM feedback
        WHERE ($1::feedback_status IS NULL OR status = $1)
          AND ($2::text IS NULL
               OR call_id ILIKE '%' || $2 || '%'
               OR citizen_mobile LIKE '%' || $2 || '%'
               OR description ILIKE '%' || $2 || '%')
        ORDER BY submitted_at DESC
        "#,
    )
    .bind(status)
    .bind(search)
    .fetch_all(pool)
    .await?;
    Ok(records)
}

pub async fn insert_feedback(pool: &PgPool, record: &NewFeedback) -> Result<Feedback> {
    let stored = sqlx::query_as::<_, Feedback>(
        r#"
        INSERT INTO feedback (
            id,
            call_id,
            citizen_mobile,
            citizen_name,
            query_type,
            satisfaction,
            description,
            submitted_by,
            submitted_at,
            status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING
            id, call_id, citizen_mobile, citizen_name, query_type,
            satisfaction, description, submitted_by, submitted_at, status,
            created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&record.call_id)
    .bind(&record.citizen_mobile)
    .bind(&record.citizen_name)
    .bind(&record.query_type)
    .bind(record.satisfaction)
    .bind(&record.description)
    .bind(&record.submitted_by)
    .bind(record.submitted_at)
    .bind(record.status)
    .fetch_one(pool)
    .await?;
    Ok(stored)
}

/// Sets the status of a record, returning None when the id is unknown.
pub async fn update_feedback_status(
    pool: &PgPool,
    id: Uuid,
    status: FeedbackStatus,
) -> Result<Option<Feedback>> {
    let updated = sqlx::query_as::<_, Feedback>(
        r#"
        UPDATE feedback
        SET status = $1,
            updated_at = NOW()
        WHERE id = $2
        RETURNING
            id, call_id, citizen_mobile, citizen_name, query_type,
            satisfaction, description, submitted_by, submitted_at, status,
            created_at, updated_at
        "#,
    )
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(updated)
}

pub async fn feedback_counts(pool: &PgPool) -> Result<FeedbackCounts> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE status = 'pending') AS pending,
            COUNT(*) FILTER (WHERE status = 'resolved') AS resolved,
            COUNT(*) FILTER (WHERE satisfaction = 'satisfied') AS satisfied
        FROM feedback
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(FeedbackCounts {
        total: row.try_get("total")?,
        pending: row.try_get("pending")?,
        resolved: row.try_get("resolved")?,
        satisfied: row.try_get("satisfied")?,
    })
}

// ========== Users ==========

pub async fn list_users(pool: &PgPool) -> Result<Vec<UserAccount>> {
    let users = sqlx::query_as::<_, UserAccount>(
        r#"
        SELECT id, username, password_hash, user_type, active, created_at, updated_at
        FROM users
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn find_user_by_username(pool: &PgPool, username: &str) -> Result<Option<UserAccount>> {
    let user = sqlx::query_as::<_, UserAccount>(
        r#"
        SELECT id, username, password_hash, user_type, active, created_at, updated_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<UserAccount>> {
    let user = sqlx::query_as::<_, UserAccount>(
        r#"
        SELECT id, username, password_hash, user_type, active, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn insert_user(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
    user_type: UserType,
    active: bool,
) -> Result<UserAccount> {
    let user = sqlx::query_as::<_, UserAccount>(
        r#"
        INSERT INTO users (id, username, password_hash, user_type, active)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, username, password_hash, user_type, active, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(password_hash)
    .bind(user_type)
    .bind(active)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn update_user(
    pool: &PgPool,
    id: Uuid,
    username: &str,
    password_hash: &str,
    user_type: UserType,
    active: bool,
) -> Result<Option<UserAccount>> {
    let user = sqlx::query_as::<_, UserAccount>(
        r#"
        UPDATE users
        SET username = $1,
            password_hash = $2,
            user_type = $3,
            active = $4,
            updated_at = NOW()
        WHERE id = $5
        RETURNING id, username, password_hash, user_type, active, created_at, updated_at
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(user_type)
    .bind(active)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ========== Admin credentials ==========

pub async fn find_admin_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<AdminCredential>> {
    let admin = sqlx::query_as::<_, AdminCredential>(
        r#"
        SELECT id, username, password_hash
        FROM admin_credentials
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(admin)
}

pub async fn find_admin_by_id(pool: &PgPool, id: Uuid) -> Result<Option<AdminCredential>> {
    let admin = sqlx::query_as::<_, AdminCredential>(
        r#"
        SELECT id, username, password_hash
        FROM admin_credentials
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(admin)
}
