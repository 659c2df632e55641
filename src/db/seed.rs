use crate::domain::models::{Satisfaction, UserType};
use anyhow::Result;
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use sqlx::PgPool;
use uuid::Uuid;

struct SeedUser<'a> {
    username: &'a str,
    password: &'a str,
    user_type: UserType,
    active: bool,
}

struct SeedFeedback<'a> {
    call_id: &'a str,
    citizen_mobile: &'a str,
    citizen_name: &'a str,
    query_type: &'a str,
    satisfaction: Satisfaction,
    description: &'a str,
    submitted_by: &'a str,
    submitted_at: &'a str,
}

pub async fn seed_all(pool: &PgPool) -> Result<()> {
    seed_admin(pool).await?;
    seed_users(pool).await?;
    seed_feedback(pool).await?;
    Ok(())
}

fn hash_password(argon: &Argon2<'_>, password: &str) -> Result<String> {
    let salt = SaltString::generate(rand_core::OsRng);
    let hash = argon
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();
    Ok(hash)
}

/// The admin credential store is seeded here and never written by the
/// application afterwards.
async fn seed_admin(pool: &PgPool) -> Result<()> {
    let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin1234".to_string());

    let hash = hash_password(&Argon2::default(), &password)?;
    sqlx::query(
        r#"
        INSERT INTO admin_credentials (id, username, password_hash)
        VALUES ($1, $2, $3)
        ON CONFLICT (username) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&username)
    .bind(&hash)
    .execute(pool)
    .await?;
    Ok(())
}

async fn seed_users(pool: &PgPool) -> Result<()> {
    let users = vec![
        SeedUser {
            username: "manager1",
            password: "manager123",
            user_type: UserType::Manager,
            active: true,
        },
        SeedUser {
            username: "executive1",
            password: "exec123456",
            user_type: UserType::Executive,
            active: true,
        },
        SeedUser {
            username: "operator1",
            password: "op1234",
            user_type: UserType::Operator,
            active: false,
        },
    ];

    let argon = Argon2::default();
    for user in users {
        let hash = hash_password(&argon, user.password)?;
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, user_type, active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.username)
        .bind(&hash)
        .bind(user.user_type)
        .bind(user.active)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_feedback(pool: &PgPool) -> Result<()> {
    let records = vec![
        SeedFeedback {
            call_id: "CG001",
            citizen_mobile: "9876543210",
            citizen_name: "Ramesh Kumar",
            query_type: "Birth Certificate",
            satisfaction: Satisfaction::Satisfied,
            description: "Citizen was satisfied with the quick resolution. Birth certificate application was processed successfully and citizen received confirmation.",
            submitted_by: "EXE001",
            submitted_at: "2024-01-15T10:30:00Z",
        },
        SeedFeedback {
            call_id: "CG002",
            citizen_mobile: "9876543211",
            citizen_name: "Sunita Devi",
            query_type: "Income Certificate",
            satisfaction: Satisfaction::NotSatisfied,
            description: "Citizen was not satisfied with the processing time. Income certificate application is taking longer than expected. Requires follow-up with district office.",
            submitted_by: "EXE002",
            submitted_at: "2024-01-14T14:20:00Z",
        },
        SeedFeedback {
            call_id: "CG003",
            citizen_mobile: "9876543212",
            citizen_name: "Mohan Lal",
            query_type: "Caste Certificate",
            satisfaction: Satisfaction::Satisfied,
            description: "Query resolved successfully. Citizen was guided through the online application process and received immediate confirmation.",
            submitted_by: "EXE001",
            submitted_at: "2024-01-13T16:45:00Z",
        },
    ];

    for record in records {
        let submitted_at: chrono::DateTime<chrono::Utc> = record.submitted_at.parse()?;
        sqlx::query(
            r#"
            INSERT INTO feedback (
                id, call_id, citizen_mobile, citizen_name, query_type,
                satisfaction, description, submitted_by, submitted_at, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (call_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.call_id)
        .bind(record.citizen_mobile)
        .bind(record.citizen_name)
        .bind(record.query_type)
        .bind(record.satisfaction)
        .bind(record.description)
        .bind(record.submitted_by)
        .bind(submitted_at)
        .bind(record.satisfaction.default_status())
        .execute(pool)
        .await?;
    }
    Ok(())
}
