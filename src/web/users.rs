use crate::db;
use crate::domain::models::{UserAccount, UserType};
use crate::state::SharedState;
use crate::web::error::ApiError;
use crate::web::session::UserSession;
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "type")]
    pub user_type: String,
    pub active: Option<bool>,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub message: String,
    pub user: UserAccount,
}

#[derive(Serialize)]
pub struct UserActionResponse {
    pub success: bool,
    pub message: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", put(update_user).delete(delete_user))
        .with_state(state)
}

#[derive(Debug)]
struct ValidatedUser {
    username: String,
    password: String,
    user_type: UserType,
    active: bool,
}

fn validate_payload(payload: UserPayload) -> Result<ValidatedUser, ApiError> {
    let username = payload.username.trim().to_string();
    if username.is_empty() || payload.password.is_empty() || payload.user_type.is_empty() {
        return Err(ApiError::Validation(
            "Username, password, and type are required".to_string(),
        ));
    }

    if username.chars().count() < 3 || username.chars().count() > 50 {
        return Err(ApiError::Validation(
            "Username must be between 3 and 50 characters".to_string(),
        ));
    }

    if payload.password.chars().count() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let user_type: UserType = payload.user_type.parse().map_err(|_| {
        ApiError::Validation(
            "Type must be one of: admin, executive, manager, operator".to_string(),
        )
    })?;

    Ok(ValidatedUser {
        username,
        password: payload.password,
        user_type,
        active: payload.active.unwrap_or(true),
    })
}

fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::Validation("Invalid user id".to_string()))
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))?
        .to_string();
    Ok(hash)
}

async fn list_users(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<UserAccount>>, ApiError> {
    claims.require_admin()?;

    let users = db::list_users(&state.pool).await?;
    Ok(Json(users))
}

async fn create_user(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<UserPayload>,
) -> Result<Json<UserResponse>, ApiError> {
    claims.require_admin()?;

    let validated = validate_payload(payload)?;
    let hash = hash_password(&validated.password)?;

    // The unique index decides; a rejected insert is the duplicate signal
    let user = match db::insert_user(
        &state.pool,
        &validated.username,
        &hash,
        validated.user_type,
        validated.active,
    )
    .await
    {
        Ok(user) => user,
        Err(e) if db::is_unique_violation(&e) => {
            return Err(ApiError::Conflict("Username already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("User {} ({}) created", user.username, user.user_type);

    Ok(Json(UserResponse {
        success: true,
        message: "User created successfully".to_string(),
        user,
    }))
}

async fn update_user(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<UserPayload>,
) -> Result<Json<UserActionResponse>, ApiError> {
    claims.require_admin()?;

    let id = parse_user_id(&id)?;
    let validated = validate_payload(payload)?;
    let hash = hash_password(&validated.password)?;

    let updated = match db::update_user(
        &state.pool,
        id,
        &validated.username,
        &hash,
        validated.user_type,
        validated.active,
    )
    .await
    {
        Ok(updated) => updated,
        Err(e) if db::is_unique_violation(&e) => {
            return Err(ApiError::Conflict("Username already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    if updated.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!("User {} updated", id);

    Ok(Json(UserActionResponse {
        success: true,
        message: "User updated successfully".to_string(),
    }))
}

async fn delete_user(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<UserActionResponse>, ApiError> {
    claims.require_admin()?;

    let id = parse_user_id(&id)?;
    if !db::delete_user(&state.pool, id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!("User {} deleted", id);

    Ok(Json(UserActionResponse {
        success: true,
        message: "User deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> UserPayload {
        UserPayload {
            username: "executive2".to_string(),
            password: "secret123".to_string(),
            user_type: "executive".to_string(),
            active: None,
        }
    }

    #[test]
    fn valid_user_passes_and_defaults_active() {
        let validated = validate_payload(valid_payload()).unwrap();
        assert_eq!(validated.username, "executive2");
        assert_eq!(validated.user_type, UserType::Executive);
        assert!(validated.active);
    }

    #[test]
    fn explicit_active_flag_is_kept() {
        let mut payload = valid_payload();
        payload.active = Some(false);
        assert!(!validate_payload(payload).unwrap().active);
    }

    #[test]
    fn missing_fields_are_rejected_together() {
        let mut payload = valid_payload();
        payload.password = String::new();
        let err = validate_payload(payload).unwrap_err();
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn username_length_bounds_are_enforced() {
        let mut payload = valid_payload();
        payload.username = "ab".to_string();
        assert!(validate_payload(payload).is_err());

        let mut payload = valid_payload();
        payload.username = "x".repeat(51);
        assert!(validate_payload(payload).is_err());

        let mut payload = valid_payload();
        payload.username = "abc".to_string();
        assert!(validate_payload(payload).is_ok());
    }

    #[test]
    fn short_passwords_are_rejected() {
        let mut payload = valid_payload();
        payload.password = "12345".to_string();
        let err = validate_payload(payload).unwrap_err();
        assert!(err.to_string().contains("6 characters"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut payload = valid_payload();
        payload.user_type = "supervisor".to_string();
        assert!(matches!(
            validate_payload(payload),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn admin_type_accounts_can_exist_in_the_roster() {
        let mut payload = valid_payload();
        payload.user_type = "admin".to_string();
        assert_eq!(
            validate_payload(payload).unwrap().user_type,
            UserType::Admin
        );
    }
}
