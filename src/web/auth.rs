use crate::db;
use crate::domain::models::UserType;
use crate::middleware::RateLimiter;
use crate::state::SharedState;
use crate::web::error::ApiError;
use crate::web::session;
use argon2::{password_hash::PasswordHash, Argon2, PasswordVerifier};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static LOGIN_RATE_LIMITER: Lazy<RateLimiter> = Lazy::new(|| RateLimiter::new(5, 60));

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct AdminLoginUser {
    pub username: String,
    pub id: Uuid,
}

#[derive(Serialize)]
pub struct AdminLoginResponse {
    pub success: bool,
    pub message: String,
    pub user: AdminLoginUser,
}

#[derive(Serialize)]
pub struct ExecutiveLoginUser {
    pub username: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub id: Uuid,
    pub active: bool,
}

#[derive(Serialize)]
pub struct ExecutiveLoginResponse {
    pub success: bool,
    pub message: String,
    pub user: ExecutiveLoginUser,
}

pub fn admin_router(state: SharedState) -> Router {
    Router::new()
        .route("/login", post(admin_login))
        .with_state(state)
}

pub fn executive_router(state: SharedState) -> Router {
    Router::new()
        .route("/login", post(executive_login))
        .with_state(state)
}

/// Client IP for login throttling, taken from the proxy header when the
/// portal runs behind one.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

async fn throttle(headers: &HeaderMap) -> Result<(), ApiError> {
    let ip = client_ip(headers);
    if !LOGIN_RATE_LIMITER.check(&ip).await {
        tracing::warn!("Login rate limit exceeded for IP: {}", ip);
        return Err(ApiError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }
    Ok(())
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

async fn admin_login(
    headers: HeaderMap,
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    throttle(&headers).await?;

    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    // Unknown username and wrong password both answer the same way
    let admin = db::find_admin_by_username(&state.pool, payload.username.trim())
        .await?
        .ok_or_else(|| ApiError::Auth("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &admin.password_hash) {
        return Err(ApiError::Auth("Invalid credentials".to_string()));
    }

    let token = session::sign_session(admin.id, UserType::Admin, &state.session_key)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to sign session: {}", e)))?;

    tracing::info!("Admin {} logged in", admin.username);

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        axum::http::header::SET_COOKIE,
        session::session_cookie(&token)
            .parse()
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("Invalid cookie value")))?,
    );

    let body = AdminLoginResponse {
        success: true,
        message: "Login successful".to_string(),
        user: AdminLoginUser {
            username: admin.username,
            id: admin.id,
        },
    };
    Ok((StatusCode::OK, response_headers, Json(body)))
}

async fn executive_login(
    headers: HeaderMap,
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    throttle(&headers).await?;

    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let user = db::find_user_by_username(&state.pool, payload.username.trim())
        .await?
        .ok_or_else(|| ApiError::Auth("Invalid credentials".to_string()))?;

    // Inactive accounts are refused before the password check, so the
    // message does not depend on password correctness
    if !user.active {
        return Err(ApiError::Auth(
            "Account is inactive. Please contact administrator.".to_string(),
        ));
    }

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::Auth("Invalid credentials".to_string()));
    }

    if !user.user_type.can_use_executive_login() {
        return Err(ApiError::Forbidden(
            "Access denied. Admin users cannot login here.".to_string(),
        ));
    }

    let token = session::sign_session(user.id, user.user_type, &state.session_key)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to sign session: {}", e)))?;

    tracing::info!("User {} ({}) logged in", user.username, user.user_type);

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        axum::http::header::SET_COOKIE,
        session::session_cookie(&token)
            .parse()
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("Invalid cookie value")))?,
    );

    let body = ExecutiveLoginResponse {
        success: true,
        message: "Login successful".to_string(),
        user: ExecutiveLoginUser {
            username: user.username,
            user_type: user.user_type,
            id: user.id,
            active: user.active,
        },
    };
    Ok((StatusCode::OK, response_headers, Json(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHasher, SaltString};

    #[test]
    fn argon2_hash_verifies_original_and_rejects_others() {
        let salt = SaltString::generate(rand_core::OsRng);
        let hash = Argon2::default()
            .hash_password(b"exec123456", &salt)
            .unwrap()
            .to_string();

        assert!(verify_password("exec123456", &hash));
        assert!(!verify_password("exec123457", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("anything", "plaintext-left-over"));
    }

    #[test]
    fn client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 172.16.0.2".parse().unwrap());
        assert_eq!(client_ip(&headers), "10.0.0.1");

        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }
}
