use crate::db;
use crate::domain::models::UserType;
use crate::state::SharedState;
use crate::web::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_TTL_HOURS: i64 = 24;

/// Claims carried by a signed session token. The role decides which store
/// the principal is revalidated against on each request: Admin claims map
/// to the admin-credential store, everything else to the user roster.
#[derive(Debug, Clone)]
pub struct SessionClaims {
    pub principal_id: Uuid,
    pub role: UserType,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid token format")]
    Invalid,
    #[error("signature mismatch")]
    Signature,
    #[error("expired")]
    Expired,
    #[error("bad role")]
    Role,
}

pub fn sign_session(principal_id: Uuid, role: UserType, key: &[u8]) -> Result<String, SessionError> {
    let exp = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
    sign_session_with_exp(principal_id, role, exp.timestamp(), key)
}

fn sign_session_with_exp(
    principal_id: Uuid,
    role: UserType,
    exp: i64,
    key: &[u8],
) -> Result<String, SessionError> {
    let payload = format!("{}|{}|{}", principal_id, role, exp);
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(payload.as_bytes());
    let sig = mac.finalize().into_bytes();
    let token = format!(
        "{}.{}",
        general_purpose::STANDARD.encode(payload.as_bytes()),
        general_purpose::STANDARD.encode(sig)
    );
    Ok(token)
}

pub fn verify_session(token: &str, key: &[u8]) -> Result<SessionClaims, SessionError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(SessionError::Invalid);
    }
    let payload_bytes = general_purpose::STANDARD
        .decode(parts[0])
        .map_err(|_| SessionError::Invalid)?;
    let sig_bytes = general_purpose::STANDARD
        .decode(parts[1])
        .map_err(|_| SessionError::Invalid)?;

    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(&payload_bytes);
    mac.verify_slice(&sig_bytes)
        .map_err(|_| SessionError::Signature)?;

    let payload = String::from_utf8(payload_bytes).map_err(|_| SessionError::Invalid)?;
    let pieces: Vec<&str> = payload.split('|').collect();
    if pieces.len() != 3 {
        return Err(SessionError::Invalid);
    }
    let principal_id = Uuid::parse_str(pieces[0]).map_err(|_| SessionError::Invalid)?;
    let role: UserType = pieces[1].parse().map_err(|_| SessionError::Role)?;
    let exp: i64 = pieces[2].parse().map_err(|_| SessionError::Invalid)?;
    if Utc::now().timestamp() > exp {
        return Err(SessionError::Expired);
    }
    Ok(SessionClaims {
        principal_id,
        role,
        exp,
    })
}

/// Accepts the token either as a bearer Authorization header or as the
/// session cookie set at login.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(bearer) = val.strip_prefix("Bearer ") {
                return Some(bearer.trim().to_string());
            }
        }
    }
    if let Some(cookie) = headers.get(axum::http::header::COOKIE) {
        if let Ok(val) = cookie.to_str() {
            for pair in val.split(';') {
                let trimmed = pair.trim();
                if let Some(rest) = trimmed.strip_prefix("session=") {
                    return Some(rest.to_string());
                }
            }
        }
    }
    None
}

pub fn session_cookie(token: &str) -> String {
    format!("session={token}; HttpOnly; SameSite=Lax; Path=/")
}

/// Axum extractor that validates the session token and revalidates the
/// principal against its store.
pub struct UserSession(pub SessionClaims);

#[async_trait]
impl<S> FromRequestParts<S> for UserSession
where
    S: Send + Sync,
    SharedState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared = SharedState::from_ref(state);

        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::Auth("Authentication required".to_string()))?;

        let claims = verify_session(&token, &shared.session_key).map_err(|e| {
            tracing::warn!("Session verification failed: {}", e);
            ApiError::Auth("Invalid or expired session".to_string())
        })?;

        match claims.role {
            UserType::Admin => {
                db::find_admin_by_id(&shared.pool, claims.principal_id)
                    .await?
                    .ok_or_else(|| ApiError::Auth("Invalid or expired session".to_string()))?;
            }
            _ => {
                let user = db::find_user_by_id(&shared.pool, claims.principal_id)
                    .await?
                    .ok_or_else(|| ApiError::Auth("Invalid or expired session".to_string()))?;
                if !user.active {
                    return Err(ApiError::Auth(
                        "Account is inactive. Please contact administrator.".to_string(),
                    ));
                }
            }
        }

        Ok(UserSession(claims))
    }
}

impl SessionClaims {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role != UserType::Admin {
            return Err(ApiError::Forbidden("Access denied".to_string()));
        }
        Ok(())
    }

    pub fn require_operator_role(&self) -> Result<(), ApiError> {
        if !self.role.can_use_executive_login() {
            return Err(ApiError::Forbidden("Access denied".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"an-hmac-test-key-for-session-tokens";

    #[test]
    fn token_round_trips() {
        let id = Uuid::new_v4();
        let token = sign_session(id, UserType::Executive, KEY).unwrap();
        let claims = verify_session(&token, KEY).unwrap();
        assert_eq!(claims.principal_id, id);
        assert_eq!(claims.role, UserType::Executive);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let token = sign_session(Uuid::new_v4(), UserType::Admin, KEY).unwrap();
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        parts[1] = general_purpose::STANDARD.encode(b"forged-signature-bytes-0000000000");
        let forged = parts.join(".");
        assert!(matches!(
            verify_session(&forged, KEY),
            Err(SessionError::Signature)
        ));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = sign_session(Uuid::new_v4(), UserType::Manager, KEY).unwrap();
        assert!(matches!(
            verify_session(&token, b"a-different-key"),
            Err(SessionError::Signature)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let exp = Utc::now().timestamp() - 60;
        let token = sign_session_with_exp(Uuid::new_v4(), UserType::Operator, exp, KEY).unwrap();
        assert!(matches!(
            verify_session(&token, KEY),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn garbage_tokens_are_invalid() {
        assert!(verify_session("not-a-token", KEY).is_err());
        assert!(verify_session("a.b.c", KEY).is_err());
        assert!(verify_session("", KEY).is_err());
    }

    #[test]
    fn bearer_and_cookie_tokens_are_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer abc123".parse().unwrap(),
        );
        assert_eq!(extract_token(&headers), Some("abc123".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            "theme=dark; session=tok456".parse().unwrap(),
        );
        assert_eq!(extract_token(&headers), Some("tok456".to_string()));

        assert_eq!(extract_token(&HeaderMap::new()), None);
    }

    #[test]
    fn admin_gate_rejects_operator_roles() {
        let claims = SessionClaims {
            principal_id: Uuid::new_v4(),
            role: UserType::Executive,
            exp: 0,
        };
        assert!(claims.require_admin().is_err());
        assert!(claims.require_operator_role().is_ok());

        let claims = SessionClaims {
            principal_id: Uuid::new_v4(),
            role: UserType::Admin,
            exp: 0,
        };
        assert!(claims.require_admin().is_ok());
        assert!(claims.require_operator_role().is_err());
    }
}
