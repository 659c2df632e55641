use crate::db::{self, NewFeedback};
use crate::domain::models::{Feedback, FeedbackStatus, Satisfaction};
use crate::state::SharedState;
use crate::web::error::ApiError;
use crate::web::session::UserSession;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackPayload {
    #[serde(default)]
    pub call_id: String,
    #[serde(default)]
    pub citizen_mobile: String,
    #[serde(default)]
    pub citizen_name: String,
    #[serde(default)]
    pub query_type: String,
    #[serde(default)]
    pub satisfaction: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub submitted_by: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusPayload {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub feedback: Feedback,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    pub total: i64,
    pub pending: i64,
    pub resolved: i64,
    pub satisfied: i64,
    pub not_satisfied: i64,
    pub satisfaction_rate: f64,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_feedback).post(create_feedback).put(update_status))
        .route("/stats", get(get_stats))
        .with_state(state)
}

/// Checks a submission field by field and derives the status when the
/// submitter did not set one.
fn validate_payload(payload: CreateFeedbackPayload) -> Result<NewFeedback, ApiError> {
    let call_id = payload.call_id.trim().to_string();
    if call_id.is_empty() {
        return Err(ApiError::Validation("Call ID is required".to_string()));
    }

    let citizen_mobile = payload.citizen_mobile.trim().to_string();
    if citizen_mobile.is_empty() {
        return Err(ApiError::Validation(
            "Citizen mobile is required".to_string(),
        ));
    }
    if citizen_mobile.len() != 10 || !citizen_mobile.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::Validation(
            "Citizen mobile must be exactly 10 digits".to_string(),
        ));
    }

    let citizen_name = payload.citizen_name.trim().to_string();
    if citizen_name.is_empty() {
        return Err(ApiError::Validation("Citizen name is required".to_string()));
    }

    if payload.satisfaction.is_empty() {
        return Err(ApiError::Validation(
            "Satisfaction is required".to_string(),
        ));
    }
    let satisfaction: Satisfaction = payload.satisfaction.parse().map_err(|_| {
        ApiError::Validation(
            "Satisfaction must be either 'satisfied' or 'not-satisfied'".to_string(),
        )
    })?;

    let description = payload.description.trim().to_string();
    if description.is_empty() {
        return Err(ApiError::Validation("Description is required".to_string()));
    }

    let submitted_by = payload.submitted_by.trim().to_string();
    if submitted_by.is_empty() {
        return Err(ApiError::Validation(
            "Submitter identifier is required".to_string(),
        ));
    }

    let status = match payload.status.as_deref() {
        Some(raw) => raw.parse().map_err(|_| {
            ApiError::Validation("Status must be either 'pending' or 'resolved'".to_string())
        })?,
        None => satisfaction.default_status(),
    };

    Ok(NewFeedback {
        call_id,
        citizen_mobile,
        citizen_name,
        query_type: payload.query_type.trim().to_string(),
        satisfaction,
        description,
        submitted_by,
        submitted_at: payload.submitted_at.unwrap_or_else(Utc::now),
        status,
    })
}

async fn list_feedback(
    UserSession(_claims): UserSession,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Feedback>>, ApiError> {
    let status = match params.status.as_deref() {
        Some(raw) => Some(raw.parse::<FeedbackStatus>().map_err(|_| {
            ApiError::Validation("Status must be either 'pending' or 'resolved'".to_string())
        })?),
        None => None,
    };
    let search = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let records = db::list_feedback(&state.pool, status, search).await?;
    Ok(Json(records))
}

async fn create_feedback(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<CreateFeedbackPayload>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    claims.require_operator_role()?;

    let record = validate_payload(payload)?;

    let stored = match db::insert_feedback(&state.pool, &record).await {
        Ok(stored) => stored,
        Err(e) if db::is_unique_violation(&e) => {
            return Err(ApiError::Conflict("Call ID already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        "Feedback {} recorded by {} (status {:?})",
        stored.call_id,
        stored.submitted_by,
        stored.status
    );

    Ok(Json(FeedbackResponse {
        success: true,
        feedback: stored,
    }))
}

async fn update_status(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    claims.require_admin()?;

    let id = Uuid::parse_str(payload.id.trim())
        .map_err(|_| ApiError::Validation("Invalid feedback id".to_string()))?;
    let status: FeedbackStatus = payload.status.parse().map_err(|_| {
        ApiError::Validation("Status must be either 'pending' or 'resolved'".to_string())
    })?;

    let updated = db::update_feedback_status(&state.pool, id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Feedback not found".to_string()))?;

    tracing::info!("Feedback {} set to {:?}", updated.call_id, updated.status);

    Ok(Json(FeedbackResponse {
        success: true,
        feedback: updated,
    }))
}

async fn get_stats(
    UserSession(claims): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<FeedbackStats>, ApiError> {
    claims.require_admin()?;

    let counts = db::feedback_counts(&state.pool).await?;
    Ok(Json(FeedbackStats {
        total: counts.total,
        pending: counts.pending,
        resolved: counts.resolved,
        satisfied: counts.satisfied,
        not_satisfied: counts.total - counts.satisfied,
        satisfaction_rate: satisfaction_rate(counts.satisfied, counts.total),
    }))
}

fn satisfaction_rate(satisfied: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (satisfied as f64 / total as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> CreateFeedbackPayload {
        CreateFeedbackPayload {
            call_id: "CG100".to_string(),
            citizen_mobile: "9876500000".to_string(),
            citizen_name: "A".to_string(),
            query_type: "X".to_string(),
            satisfaction: "satisfied".to_string(),
            description: "ok".to_string(),
            submitted_by: "E1".to_string(),
            submitted_at: None,
            status: None,
        }
    }

    #[test]
    fn valid_submission_passes_and_derives_resolved() {
        let record = validate_payload(valid_payload()).unwrap();
        assert_eq!(record.satisfaction, Satisfaction::Satisfied);
        assert_eq!(record.status, FeedbackStatus::Resolved);
        assert_eq!(record.call_id, "CG100");
    }

    #[test]
    fn not_satisfied_defaults_to_pending() {
        let mut payload = valid_payload();
        payload.satisfaction = "not-satisfied".to_string();
        let record = validate_payload(payload).unwrap();
        assert_eq!(record.status, FeedbackStatus::Pending);
    }

    #[test]
    fn explicit_status_overrides_the_derivation() {
        let mut payload = valid_payload();
        payload.status = Some("pending".to_string());
        let record = validate_payload(payload).unwrap();
        assert_eq!(record.status, FeedbackStatus::Pending);
    }

    #[test]
    fn nine_digit_mobile_is_rejected_with_the_requirement() {
        let mut payload = valid_payload();
        payload.citizen_mobile = "987650000".to_string();
        let err = validate_payload(payload).unwrap_err();
        assert!(matches!(&err, ApiError::Validation(_)));
        assert!(err.to_string().contains("10 digits"));
    }

    #[test]
    fn eleven_digit_and_non_numeric_mobiles_are_rejected() {
        let mut payload = valid_payload();
        payload.citizen_mobile = "98765000001".to_string();
        assert!(validate_payload(payload).is_err());

        let mut payload = valid_payload();
        payload.citizen_mobile = "98765abc00".to_string();
        assert!(validate_payload(payload).is_err());
    }

    #[test]
    fn unknown_satisfaction_value_is_rejected() {
        let mut payload = valid_payload();
        payload.satisfaction = "maybe".to_string();
        let err = validate_payload(payload).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn each_required_field_is_enforced() {
        for field in ["call_id", "citizen_mobile", "citizen_name", "satisfaction", "description", "submitted_by"] {
            let mut payload = valid_payload();
            match field {
                "call_id" => payload.call_id = String::new(),
                "citizen_mobile" => payload.citizen_mobile = String::new(),
                "citizen_name" => payload.citizen_name = "   ".to_string(),
                "satisfaction" => payload.satisfaction = String::new(),
                "description" => payload.description = String::new(),
                "submitted_by" => payload.submitted_by = String::new(),
                _ => unreachable!(),
            }
            assert!(
                matches!(validate_payload(payload), Err(ApiError::Validation(_))),
                "missing {field} should fail validation"
            );
        }
    }

    #[test]
    fn query_type_is_optional() {
        let mut payload = valid_payload();
        payload.query_type = String::new();
        assert!(validate_payload(payload).is_ok());
    }

    #[test]
    fn malformed_status_is_rejected() {
        let mut payload = valid_payload();
        payload.status = Some("done".to_string());
        assert!(matches!(
            validate_payload(payload),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn satisfaction_rate_handles_the_empty_store() {
        assert_eq!(satisfaction_rate(0, 0), 0.0);
        assert_eq!(satisfaction_rate(1, 2), 50.0);
        assert_eq!(satisfaction_rate(3, 3), 100.0);
    }
}
