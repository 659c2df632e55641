pub mod auth;
pub mod error;
pub mod feedback;
pub mod session;
pub mod users;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/admin", auth::admin_router(state.clone()))
        .nest("/api/executive", auth::executive_router(state.clone()))
        .nest("/api/feedback", feedback::router(state.clone()))
        .nest("/api/users", users::router(state))
}
