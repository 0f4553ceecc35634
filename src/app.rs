use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/branches", get(handlers::get_branches))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/reload", post(handlers::reload))
        .with_state(state)
}
