pub mod debug;
pub mod plan;
pub mod selection;

use axum::{routing::{get, post}, Router};
use std::sync::Arc;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/plans", post(plan::create_plan))
        .route("/plans/{id}", get(plan::get_plan))
        .route("/plans/{id}/destination", post(selection::propose_destination))
        .route("/plans/{id}/reset", post(selection::reset_selection))
        .route("/debug/health", get(debug::health_check))
        .with_state(state)
}
