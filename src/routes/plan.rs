use crate::error::{AppError, Result};
use crate::models::{PlanResponse, PlanningRequest, SessionView};
use crate::services::session::PlanningSession;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// POST /plans
/// Plan the default route for a step goal and open a selection session around it
pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlanningRequest>,
) -> Result<Json<PlanResponse>> {
    request.validate().map_err(AppError::InvalidInput)?;

    tracing::info!(
        lat = request.origin.lat,
        lng = request.origin.lng,
        step_goal = request.step_goal,
        trip_type = %request.trip_type,
        activity = %request.activity,
        "Plan request: ({:.4}, {:.4}), {} steps, {}, {}",
        request.origin.lat, request.origin.lng,
        request.step_goal, request.trip_type, request.activity
    );

    let session = PlanningSession::start(&state.matcher, request, &state.selection).await?;
    let response = PlanResponse {
        session_id: session.id(),
        route: session.active_route().clone(),
        selection: session.selection(),
    };
    state.sessions.insert(session).await;

    Ok(Json(response))
}

/// GET /plans/{id}
pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    let shared = state.sessions.get(&id).await?;
    let session = shared.lock().await;

    Ok(Json(SessionView {
        session_id: session.id(),
        request: session.request().clone(),
        active_route: session.active_route().clone(),
        default_route: session.default_route().clone(),
        selection: session.selection(),
    }))
}
