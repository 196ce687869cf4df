use crate::error::{AppError, Result};
use crate::models::{DestinationRequest, ResetResponse, SelectionResponse};
use crate::services::session::SelectionOutcome;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// POST /plans/{id}/destination
/// Propose a manually picked destination. Rejections are a normal 200 answer.
pub async fn propose_destination(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<DestinationRequest>,
) -> Result<Json<SelectionResponse>> {
    request.validate().map_err(AppError::InvalidInput)?;

    let shared = state.sessions.get(&id).await?;
    let mut session = shared.lock().await;

    let outcome = session
        .propose_manual_destination(&state.matcher, request.destination)
        .await?;

    let response = match outcome {
        SelectionOutcome::Accepted(route) => SelectionResponse {
            accepted: true,
            route: Some(*route),
            rejection: None,
            selection: session.selection(),
        },
        SelectionOutcome::Rejected(rejection) => SelectionResponse {
            accepted: false,
            route: None,
            rejection: Some(rejection),
            selection: session.selection(),
        },
    };

    Ok(Json(response))
}

/// POST /plans/{id}/reset
/// Restore the default route and reset the attempt limiter
pub async fn reset_selection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResetResponse>> {
    let shared = state.sessions.get(&id).await?;
    let mut session = shared.lock().await;

    let route = session.reset_selection().clone();
    tracing::info!(session_id = %id, "Selection reset to default route");

    Ok(Json(ResetResponse {
        route,
        selection: session.selection(),
    }))
}
