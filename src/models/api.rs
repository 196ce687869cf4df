use crate::models::{AttemptState, Coordinates, PlannedRoute, PlanningRequest, SelectionRejection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response to `POST /plans`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub session_id: Uuid,
    pub route: PlannedRoute,
    pub selection: AttemptState,
}

/// Response to `GET /plans/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub request: PlanningRequest,
    pub active_route: PlannedRoute,
    pub default_route: PlannedRoute,
    pub selection: AttemptState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationRequest {
    pub destination: Coordinates,
}

impl DestinationRequest {
    pub fn validate(&self) -> Result<(), String> {
        Coordinates::new(self.destination.lat, self.destination.lng).map(|_| ())
    }
}

/// Response to `POST /plans/{id}/destination`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<PlannedRoute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<SelectionRejection>,
    pub selection: AttemptState,
}

/// Response to `POST /plans/{id}/reset`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub route: PlannedRoute,
    pub selection: AttemptState,
}
