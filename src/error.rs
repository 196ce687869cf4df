use crate::models::MatchFailure;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure of a single routing oracle request.
///
/// The adapter makes exactly one attempt; callers decide whether to skip,
/// retry or surface the error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("No route found between the requested points")]
    NoRouteFound,

    #[error("Routing service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Routing service rate limit exceeded")]
    RateLimited,

    #[error("Invalid routing request: {0}")]
    InvalidRequest(String),
}

impl RoutingError {
    /// Errors that will repeat for the same request and can be memoized.
    pub fn is_deterministic(&self) -> bool {
        matches!(
            self,
            RoutingError::NoRouteFound | RoutingError::InvalidRequest(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Routing oracle error: {0}")]
    RoutingOracle(#[from] RoutingError),

    #[error("{0}")]
    MatchFailure(Box<MatchFailure>),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<MatchFailure> for AppError {
    fn from(failure: MatchFailure) -> Self {
        AppError::MatchFailure(Box::new(failure))
    }
}

// Convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match self {
            AppError::InvalidInput(ref e) => (StatusCode::BAD_REQUEST, e.clone(), None),
            AppError::RoutingOracle(ref e) => {
                tracing::error!("Routing oracle error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Routing service error".to_string(),
                    None,
                )
            }
            AppError::MatchFailure(ref failure) => {
                tracing::warn!("Route matching failed: {}", failure);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    failure.to_string(),
                    serde_json::to_value(failure.as_ref()).ok(),
                )
            }
            AppError::NotFound(ref e) => (StatusCode::NOT_FOUND, e.clone(), None),
        };

        let mut body = json!({
            "error": status.canonical_reason().unwrap_or("Unknown error"),
            "message": error_message,
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
