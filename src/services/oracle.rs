use crate::error::RoutingError;
use crate::models::Coordinates;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RouteOptions {
    pub alternatives: bool,
    pub max_alternatives: u32,
}

impl RouteOptions {
    /// Only the primary route
    pub fn single() -> Self {
        RouteOptions::default()
    }

    pub fn with_alternatives(max_alternatives: u32) -> Self {
        RouteOptions {
            alternatives: max_alternatives > 0,
            max_alternatives,
        }
    }
}

/// One path proposed by the routing oracle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteResult {
    pub distance_m: f64,
    pub duration_s: f64,
    pub geometry: Vec<Coordinates>,
}

impl RouteResult {
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }
}

/// Black-box walking directions: "what is the path and distance through these points".
///
/// Implementations make a single attempt per call and never retry; the first
/// element of a successful answer is the primary route, followed by any
/// alternatives.
#[async_trait]
pub trait RoutingOracle: Send + Sync {
    /// Route through an ordered chain of at least two waypoints.
    async fn fetch_route_via(
        &self,
        waypoints: &[Coordinates],
        options: RouteOptions,
    ) -> Result<Vec<RouteResult>, RoutingError>;

    async fn fetch_route(
        &self,
        start: Coordinates,
        end: Coordinates,
        options: RouteOptions,
    ) -> Result<Vec<RouteResult>, RoutingError> {
        self.fetch_route_via(&[start, end], options).await
    }

    fn backend_name(&self) -> &'static str;
}
