use crate::constants::{MAPBOX_MAX_ALTERNATIVES, MAPBOX_MAX_WAYPOINTS};
use crate::error::RoutingError;
use crate::models::{Activity, Coordinates};
use crate::services::oracle::{RouteOptions, RouteResult, RoutingOracle};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

const MAPBOX_DIRECTIONS_BASE_URL: &str = "https://api.mapbox.com/directions/v5/mapbox";

/// How the client authenticates with the directions API.
#[derive(Clone, Debug)]
pub enum AuthMode {
    /// Current default: send `access_token` query param (direct Mapbox).
    DirectToken,
    /// Proxy mode: send `Authorization: Bearer` header.
    BearerHeader,
}

#[derive(Clone)]
pub struct MapboxClient {
    client: Client,
    api_key: String,
    base_url: String,
    auth_mode: AuthMode,
    profile: String,
}

impl MapboxClient {
    pub fn new(api_key: String) -> Self {
        MapboxClient {
            client: Client::new(),
            api_key,
            base_url: MAPBOX_DIRECTIONS_BASE_URL.to_string(),
            auth_mode: AuthMode::DirectToken,
            profile: Activity::Walk.mapbox_profile().to_string(),
        }
    }

    pub fn with_config(api_key: String, base_url: String, auth_mode: AuthMode) -> Self {
        MapboxClient {
            client: Client::new(),
            api_key,
            base_url,
            auth_mode,
            profile: Activity::Walk.mapbox_profile().to_string(),
        }
    }

    fn directions_url(&self, waypoints: &[Coordinates]) -> String {
        // Format coordinates as "lng,lat;lng,lat;..."
        let coordinates_str = waypoints
            .iter()
            .map(|c| format!("{},{}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!("{}/{}/{}", self.base_url, self.profile, coordinates_str)
    }
}

#[async_trait]
impl RoutingOracle for MapboxClient {
    /// Get walking directions through the waypoints, optionally with alternatives.
    /// One HTTP attempt; failures are classified, never retried.
    async fn fetch_route_via(
        &self,
        waypoints: &[Coordinates],
        options: RouteOptions,
    ) -> Result<Vec<RouteResult>, RoutingError> {
        if waypoints.len() < 2 {
            return Err(RoutingError::InvalidRequest(
                "At least 2 waypoints required".to_string(),
            ));
        }

        if waypoints.len() > MAPBOX_MAX_WAYPOINTS {
            return Err(RoutingError::InvalidRequest(format!(
                "Maximum {} waypoints allowed",
                MAPBOX_MAX_WAYPOINTS
            )));
        }

        let url = self.directions_url(waypoints);

        tracing::debug!(
            waypoints = waypoints.len(),
            alternatives = options.alternatives,
            "Mapbox API request: {} waypoints, profile {}",
            waypoints.len(),
            self.profile
        );

        let mut request = self.client.get(&url).query(&[
            ("geometries", "geojson"),
            ("overview", "full"),
            ("steps", "false"),
            (
                "alternatives",
                if options.alternatives { "true" } else { "false" },
            ),
        ]);

        match self.auth_mode {
            AuthMode::DirectToken => {
                request = request.query(&[("access_token", &self.api_key)]);
            }
            AuthMode::BearerHeader => {
                request = request.bearer_auth(&self.api_key);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| RoutingError::ServiceUnavailable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                status = %status,
                waypoints = waypoints.len(),
                "Mapbox API HTTP error {}: {}",
                status, error_text
            );
            return Err(classify_failure(status, &error_text));
        }

        let directions: MapboxDirectionsApiResponse = response.json().await.map_err(|e| {
            RoutingError::ServiceUnavailable(format!("Failed to parse response: {}", e))
        })?;

        let max_alternatives = options.max_alternatives.min(MAPBOX_MAX_ALTERNATIVES) as usize;
        let routes = convert_routes(directions, options.alternatives, max_alternatives)?;

        tracing::debug!(
            routes = routes.len(),
            distance_km = %format!("{:.2}", routes[0].distance_km()),
            path_points = routes[0].geometry.len(),
            "Mapbox response: {} route(s), primary {:.2}km",
            routes.len(),
            routes[0].distance_km()
        );

        Ok(routes)
    }

    fn backend_name(&self) -> &'static str {
        "mapbox"
    }
}

/// Map a non-success HTTP answer onto the oracle error taxonomy
fn classify_failure(status: StatusCode, body: &str) -> RoutingError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return RoutingError::RateLimited;
    }
    if status.is_server_error() {
        return RoutingError::ServiceUnavailable(format!("HTTP {}", status));
    }

    let code = serde_json::from_str::<MapboxErrorBody>(body)
        .ok()
        .and_then(|b| b.code)
        .unwrap_or_default();

    match code.as_str() {
        "NoRoute" | "NoSegment" => RoutingError::NoRouteFound,
        _ => RoutingError::InvalidRequest(format!("HTTP {}: {}", status, body)),
    }
}

/// Convert the API payload, keeping the primary route plus up to `max_alternatives`
fn convert_routes(
    directions: MapboxDirectionsApiResponse,
    alternatives: bool,
    max_alternatives: usize,
) -> Result<Vec<RouteResult>, RoutingError> {
    if directions.code != "Ok" || directions.routes.is_empty() {
        tracing::debug!(code = %directions.code, "Mapbox returned no usable routes");
        return Err(RoutingError::NoRouteFound);
    }

    let keep = if alternatives { 1 + max_alternatives } else { 1 };

    Ok(directions
        .routes
        .into_iter()
        .take(keep)
        .map(|route| RouteResult {
            distance_m: route.distance,
            duration_s: route.duration,
            geometry: route
                .geometry
                .coordinates
                .iter()
                .filter_map(|coord| Coordinates::new(coord[1], coord[0]).ok())
                .collect(),
        })
        .collect())
}

// Mapbox API response types

#[derive(Debug, Deserialize)]
struct MapboxDirectionsApiResponse {
    #[serde(default)]
    routes: Vec<MapboxRoute>,
    code: String,
}

#[derive(Debug, Deserialize)]
struct MapboxRoute {
    distance: f64, // meters
    duration: f64, // seconds
    geometry: MapboxGeometry,
}

#[derive(Debug, Deserialize)]
struct MapboxGeometry {
    coordinates: Vec<[f64; 2]>, // [lng, lat] pairs
}

#[derive(Debug, Deserialize)]
struct MapboxErrorBody {
    code: Option<String>,
}
