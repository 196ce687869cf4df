use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use steproute::config::{MatcherConfig, SelectionConfig};
use steproute::error::RoutingError;
use steproute::models::{Activity, Coordinates, Pace, PlanningRequest, TripType};
use steproute::services::oracle::{RouteOptions, RouteResult, RoutingOracle};
use steproute::services::route_matcher::geometry::{interpolate, path_length_m};
use steproute::services::route_matcher::RouteMatcher;
use steproute::services::session::SessionStore;
use steproute::AppState;

/// Deterministic stand-in for the directions service.
///
/// Paths follow the straight line through the waypoints, stretched by
/// `circuity`. Every answer depends only on the waypoints, so repeated runs
/// see identical distances regardless of call order or latency.
#[allow(dead_code)]
pub struct FakeOracle {
    pub circuity: f64,
    /// Ignore intermediate waypoints, so every return leg retraces the outbound
    pub straight_only: bool,
    /// Fail every query with `NoRouteFound`
    pub unroutable: bool,
    /// Fail queries whose end point is farther than this from the start
    pub max_reach_m: Option<f64>,
    /// Sleep a waypoint-dependent number of milliseconds before answering
    pub jitter_ms: u64,
    /// Fixed latency added to every answer
    pub latency_ms: u64,
    /// Distance grows as `length² / scale` instead of linearly
    pub quadratic_scale_m: Option<f64>,
    /// Alternatives bend sideways through the midpoint by this many meters
    pub alternative_offset_m: Option<f64>,
    /// Routes answered to alternatives requests carry no geometry
    pub blank_alternatives: bool,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeOracle {
    pub fn new(circuity: f64) -> Self {
        FakeOracle {
            circuity,
            straight_only: false,
            unroutable: false,
            max_reach_m: None,
            jitter_ms: 0,
            latency_ms: 0,
            quadratic_scale_m: None,
            alternative_offset_m: None,
            blank_alternatives: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn quadratic(scale_m: f64) -> Self {
        FakeOracle {
            quadratic_scale_m: Some(scale_m),
            ..Self::new(1.0)
        }
    }

    pub fn straight_only() -> Self {
        FakeOracle {
            straight_only: true,
            ..Self::new(1.0)
        }
    }

    pub fn unroutable() -> Self {
        FakeOracle {
            unroutable: true,
            ..Self::new(1.0)
        }
    }

    pub fn with_jitter(mut self, jitter_ms: u64) -> Self {
        self.jitter_ms = jitter_ms;
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_sideways_alternative(mut self, offset_m: f64) -> Self {
        self.alternative_offset_m = Some(offset_m);
        self
    }

    pub fn with_blank_alternatives(mut self) -> Self {
        self.blank_alternatives = true;
        self
    }

    pub fn with_max_reach(mut self, max_reach_m: f64) -> Self {
        self.max_reach_m = Some(max_reach_m);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn delay_for(&self, waypoints: &[Coordinates]) -> Duration {
        let fixed = Duration::from_millis(self.latency_ms);
        if self.jitter_ms == 0 {
            return fixed;
        }
        let seed: i64 = waypoints
            .iter()
            .map(|c| (c.lat * 1e5) as i64 + (c.lng * 1e5) as i64)
            .sum();
        fixed + Duration::from_millis(seed.unsigned_abs() % (self.jitter_ms + 1))
    }

    fn route_along(&self, path: Vec<Coordinates>) -> RouteResult {
        let length_m = path_length_m(&path);
        let distance_m = match self.quadratic_scale_m {
            Some(scale) => length_m * length_m / scale,
            None => length_m * self.circuity,
        };
        RouteResult {
            distance_m,
            duration_s: distance_m / 1.4,
            geometry: path,
        }
    }
}

#[async_trait]
impl RoutingOracle for FakeOracle {
    async fn fetch_route_via(
        &self,
        waypoints: &[Coordinates],
        options: RouteOptions,
    ) -> Result<Vec<RouteResult>, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delay_for(waypoints);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.unroutable || waypoints.len() < 2 {
            return Err(RoutingError::NoRouteFound);
        }
        let start = waypoints[0];
        let end = waypoints[waypoints.len() - 1];
        if let Some(reach) = self.max_reach_m {
            if start.distance_m(&end) > reach {
                return Err(RoutingError::NoRouteFound);
            }
        }

        let path = if self.straight_only {
            vec![start, end]
        } else {
            waypoints.to_vec()
        };
        let primary = self.route_along(path);
        let mut routes = vec![primary.clone()];

        if options.alternatives {
            match self.alternative_offset_m {
                Some(offset_m) => {
                    let bend = interpolate(&start, &end, 0.5)
                        .destination_point(start.bearing_to(&end) + 90.0, offset_m);
                    routes.push(self.route_along(vec![start, bend, end]));
                }
                // Same path, slightly longer
                None => {
                    for i in 0..options.max_alternatives.min(2) {
                        routes.push(RouteResult {
                            distance_m: primary.distance_m * (1.0 + 0.02 * (i + 1) as f64),
                            ..primary.clone()
                        });
                    }
                }
            }
            if self.blank_alternatives {
                for route in &mut routes {
                    route.geometry.clear();
                }
            }
        }
        Ok(routes)
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }
}

/// 10 000 steps at 1.70 m walking: target 7055 m, window 6702.25-7407.75 m
#[allow(dead_code)]
pub fn paris_request(trip_type: TripType) -> PlanningRequest {
    PlanningRequest {
        origin: Coordinates::new(48.8566, 2.3522).unwrap(),
        step_goal: 10_000,
        height_m: 1.70,
        weight_kg: 70.0,
        pace: Pace::Moderate,
        trip_type,
        activity: Activity::Walk,
    }
}

#[allow(dead_code)]
pub fn matcher_with(oracle: Arc<FakeOracle>, config: MatcherConfig) -> RouteMatcher {
    RouteMatcher::new(oracle, config)
}

#[allow(dead_code)]
pub fn test_state(oracle: Arc<FakeOracle>, selection: SelectionConfig) -> Arc<AppState> {
    Arc::new(AppState {
        matcher: RouteMatcher::new(oracle, MatcherConfig::default()),
        sessions: SessionStore::new(60, 100),
        selection,
    })
}

/// Check if we should skip real API tests
#[allow(dead_code)]
pub fn should_skip_real_api_tests() -> bool {
    std::env::var("SKIP_REAL_API_TESTS").is_ok() || std::env::var("MAPBOX_API_KEY").is_err()
}
