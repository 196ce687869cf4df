use crate::models::{Coordinates, RouteCandidate, TripType};
use crate::services::oracle::{RouteOptions, RouteResult, RoutingOracle};
use crate::services::route_matcher::candidates::detour_waypoints;
use crate::services::route_matcher::geometry::{point_along, reversed};
use crate::services::route_matcher::overlap::overlap_ratio;
use crate::services::route_matcher::SearchContext;
use futures::stream::{self, StreamExt};

/// Best return leg found so far for a fixed outbound leg.
/// Starts from the candidate's own return, which is already in the window.
#[derive(Debug)]
pub(super) struct DifferentiationState {
    pub best: RouteCandidate,
    pub evaluated: u32,
    pub oracle_failures: u32,
}

impl DifferentiationState {
    pub fn new(candidate: RouteCandidate) -> Self {
        DifferentiationState {
            best: candidate,
            evaluated: 0,
            oracle_failures: 0,
        }
    }

    pub fn best_overlap(&self) -> f64 {
        self.best.overlap_ratio.unwrap_or(1.0)
    }

    /// Keep `route` as the return leg if it stays in the window and overlaps less
    fn consider(&mut self, route: RouteResult, ctx: &SearchContext<'_>) {
        self.evaluated += 1;

        // No geometry means nothing to compare, not a distinct path
        if route.geometry.is_empty() {
            tracing::debug!(
                return_m = %format!("{:.0}", route.distance_m),
                "Skipping return leg without geometry"
            );
            return;
        }

        if !ctx
            .window
            .is_valid(self.best.outbound_m, route.distance_m, TripType::RoundTrip)
        {
            return;
        }

        let overlap = overlap_ratio(
            &self.best.outbound_geometry,
            &route.geometry,
            ctx.config.overlap_buffer_m,
            ctx.config.overlap_sample_points,
        );

        if overlap < self.best_overlap() {
            tracing::debug!(
                overlap = %format!("{:.2}", overlap),
                return_m = %format!("{:.0}", route.distance_m),
                "Return leg improved: overlap {:.2}",
                overlap
            );
            self.best = self.best.clone().with_return(
                route.geometry,
                route.distance_m,
                route.duration_s,
                Some(overlap),
            );
        }
    }
}

/// Look for a return leg that does not retrace the outbound leg.
///
/// First the oracle's own alternatives for destination→origin, then return
/// legs forced through detour waypoints beside the outbound path, closest to
/// its midpoint first. Stops as soon as a return at or under the acceptable
/// overlap is found; returns whether that happened.
pub(super) async fn run(ctx: &SearchContext<'_>, state: &mut DifferentiationState) -> bool {
    let acceptable = ctx.config.acceptable_overlap;
    let origin = ctx.request.origin;
    let destination = state.best.destination;

    match ctx
        .oracle
        .fetch_route(
            destination,
            origin,
            RouteOptions::with_alternatives(ctx.config.max_alternatives),
        )
        .await
    {
        Ok(routes) => {
            for route in routes {
                state.consider(route, ctx);
            }
        }
        Err(e) => {
            state.oracle_failures += 1;
            tracing::debug!(error = %e, "Alternative return legs unavailable: {}", e);
        }
    }

    if state.best_overlap() <= acceptable {
        return true;
    }

    let waypoints = ordered_detours(
        &state.best.outbound_geometry,
        ctx.config.detour_offset_m(state.best.outbound_m),
        ctx.config.detour_count_per_side,
    );

    tracing::debug!(
        detours = waypoints.len(),
        best_overlap = %format!("{:.2}", state.best_overlap()),
        "Trying {} detour return legs",
        waypoints.len()
    );

    let mut results = stream::iter(waypoints)
        .map(move |waypoint| async move {
            ctx.oracle
                .fetch_route_via(&[destination, waypoint, origin], RouteOptions::single())
                .await
        })
        .buffered(ctx.config.oracle_fanout);

    while let Some(result) = results.next().await {
        match result {
            Ok(routes) => {
                for route in routes {
                    state.consider(route, ctx);
                }
                if state.best_overlap() <= acceptable {
                    return true;
                }
            }
            Err(e) => {
                state.oracle_failures += 1;
                tracing::debug!(error = %e, "Detour return leg failed: {}", e);
            }
        }
    }

    false
}

/// Detour waypoints sorted by distance to the outbound path's midpoint.
/// The sort is stable, so ties keep the left-then-right generation order.
fn ordered_detours(outbound: &[Coordinates], offset_m: f64, count_per_side: usize) -> Vec<Coordinates> {
    let mut waypoints = detour_waypoints(outbound, offset_m, count_per_side);

    if let Some((midpoint, _)) = point_along(outbound, 0.5) {
        waypoints.sort_by(|a, b| {
            a.distance_m(&midpoint)
                .partial_cmp(&b.distance_m(&midpoint))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    waypoints
}

/// Replace the return leg with the outbound leg walked backwards, when the
/// doubled outbound distance fits the window; otherwise keep the oracle's
/// return. Either way the route is flagged as retracing its outbound leg.
pub(super) fn same_path_return(ctx: &SearchContext<'_>, candidate: RouteCandidate) -> RouteCandidate {
    let mut result = if ctx.window.contains(candidate.outbound_m * 2.0) {
        let geometry = reversed(&candidate.outbound_geometry);
        let meters = candidate.outbound_m;
        let seconds = candidate.outbound_duration_s;
        candidate.with_return(geometry, meters, seconds, Some(1.0))
    } else {
        candidate
    };
    result.is_same_path_return = true;
    result
}
