mod adjustment;
pub mod candidates;
mod differentiation;
pub mod geometry;
pub mod overlap;
mod ring_search;

use crate::cache::MemoizedOracle;
use crate::config::MatcherConfig;
use crate::error::{AppError, Result, RoutingError};
use crate::models::{
    Coordinates, MatchFailure, MatchKind, PhaseOutcome, PhaseTrace, PlannedRoute, PlanningRequest,
    RouteCandidate, SearchPhase, SearchTrace, TargetWindow, TripType,
};
use crate::services::metrics;
use crate::services::oracle::{RouteOptions, RouteResult, RoutingOracle};
use std::sync::Arc;
use std::time::Instant;

use differentiation::DifferentiationState;
use overlap::overlap_ratio;
use ring_search::RingSearchState;

/// Outcome of routing a caller-chosen destination
#[derive(Debug, Clone)]
pub enum DestinationVerdict {
    /// Routed inside the window; ready to become the active route
    Valid(Box<PlannedRoute>),
    /// Routable, but the total distance misses the window
    OutOfWindow {
        routed_distance_m: f64,
        window: TargetWindow,
    },
}

/// Finds a destination whose walking distance lands within tolerance of a step goal.
///
/// Stateless between calls: every search gets a fresh oracle memo, and
/// nothing from one request leaks into the next.
pub struct RouteMatcher {
    oracle: Arc<dyn RoutingOracle>,
    config: MatcherConfig,
}

/// Everything the search phases share for one request
struct SearchContext<'a> {
    oracle: &'a MemoizedOracle,
    config: &'a MatcherConfig,
    request: &'a PlanningRequest,
    window: TargetWindow,
}

impl SearchContext<'_> {
    fn trip_type(&self) -> TripType {
        self.request.trip_type
    }

    /// Route origin→destination, plus destination→origin for round-trips
    async fn route_candidate(
        &self,
        destination: Coordinates,
    ) -> std::result::Result<RouteCandidate, RoutingError> {
        let origin = self.request.origin;

        match self.trip_type() {
            TripType::OneWay => {
                let outbound = primary(
                    self.oracle
                        .fetch_route(origin, destination, RouteOptions::single())
                        .await?,
                )?;
                Ok(RouteCandidate::one_way(
                    destination,
                    outbound.geometry,
                    outbound.distance_m,
                    outbound.duration_s,
                ))
            }
            TripType::RoundTrip => {
                let (outbound, back) = futures::try_join!(
                    self.oracle
                        .fetch_route(origin, destination, RouteOptions::single()),
                    self.oracle
                        .fetch_route(destination, origin, RouteOptions::single()),
                )?;
                let outbound = primary(outbound)?;
                let back = primary(back)?;

                // Legs without geometry cannot be shown to differ
                let overlap = if outbound.geometry.is_empty() || back.geometry.is_empty() {
                    1.0
                } else {
                    overlap_ratio(
                        &outbound.geometry,
                        &back.geometry,
                        self.config.overlap_buffer_m,
                        self.config.overlap_sample_points,
                    )
                };

                Ok(RouteCandidate::one_way(
                    destination,
                    outbound.geometry,
                    outbound.distance_m,
                    outbound.duration_s,
                )
                .with_return(back.geometry, back.distance_m, back.duration_s, Some(overlap)))
            }
        }
    }
}

fn primary(routes: Vec<RouteResult>) -> std::result::Result<RouteResult, RoutingError> {
    routes.into_iter().next().ok_or(RoutingError::NoRouteFound)
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

impl RouteMatcher {
    pub fn new(oracle: Arc<dyn RoutingOracle>, config: MatcherConfig) -> Self {
        RouteMatcher { oracle, config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.oracle.backend_name()
    }

    /// Target window for a request under this matcher's tolerance
    pub fn target_window(&self, request: &PlanningRequest) -> Result<TargetWindow> {
        request.validate().map_err(AppError::InvalidInput)?;
        metrics::target_window(request, self.config.distance_tolerance)
    }

    /// Plan a route for the request.
    ///
    /// Ring search first; if nothing lands in the window the closest probe is
    /// rescaled once. Round-trips then get their return leg differentiated
    /// from the outbound leg. Exhaustion yields `AppError::MatchFailure`.
    pub async fn plan_route(&self, request: &PlanningRequest) -> Result<PlannedRoute> {
        let window = self.target_window(request)?;
        let memo = MemoizedOracle::new(self.oracle.clone(), self.config.memo_max_entries);
        let ctx = SearchContext {
            oracle: &memo,
            config: &self.config,
            request,
            window,
        };
        let mut trace = SearchTrace::default();

        tracing::info!(
            trip_type = %request.trip_type,
            step_goal = request.step_goal,
            target_m = %format!("{:.0}", window.target_m),
            backend = self.oracle.backend_name(),
            "Planning {} route: {} steps -> {:.0}m (window {:.0}-{:.0}m)",
            request.trip_type, request.step_goal, window.target_m, window.min_m, window.max_m
        );

        // Phase 1: direct ring search
        let started = Instant::now();
        let mut ring = RingSearchState::default();
        let searched =
            tokio::time::timeout(self.config.ring_search_budget(), ring_search::run(&ctx, &mut ring))
                .await;
        let (hit, outcome) = match searched {
            Ok(Some(candidate)) => (Some(candidate), PhaseOutcome::Matched),
            Ok(None) => (None, PhaseOutcome::Exhausted),
            Err(_) => {
                tracing::warn!(
                    evaluated = ring.evaluated,
                    budget_ms = self.config.ring_search_budget_ms,
                    "Ring search budget of {}ms exhausted after {} probes",
                    self.config.ring_search_budget_ms, ring.evaluated
                );
                (None, PhaseOutcome::TimedOut)
            }
        };
        trace.record(PhaseTrace {
            phase: SearchPhase::RingSearch,
            candidates_evaluated: ring.evaluated,
            oracle_failures: ring.oracle_failures,
            outcome,
            elapsed_ms: elapsed_ms(started),
        });

        let (candidate, match_kind) = match hit {
            Some(candidate) => (candidate, MatchKind::Direct),
            None => {
                // Phase 3: rescale the closest probe once
                let adjusted = self.adjust(&ctx, &ring, &mut trace).await;
                match adjusted {
                    Ok(candidate) => (candidate, MatchKind::Adjusted),
                    Err(closest_m) => {
                        Self::finish_trace(&mut trace, &memo, None);
                        let failure =
                            MatchFailure::new(window, request.trip_type, closest_m, trace);
                        tracing::warn!(
                            evaluated = failure.trace.candidates_evaluated(),
                            closest_m = ?closest_m,
                            "{}",
                            failure
                        );
                        return Err(failure.into());
                    }
                }
            }
        };

        let candidate = if request.trip_type.is_round_trip() {
            self.differentiate(&ctx, candidate, &mut trace).await
        } else {
            candidate
        };

        Self::finish_trace(&mut trace, &memo, candidate.overlap_ratio);
        let route = Self::planned_route(request, &window, candidate, match_kind, trace);

        tracing::info!(
            total_m = %format!("{:.0}", route.total_distance_m),
            match_kind = ?route.match_kind,
            oracle_calls = route.trace.oracle_calls,
            memo_hits = route.trace.memo_hits,
            "Planned {:.0}m {} route ({:?}, {} oracle calls)",
            route.total_distance_m, route.trip_type, route.match_kind, route.trace.oracle_calls
        );
        if route.is_degraded() {
            tracing::warn!(
                same_path = route.is_same_path_return,
                match_kind = ?route.match_kind,
                "Returning degraded match"
            );
        }

        Ok(route)
    }

    /// Route a destination picked by the caller and say whether it fits the window.
    /// Oracle failures surface as `AppError::RoutingOracle`.
    pub async fn evaluate_destination(
        &self,
        request: &PlanningRequest,
        destination: Coordinates,
    ) -> Result<DestinationVerdict> {
        let window = self.target_window(request)?;
        let memo = MemoizedOracle::new(self.oracle.clone(), self.config.memo_max_entries);
        let ctx = SearchContext {
            oracle: &memo,
            config: &self.config,
            request,
            window,
        };
        let mut trace = SearchTrace::default();

        let started = Instant::now();
        let routed = ctx.route_candidate(destination).await;
        let outcome = match &routed {
            Ok(c) if window.contains(c.total_m(request.trip_type)) => PhaseOutcome::Matched,
            _ => PhaseOutcome::Exhausted,
        };
        trace.record(PhaseTrace {
            phase: SearchPhase::ManualSelection,
            candidates_evaluated: 1,
            oracle_failures: u32::from(routed.is_err()),
            outcome,
            elapsed_ms: elapsed_ms(started),
        });

        let candidate = routed?;
        let total = candidate.total_m(request.trip_type);

        if !window.contains(total) {
            tracing::debug!(
                total_m = %format!("{:.0}", total),
                "Manual destination routed to {:.0}m, outside {:.0}-{:.0}m",
                total, window.min_m, window.max_m
            );
            return Ok(DestinationVerdict::OutOfWindow {
                routed_distance_m: total,
                window,
            });
        }

        let candidate = if request.trip_type.is_round_trip() {
            self.differentiate(&ctx, candidate, &mut trace).await
        } else {
            candidate
        };

        Self::finish_trace(&mut trace, &memo, candidate.overlap_ratio);
        Ok(DestinationVerdict::Valid(Box::new(Self::planned_route(
            request,
            &window,
            candidate,
            MatchKind::Manual,
            trace,
        ))))
    }

    /// Rescale the closest ring probe. On failure returns the closest total
    /// distance seen by either phase, if any candidate was routable.
    async fn adjust(
        &self,
        ctx: &SearchContext<'_>,
        ring: &RingSearchState,
        trace: &mut SearchTrace,
    ) -> std::result::Result<RouteCandidate, Option<f64>> {
        let ring_closest_m = ring.closest_distance_m(ctx);
        let Some((probe, closest)) = ring.closest.as_ref() else {
            tracing::warn!("No routable ring probe to adjust from");
            return Err(None);
        };

        let started = Instant::now();
        let result = adjustment::run(ctx, probe, closest).await;
        let mut oracle_failures = 0;

        let (adjusted, closest_m) = match result {
            Ok(Some(candidate)) => {
                let total = candidate.total_m(ctx.trip_type());
                if ctx.window.contains(total) {
                    (Some(candidate), None)
                } else {
                    let nearer = ring_closest_m
                        .filter(|c| ctx.window.missed_by_m(*c) <= ctx.window.missed_by_m(total))
                        .unwrap_or(total);
                    (None, Some(nearer))
                }
            }
            Ok(None) => (None, ring_closest_m),
            Err(e) => {
                oracle_failures = 1;
                tracing::warn!(error = %e, "Adjustment query failed: {}", e);
                (None, ring_closest_m)
            }
        };

        trace.record(PhaseTrace {
            phase: SearchPhase::Adjustment,
            candidates_evaluated: 1,
            oracle_failures,
            outcome: if adjusted.is_some() {
                PhaseOutcome::Matched
            } else {
                PhaseOutcome::Exhausted
            },
            elapsed_ms: elapsed_ms(started),
        });

        adjusted.ok_or(closest_m)
    }

    /// Push the return leg away from the outbound leg, falling back to a
    /// retraced path when nothing differs enough.
    async fn differentiate(
        &self,
        ctx: &SearchContext<'_>,
        candidate: RouteCandidate,
        trace: &mut SearchTrace,
    ) -> RouteCandidate {
        if candidate.overlap_ratio.unwrap_or(0.0) <= self.config.acceptable_overlap {
            return candidate;
        }

        let started = Instant::now();
        let mut state = DifferentiationState::new(candidate);
        let searched = tokio::time::timeout(
            self.config.differentiation_budget(),
            differentiation::run(ctx, &mut state),
        )
        .await;
        let outcome = match searched {
            Ok(true) => PhaseOutcome::Matched,
            Ok(false) => PhaseOutcome::Degraded,
            Err(_) => {
                tracing::warn!(
                    evaluated = state.evaluated,
                    budget_ms = self.config.differentiation_budget_ms,
                    "Differentiation budget exhausted, keeping overlap {:.2}",
                    state.best_overlap()
                );
                PhaseOutcome::TimedOut
            }
        };

        tracing::info!(
            overlap = %format!("{:.2}", state.best_overlap()),
            evaluated = state.evaluated,
            outcome = ?outcome,
            "Return leg differentiation: overlap {:.2} after {} options",
            state.best_overlap(), state.evaluated
        );

        trace.record(PhaseTrace {
            phase: SearchPhase::Differentiation,
            candidates_evaluated: state.evaluated,
            oracle_failures: state.oracle_failures,
            outcome,
            elapsed_ms: elapsed_ms(started),
        });

        if state.best_overlap() < self.config.same_path_overlap {
            return state.best;
        }

        let started = Instant::now();
        let overlap = state.best_overlap();
        let result = differentiation::same_path_return(ctx, state.best);
        tracing::warn!(
            overlap = %format!("{:.2}", overlap),
            reversed = result.overlap_ratio == Some(1.0),
            "No distinct return leg found, falling back to same-path return"
        );
        trace.record(PhaseTrace {
            phase: SearchPhase::SamePathFallback,
            candidates_evaluated: 0,
            oracle_failures: 0,
            outcome: PhaseOutcome::Degraded,
            elapsed_ms: elapsed_ms(started),
        });

        result
    }

    fn finish_trace(trace: &mut SearchTrace, memo: &MemoizedOracle, overlap: Option<f64>) {
        let stats = memo.stats();
        trace.oracle_calls = stats.misses;
        trace.memo_hits = stats.hits;
        trace.final_overlap_ratio = overlap;

        tracing::debug!(
            oracle_calls = stats.misses,
            memo_hits = stats.hits,
            "Oracle memo hit rate {:.1}%",
            stats.hit_rate()
        );
    }

    fn planned_route(
        request: &PlanningRequest,
        window: &TargetWindow,
        candidate: RouteCandidate,
        match_kind: MatchKind,
        trace: SearchTrace,
    ) -> PlannedRoute {
        let trip_type = request.trip_type;
        let total = candidate.total_m(trip_type);
        let summary = metrics::summarize(total, request);

        PlannedRoute {
            destination: candidate.destination,
            trip_type,
            total_distance_m: total,
            total_duration_s: summary.duration_seconds,
            estimated_steps: summary.steps,
            estimated_calories: summary.calories,
            outbound_m: candidate.outbound_m,
            outbound_geometry: candidate.outbound_geometry,
            return_m: trip_type.is_round_trip().then_some(candidate.return_m),
            return_geometry: candidate.return_geometry,
            overlap_ratio: candidate.overlap_ratio,
            is_same_path_return: candidate.is_same_path_return,
            within_tolerance: window.contains(total),
            match_kind,
            trace,
        }
    }
}
