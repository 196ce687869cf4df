use crate::models::{Coordinates, RouteCandidate};
use crate::services::route_matcher::candidates::{ring_candidates, RingPoint};
use crate::services::route_matcher::SearchContext;
use futures::stream::{self, StreamExt};

/// Running tally of the ring search, kept outside the timed future so a
/// budget expiry still leaves the best-so-far available.
#[derive(Debug, Default)]
pub(super) struct RingSearchState {
    pub evaluated: u32,
    pub oracle_failures: u32,
    /// Probe whose total came closest to the target, hit or not
    pub closest: Option<(RingPoint, RouteCandidate)>,
}

impl RingSearchState {
    fn consider(&mut self, probe: RingPoint, candidate: RouteCandidate, ctx: &SearchContext<'_>) {
        let error = (candidate.total_m(ctx.trip_type()) - ctx.window.target_m).abs();
        let is_closer = match &self.closest {
            Some((_, best)) => error < (best.total_m(ctx.trip_type()) - ctx.window.target_m).abs(),
            None => true,
        };
        if is_closer {
            self.closest = Some((probe, candidate));
        }
    }

    pub fn closest_distance_m(&self, ctx: &SearchContext<'_>) -> Option<f64> {
        self.closest
            .as_ref()
            .map(|(_, candidate)| candidate.total_m(ctx.trip_type()))
    }
}

/// Every probe in its fixed evaluation order: bearing count, then ring angle,
/// then radius nudge (0, −step, +step, …).
pub(super) fn probe_plan(
    origin: &Coordinates,
    base_radius_m: f64,
    bearing_counts: &[usize],
    tolerance_factors: &[f64],
) -> Vec<RingPoint> {
    let mut probes = Vec::new();

    for &count in bearing_counts {
        let rings: Vec<Vec<RingPoint>> = tolerance_factors
            .iter()
            .map(|factor| ring_candidates(origin, base_radius_m * (1.0 + factor), count, 0.0))
            .collect();

        for i in 0..count {
            probes.extend(rings.iter().map(|ring| ring[i]));
        }
    }

    probes
}

/// Walk the probe plan until one lands in the window.
///
/// Oracle calls run concurrently up to the fanout, but results are consumed
/// in plan order so the returned hit does not depend on response timing.
/// Returning early drops the stream and cancels whatever is still in flight.
pub(super) async fn run(
    ctx: &SearchContext<'_>,
    state: &mut RingSearchState,
) -> Option<RouteCandidate> {
    let probes = probe_plan(
        &ctx.request.origin,
        ctx.window.search_radius_m(ctx.trip_type()),
        &ctx.config.bearing_counts,
        &ctx.config.tolerance_factors(),
    );

    tracing::debug!(
        probes = probes.len(),
        radius_m = %format!("{:.0}", ctx.window.search_radius_m(ctx.trip_type())),
        "Ring search: {} probes planned",
        probes.len()
    );

    let mut results = stream::iter(probes)
        .map(move |probe| async move {
            let result = ctx.route_candidate(probe.destination).await;
            (probe, result)
        })
        .buffered(ctx.config.oracle_fanout);

    while let Some((probe, result)) = results.next().await {
        state.evaluated += 1;

        match result {
            Ok(candidate) => {
                let total = candidate.total_m(ctx.trip_type());
                tracing::debug!(
                    bearing = %format!("{:.1}", probe.bearing_deg),
                    radius_m = %format!("{:.0}", probe.radius_m),
                    total_m = %format!("{:.0}", total),
                    "Probe at {:.1}° / {:.0}m routed to {:.0}m",
                    probe.bearing_deg, probe.radius_m, total
                );

                if ctx.window.contains(total) {
                    return Some(candidate);
                }
                state.consider(probe, candidate, ctx);
            }
            Err(e) => {
                state.oracle_failures += 1;
                tracing::debug!(
                    bearing = %format!("{:.1}", probe.bearing_deg),
                    error = %e,
                    "Probe at {:.1}° failed, skipping",
                    probe.bearing_deg
                );
            }
        }
    }

    None
}
