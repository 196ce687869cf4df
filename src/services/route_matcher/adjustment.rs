use crate::error::RoutingError;
use crate::models::RouteCandidate;
use crate::services::route_matcher::candidates::RingPoint;
use crate::services::route_matcher::SearchContext;

/// Radius that would have hit the target if distance scaled linearly with it
pub(super) fn rescaled_radius_m(probe_radius_m: f64, target_m: f64, routed_total_m: f64) -> Option<f64> {
    if routed_total_m <= 0.0 || !routed_total_m.is_finite() {
        return None;
    }
    Some(probe_radius_m * target_m / routed_total_m)
}

/// Re-query the closest probe's bearing once at a rescaled radius.
/// `Ok(None)` means the probe gave nothing to scale from.
pub(super) async fn run(
    ctx: &SearchContext<'_>,
    probe: &RingPoint,
    closest: &RouteCandidate,
) -> Result<Option<RouteCandidate>, RoutingError> {
    let current_m = closest.total_m(ctx.trip_type());
    let Some(radius_m) = rescaled_radius_m(probe.radius_m, ctx.window.target_m, current_m) else {
        return Ok(None);
    };

    let destination = ctx
        .request
        .origin
        .destination_point(probe.bearing_deg, radius_m);

    tracing::debug!(
        bearing = %format!("{:.1}", probe.bearing_deg),
        old_radius_m = %format!("{:.0}", probe.radius_m),
        new_radius_m = %format!("{:.0}", radius_m),
        "Adjusting radius {:.0}m -> {:.0}m (closest total {:.0}m)",
        probe.radius_m, radius_m, current_m
    );

    ctx.route_candidate(destination).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescaled_radius() {
        // Routed 20% long: pull the radius in
        let r = rescaled_radius_m(1_000.0, 7_055.0, 8_466.0).unwrap();
        assert!((r - 1_000.0 * 7_055.0 / 8_466.0).abs() < 1e-9);
        assert!(r < 1_000.0);

        // Routed short: push it out
        assert!(rescaled_radius_m(1_000.0, 7_055.0, 5_000.0).unwrap() > 1_000.0);

        assert_eq!(rescaled_radius_m(1_000.0, 7_055.0, 0.0), None);
        assert_eq!(rescaled_radius_m(1_000.0, 7_055.0, f64::NAN), None);
    }
}
