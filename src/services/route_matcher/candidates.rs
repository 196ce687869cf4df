use crate::models::coordinates::normalize_bearing;
use crate::models::Coordinates;
use crate::services::route_matcher::geometry::{path_length_m, point_along};

/// A destination placed on the search ring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingPoint {
    pub bearing_deg: f64,
    pub radius_m: f64,
    pub destination: Coordinates,
}

/// Evenly spaced points on a circle of `radius_m` around `center`.
/// Bearing i is `offset + i·360/count`, normalized to [0, 360).
pub fn ring_candidates(
    center: &Coordinates,
    radius_m: f64,
    bearing_count: usize,
    bearing_offset_deg: f64,
) -> Vec<RingPoint> {
    if bearing_count == 0 {
        return Vec::new();
    }

    let step = 360.0 / bearing_count as f64;

    (0..bearing_count)
        .map(|i| {
            let bearing_deg = normalize_bearing(bearing_offset_deg + i as f64 * step);
            RingPoint {
                bearing_deg,
                radius_m,
                destination: center.destination_point(bearing_deg, radius_m),
            }
        })
        .collect()
}

/// Waypoints pushed sideways off a reference path, used to force a
/// different return leg.
///
/// Samples `count_per_side` interior points at fractions k/(count+1) of the
/// path's length. For each one the bearing of the containing segment gives
/// the local direction, and the left (−90°) then right (+90°) offsets are
/// emitted. Degenerate paths (fewer than two points, or zero length) give
/// nothing.
pub fn detour_waypoints(
    reference_path: &[Coordinates],
    offset_m: f64,
    count_per_side: usize,
) -> Vec<Coordinates> {
    if reference_path.len() < 2 || count_per_side == 0 || path_length_m(reference_path) <= 0.0 {
        return Vec::new();
    }

    let mut waypoints = Vec::with_capacity(count_per_side * 2);

    for k in 1..=count_per_side {
        let fraction = k as f64 / (count_per_side + 1) as f64;
        let Some((anchor, segment)) = point_along(reference_path, fraction) else {
            continue;
        };

        let seg_start = reference_path[segment];
        let seg_end = reference_path[segment + 1];
        // Zero-length segments carry no direction
        if seg_start.distance_m(&seg_end) <= 0.0 {
            continue;
        }
        let heading = seg_start.bearing_to(&seg_end);

        waypoints.push(anchor.destination_point(normalize_bearing(heading - 90.0), offset_m));
        waypoints.push(anchor.destination_point(normalize_bearing(heading + 90.0), offset_m));
    }

    waypoints
}
