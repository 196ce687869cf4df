use crate::models::Coordinates;
use crate::services::route_matcher::geometry::{sample_evenly, LocalProjection};

/// Share of `candidate` that runs within `buffer_m` of `reference`, in [0, 1].
///
/// Up to `sample_points` points are spread evenly by length along the
/// candidate; each one counts when it lies within the buffer of any reference
/// segment. Either path being empty gives 0.0.
pub fn overlap_ratio(
    reference: &[Coordinates],
    candidate: &[Coordinates],
    buffer_m: f64,
    sample_points: usize,
) -> f64 {
    if reference.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    let samples = sample_evenly(candidate, sample_points);
    if samples.is_empty() {
        return 0.0;
    }

    let projection = LocalProjection::around(reference[0].lat);
    let overlapping = samples
        .iter()
        .filter(|p| projection.distance_to_path_m(p, reference) <= buffer_m)
        .count();

    overlapping as f64 / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_OVERLAP_BUFFER_M, DEFAULT_OVERLAP_SAMPLE_POINTS};
    use crate::services::route_matcher::geometry::reversed;

    fn score(reference: &[Coordinates], candidate: &[Coordinates]) -> f64 {
        overlap_ratio(
            reference,
            candidate,
            DEFAULT_OVERLAP_BUFFER_M,
            DEFAULT_OVERLAP_SAMPLE_POINTS,
        )
    }

    fn l_shaped() -> Vec<Coordinates> {
        let a = Coordinates::new(48.8566, 2.3522).unwrap();
        let b = a.destination_point(0.0, 800.0);
        let c = b.destination_point(90.0, 600.0);
        vec![a, b, c]
    }

    #[test]
    fn test_identical_paths_fully_overlap() {
        let path = l_shaped();
        assert_eq!(score(&path, &path), 1.0);
    }

    #[test]
    fn test_reversed_path_fully_overlaps() {
        let path = l_shaped();
        assert_eq!(score(&path, &reversed(&path)), 1.0);
    }

    #[test]
    fn test_disjoint_paths_do_not_overlap() {
        let path = l_shaped();
        let shifted: Vec<Coordinates> = path
            .iter()
            .map(|p| p.destination_point(180.0, 2_000.0))
            .collect();
        assert_eq!(score(&path, &shifted), 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        // Candidate shares the first leg, then diverges west
        let path = l_shaped();
        let candidate = vec![path[0], path[1], path[1].destination_point(270.0, 800.0)];
        let ratio = score(&path, &candidate);
        assert!(ratio > 0.4 && ratio < 0.65, "ratio {}", ratio);
    }

    #[test]
    fn test_buffer_width_matters() {
        let path = l_shaped();
        let northbound = &path[..2];
        let parallel: Vec<Coordinates> = northbound
            .iter()
            .map(|p| p.destination_point(270.0, 10.0))
            .collect();
        assert!(overlap_ratio(northbound, &parallel, 15.0, 50) > 0.99);
        assert!(overlap_ratio(northbound, &parallel, 5.0, 50) < 0.01);
    }

    #[test]
    fn test_empty_inputs() {
        let path = l_shaped();
        assert_eq!(score(&[], &path), 0.0);
        assert_eq!(score(&path, &[]), 0.0);
        assert_eq!(score(&[], &[]), 0.0);
    }

    #[test]
    fn test_result_in_unit_interval() {
        let path = l_shaped();
        let other = vec![path[0], path[2]];
        let ratio = score(&path, &other);
        assert!((0.0..=1.0).contains(&ratio));
    }
}
