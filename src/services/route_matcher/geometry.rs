use crate::constants::METERS_PER_DEGREE;
use crate::models::Coordinates;

/// Local equirectangular projection around a reference latitude.
/// Distances in the projected plane are meters; accurate at city scale.
#[derive(Debug, Clone, Copy)]
pub struct LocalProjection {
    lng_scale: f64,
}

impl LocalProjection {
    pub fn around(reference_lat: f64) -> Self {
        LocalProjection {
            lng_scale: reference_lat.to_radians().cos(),
        }
    }

    /// Projected (x, y) in meters relative to the origin of the lat/lng grid
    pub fn project(&self, point: &Coordinates) -> (f64, f64) {
        (
            point.lng * self.lng_scale * METERS_PER_DEGREE,
            point.lat * METERS_PER_DEGREE,
        )
    }

    /// Distance from a point to a line segment in projected meters
    pub fn point_to_segment_distance_m(
        &self,
        point: &Coordinates,
        seg_start: &Coordinates,
        seg_end: &Coordinates,
    ) -> f64 {
        let (px, py) = self.project(point);
        let (ax, ay) = self.project(seg_start);
        let (bx, by) = self.project(seg_end);

        let dx = bx - ax;
        let dy = by - ay;
        let len_sq = dx * dx + dy * dy;

        if len_sq < 1e-12 {
            return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
        }

        let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
        let proj_x = ax + t * dx;
        let proj_y = ay + t * dy;

        ((px - proj_x).powi(2) + (py - proj_y).powi(2)).sqrt()
    }

    /// Minimum distance from a point to any segment of a path.
    /// A single-point path degenerates to point distance.
    pub fn distance_to_path_m(&self, point: &Coordinates, path: &[Coordinates]) -> f64 {
        match path.len() {
            0 => f64::INFINITY,
            1 => self.point_to_segment_distance_m(point, &path[0], &path[0]),
            _ => path
                .windows(2)
                .map(|w| self.point_to_segment_distance_m(point, &w[0], &w[1]))
                .fold(f64::INFINITY, f64::min),
        }
    }
}

/// Great-circle length of a polyline in meters
pub fn path_length_m(path: &[Coordinates]) -> f64 {
    path.windows(2).map(|w| w[0].distance_m(&w[1])).sum()
}

/// Point at `fraction` (0..=1) of the path's length, with the index of the
/// segment it lies on. None for empty paths.
pub fn point_along(path: &[Coordinates], fraction: f64) -> Option<(Coordinates, usize)> {
    let first = *path.first()?;
    if path.len() == 1 {
        return Some((first, 0));
    }

    let total = path_length_m(path);
    if total <= 0.0 {
        return Some((first, 0));
    }

    let target = total * fraction.clamp(0.0, 1.0);
    let mut travelled = 0.0;

    for (i, w) in path.windows(2).enumerate() {
        let seg_len = w[0].distance_m(&w[1]);
        if travelled + seg_len >= target && seg_len > 0.0 {
            let t = ((target - travelled) / seg_len).clamp(0.0, 1.0);
            return Some((interpolate(&w[0], &w[1], t), i));
        }
        travelled += seg_len;
    }

    Some((path[path.len() - 1], path.len() - 2))
}

/// `count` points spread evenly by length along the path, endpoints included.
/// A zero-length path yields its single location.
pub fn sample_evenly(path: &[Coordinates], count: usize) -> Vec<Coordinates> {
    if path.is_empty() || count == 0 {
        return Vec::new();
    }
    if count == 1 || path_length_m(path) <= 0.0 {
        return vec![path[0]];
    }

    (0..count)
        .filter_map(|i| point_along(path, i as f64 / (count - 1) as f64).map(|(p, _)| p))
        .collect()
}

/// Linear interpolation in lat/lng space (fine for short segments)
pub fn interpolate(a: &Coordinates, b: &Coordinates, t: f64) -> Coordinates {
    Coordinates {
        lat: a.lat + (b.lat - a.lat) * t,
        lng: a.lng + (b.lng - a.lng) * t,
    }
}

pub fn reversed(path: &[Coordinates]) -> Vec<Coordinates> {
    path.iter().rev().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Vec<Coordinates> {
        vec![
            Coordinates::new(48.8566, 2.3522).unwrap(),
            Coordinates::new(48.8600, 2.3522).unwrap(),
            Coordinates::new(48.8600, 2.3600).unwrap(),
        ]
    }

    #[test]
    fn test_point_to_segment_distance() {
        let proj = LocalProjection::around(48.8566);
        let a = Coordinates::new(48.8566, 2.3522).unwrap();
        let b = Coordinates::new(48.8600, 2.3522).unwrap();

        // Midpoint lies on the segment
        let mid = interpolate(&a, &b, 0.5);
        assert!(proj.point_to_segment_distance_m(&mid, &a, &b) < 1e-6);

        // ~100 m east of the segment
        let east = mid.destination_point(90.0, 100.0);
        let d = proj.point_to_segment_distance_m(&east, &a, &b);
        assert!((d - 100.0).abs() < 1.0, "got {}", d);

        // Beyond the end clamps to the endpoint
        let beyond = b.destination_point(0.0, 50.0);
        let d = proj.point_to_segment_distance_m(&beyond, &a, &b);
        assert!((d - 50.0).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_distance_to_path_edge_cases() {
        let proj = LocalProjection::around(48.8566);
        let p = Coordinates::new(48.8566, 2.3522).unwrap();
        assert!(proj.distance_to_path_m(&p, &[]).is_infinite());
        assert!(proj.distance_to_path_m(&p, &[p]) < 1e-9);
    }

    #[test]
    fn test_path_length() {
        let path = line();
        let expected = path[0].distance_m(&path[1]) + path[1].distance_m(&path[2]);
        assert!((path_length_m(&path) - expected).abs() < 1e-9);
        assert_eq!(path_length_m(&path[..1]), 0.0);
    }

    #[test]
    fn test_point_along_endpoints_and_segment() {
        let path = line();
        let (start, idx) = point_along(&path, 0.0).unwrap();
        assert_eq!(start, path[0]);
        assert_eq!(idx, 0);

        let (end, idx) = point_along(&path, 1.0).unwrap();
        assert!((end.lat - path[2].lat).abs() < 1e-9);
        assert!((end.lng - path[2].lng).abs() < 1e-9);
        assert_eq!(idx, 1);

        assert!(point_along(&[], 0.5).is_none());
    }

    #[test]
    fn test_sample_evenly() {
        let path = line();
        let samples = sample_evenly(&path, 50);
        assert_eq!(samples.len(), 50);
        assert_eq!(samples[0], path[0]);

        let proj = LocalProjection::around(48.8566);
        for s in &samples {
            assert!(proj.distance_to_path_m(s, &path) < 0.01);
        }

        assert!(sample_evenly(&[], 10).is_empty());
        assert_eq!(sample_evenly(&path[..1], 10).len(), 1);
    }

    #[test]
    fn test_reversed() {
        let path = line();
        let rev = reversed(&path);
        assert_eq!(rev[0], path[2]);
        assert_eq!(rev[2], path[0]);
    }
}
