use crate::models::{Coordinates, SearchTrace, TargetWindow, TripType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A destination and its routed legs, produced while searching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteCandidate {
    pub destination: Coordinates,
    pub outbound_geometry: Vec<Coordinates>,
    pub return_geometry: Option<Vec<Coordinates>>,
    pub outbound_m: f64,
    pub return_m: f64,
    pub outbound_duration_s: f64,
    pub return_duration_s: f64,
    /// Overlap of the return leg against the outbound leg (round-trips only)
    pub overlap_ratio: Option<f64>,
    pub is_same_path_return: bool,
}

impl RouteCandidate {
    pub fn one_way(destination: Coordinates, geometry: Vec<Coordinates>, meters: f64, seconds: f64) -> Self {
        RouteCandidate {
            destination,
            outbound_geometry: geometry,
            return_geometry: None,
            outbound_m: meters,
            return_m: 0.0,
            outbound_duration_s: seconds,
            return_duration_s: 0.0,
            overlap_ratio: None,
            is_same_path_return: false,
        }
    }

    pub fn with_return(
        mut self,
        geometry: Vec<Coordinates>,
        meters: f64,
        seconds: f64,
        overlap_ratio: Option<f64>,
    ) -> Self {
        self.return_geometry = Some(geometry);
        self.return_m = meters;
        self.return_duration_s = seconds;
        self.overlap_ratio = overlap_ratio;
        self
    }

    /// Distance that validation applies to for the given trip shape
    pub fn total_m(&self, trip_type: TripType) -> f64 {
        match trip_type {
            TripType::OneWay => self.outbound_m,
            TripType::RoundTrip => self.outbound_m + self.return_m,
        }
    }
}

/// How the final route was obtained
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Found by the ring search inside the tolerance window
    Direct,
    /// Found by rescaling the closest candidate
    Adjusted,
    /// Destination chosen by the user
    Manual,
}

/// The engine's answer to a planning request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedRoute {
    pub destination: Coordinates,
    pub trip_type: TripType,
    pub total_distance_m: f64,
    pub total_duration_s: f64,
    pub estimated_steps: u32,
    pub estimated_calories: u32,
    pub outbound_m: f64,
    pub outbound_geometry: Vec<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_geometry: Option<Vec<Coordinates>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlap_ratio: Option<f64>,
    pub is_same_path_return: bool,
    pub within_tolerance: bool,
    pub match_kind: MatchKind,
    pub trace: SearchTrace,
}

impl PlannedRoute {
    /// Valid but obtained through a fallback the caller must surface
    pub fn is_degraded(&self) -> bool {
        self.is_same_path_return || self.match_kind == MatchKind::Adjusted
    }
}

/// Search exhausted every strategy without landing in the window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchFailure {
    pub window: TargetWindow,
    pub trip_type: TripType,
    /// Closest summed distance any candidate reached, if any was routable
    pub closest_distance_m: Option<f64>,
    pub missed_by_m: Option<f64>,
    pub trace: SearchTrace,
}

impl MatchFailure {
    pub fn new(
        window: TargetWindow,
        trip_type: TripType,
        closest_distance_m: Option<f64>,
        trace: SearchTrace,
    ) -> Self {
        MatchFailure {
            window,
            trip_type,
            closest_distance_m,
            missed_by_m: closest_distance_m.map(|d| window.missed_by_m(d)),
            trace,
        }
    }
}

impl fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No {} route within {:.0}-{:.0}m",
            self.trip_type, self.window.min_m, self.window.max_m
        )?;
        match (self.closest_distance_m, self.missed_by_m) {
            (Some(closest), Some(missed)) => write!(
                f,
                " (closest: {:.0}m, missed by {:.0}m)",
                closest, missed
            ),
            _ => write!(f, " (no routable candidate)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_total_per_trip_type() {
        let origin = Coordinates::new(48.8566, 2.3522).unwrap();
        let dest = Coordinates::new(48.8666, 2.3522).unwrap();
        let candidate = RouteCandidate::one_way(dest, vec![origin, dest], 1_200.0, 900.0)
            .with_return(vec![dest, origin], 1_300.0, 950.0, Some(0.2));

        assert_eq!(candidate.total_m(TripType::OneWay), 1_200.0);
        assert_eq!(candidate.total_m(TripType::RoundTrip), 2_500.0);
        assert_eq!(candidate.overlap_ratio, Some(0.2));
    }

    #[test]
    fn test_match_failure_display() {
        let window = TargetWindow::new(1_000.0, 0.05);
        let failure = MatchFailure::new(window, TripType::OneWay, Some(1_200.0), SearchTrace::default());
        assert!((failure.missed_by_m.unwrap() - 150.0).abs() < 1e-6);
        let message = failure.to_string();
        assert!(message.contains("950-1050m"), "{}", message);
        assert!(message.contains("missed by 150m"), "{}", message);

        let failure = MatchFailure::new(window, TripType::RoundTrip, None, SearchTrace::default());
        assert_eq!(failure.missed_by_m, None);
        assert!(failure.to_string().contains("no routable candidate"));
    }
}
