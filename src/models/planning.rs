use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    #[default]
    Walk,
    Run,
}

impl Activity {
    /// Returns the Mapbox profile name for this activity.
    /// Mapbox has no running profile, so both use the pedestrian network.
    pub fn mapbox_profile(&self) -> &str {
        match self {
            Activity::Walk | Activity::Run => "walking",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Walk => write!(f, "walk"),
            Activity::Run => write!(f, "run"),
        }
    }
}

impl FromStr for Activity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "walk" | "walking" => Ok(Activity::Walk),
            "run" | "running" => Ok(Activity::Run),
            _ => Err(format!("Invalid activity: '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Slow,
    #[default]
    Moderate,
    Fast,
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pace::Slow => write!(f, "slow"),
            Pace::Moderate => write!(f, "moderate"),
            Pace::Fast => write!(f, "fast"),
        }
    }
}

impl FromStr for Pace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "slow" => Ok(Pace::Slow),
            "moderate" | "normal" => Ok(Pace::Moderate),
            "fast" => Ok(Pace::Fast),
            _ => Err(format!("Invalid pace: '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    #[default]
    OneWay,
    RoundTrip,
}

impl TripType {
    pub fn is_round_trip(&self) -> bool {
        matches!(self, TripType::RoundTrip)
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripType::OneWay => write!(f, "one_way"),
            TripType::RoundTrip => write!(f, "round_trip"),
        }
    }
}

impl FromStr for TripType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "one_way" | "oneway" => Ok(TripType::OneWay),
            "round_trip" | "roundtrip" | "loop" => Ok(TripType::RoundTrip),
            _ => Err(format!("Invalid trip type: '{}'", s)),
        }
    }
}

/// Everything the matcher needs to plan one outing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningRequest {
    pub origin: Coordinates,
    pub step_goal: u32,
    pub height_m: f64,
    pub weight_kg: f64,
    #[serde(default)]
    pub pace: Pace,
    #[serde(default)]
    pub trip_type: TripType,
    #[serde(default)]
    pub activity: Activity,
}

impl PlanningRequest {
    pub fn validate(&self) -> Result<(), String> {
        Coordinates::new(self.origin.lat, self.origin.lng)?;
        if self.step_goal == 0 {
            return Err("step_goal must be greater than 0".to_string());
        }
        if !(self.height_m.is_finite() && self.height_m > 0.0) {
            return Err("height_m must be a positive number".to_string());
        }
        if !(self.weight_kg.is_finite() && self.weight_kg > 0.0) {
            return Err("weight_kg must be a positive number".to_string());
        }
        Ok(())
    }
}

/// Accepted distance range around the target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TargetWindow {
    pub target_m: f64,
    pub min_m: f64,
    pub max_m: f64,
}

impl TargetWindow {
    /// Window of `target_m × (1 ∓ tolerance)`
    pub fn new(target_m: f64, tolerance: f64) -> Self {
        TargetWindow {
            target_m,
            min_m: target_m * (1.0 - tolerance),
            max_m: target_m * (1.0 + tolerance),
        }
    }

    pub fn contains(&self, distance_m: f64) -> bool {
        (self.min_m..=self.max_m).contains(&distance_m)
    }

    /// Validation predicate shared by every phase: one-way checks the single
    /// leg, round-trip checks the summed legs.
    pub fn is_valid(&self, outbound_m: f64, return_m: f64, trip_type: TripType) -> bool {
        match trip_type {
            TripType::OneWay => self.contains(outbound_m),
            TripType::RoundTrip => self.contains(outbound_m + return_m),
        }
    }

    /// Per-leg radius used to place candidate destinations
    pub fn search_radius_m(&self, trip_type: TripType) -> f64 {
        match trip_type {
            TripType::OneWay => self.target_m,
            TripType::RoundTrip => self.target_m / 2.0,
        }
    }

    /// How far `distance_m` lies outside the window (0 when inside)
    pub fn missed_by_m(&self, distance_m: f64) -> f64 {
        if distance_m < self.min_m {
            self.min_m - distance_m
        } else if distance_m > self.max_m {
            distance_m - self.max_m
        } else {
            0.0
        }
    }
}
