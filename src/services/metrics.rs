//! Step, distance, duration and calorie conversions.
//!
//! Everything here is pure: identical inputs always produce bit-identical
//! outputs, so a default route recomputed from the same request is stable.

use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::{Activity, Pace, PlanningRequest, TargetWindow};
use serde::{Deserialize, Serialize};

/// Estimated stride length in meters for the given height and activity.
pub fn stride_meters(height_m: f64, activity: Activity) -> Result<f64> {
    if !height_m.is_finite() || height_m <= 0.0 {
        return Err(AppError::InvalidInput(format!(
            "height must be positive, got {}",
            height_m
        )));
    }

    let ratio = match activity {
        Activity::Walk => STRIDE_HEIGHT_RATIO_WALK,
        Activity::Run => STRIDE_HEIGHT_RATIO_RUN,
    };
    Ok(ratio * height_m)
}

/// Stride length, falling back to the documented default when height is unusable.
pub fn stride_or_default(height_m: Option<f64>, activity: Activity) -> f64 {
    height_m
        .and_then(|h| stride_meters(h, activity).ok())
        .unwrap_or(match activity {
            Activity::Walk => DEFAULT_STRIDE_WALK_M,
            Activity::Run => DEFAULT_STRIDE_RUN_M,
        })
}

pub fn steps_for_distance(distance_m: f64, stride_m: f64) -> u32 {
    (distance_m / stride_m).round() as u32
}

/// Travel speed in km/h for a pace. Only running changes the fast end of the table.
pub fn speed_kmh(pace: Pace, activity: Activity) -> f64 {
    match (pace, activity) {
        (Pace::Slow, _) => SPEED_SLOW_KMH,
        (Pace::Moderate, _) => SPEED_MODERATE_KMH,
        (Pace::Fast, Activity::Walk) => SPEED_FAST_KMH,
        (Pace::Fast, Activity::Run) => SPEED_FAST_RUN_KMH,
    }
}

pub fn duration_seconds(distance_m: f64, pace: Pace, activity: Activity) -> f64 {
    let meters_per_second = speed_kmh(pace, activity) * 1000.0 / 3600.0;
    distance_m / meters_per_second
}

pub fn calories(distance_km: f64, weight_kg: f64, pace: Pace) -> f64 {
    let coefficient = match pace {
        Pace::Slow => CALORIE_COEFFICIENT_SLOW,
        Pace::Moderate => CALORIE_COEFFICIENT_MODERATE,
        Pace::Fast => CALORIE_COEFFICIENT_FAST,
    };
    distance_km * weight_kg * coefficient
}

/// Target distance window for a request: `step_goal × stride`, ± tolerance.
pub fn target_window(request: &PlanningRequest, tolerance: f64) -> Result<TargetWindow> {
    let stride = stride_meters(request.height_m, request.activity)?;
    Ok(TargetWindow::new(request.step_goal as f64 * stride, tolerance))
}

/// Derived figures shown alongside a route
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ActivitySummary {
    pub duration_seconds: f64,
    pub steps: u32,
    pub calories: u32,
}

impl ActivitySummary {
    pub fn for_distance(distance_m: f64, request: &PlanningRequest) -> Self {
        let stride = stride_or_default(Some(request.height_m), request.activity);
        ActivitySummary {
            duration_seconds: duration_seconds(distance_m, request.pace, request.activity).round(),
            steps: steps_for_distance(distance_m, stride),
            calories: calories(distance_m / 1000.0, request.weight_kg, request.pace).round() as u32,
        }
    }

    pub fn duration_minutes(&self) -> u32 {
        (self.duration_seconds / 60.0).round() as u32
    }
}

/// Steps, duration and calories for a finished route of `distance_m`
pub fn summarize(distance_m: f64, request: &PlanningRequest) -> ActivitySummary {
    ActivitySummary::for_distance(distance_m, request)
}
