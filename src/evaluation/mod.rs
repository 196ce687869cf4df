pub mod scenarios;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Activity, Coordinates, PlannedRoute, TripType};

pub use scenarios::default_scenarios;

/// A fixed planning request run repeatedly against the live oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalScenario {
    pub name: String,
    pub origin: Coordinates,
    pub step_goal: u32,
    pub height_m: f64,
    pub trip_type: TripType,
    pub activity: Activity,
}

/// One run of a scenario, reduced to what the report needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub hit: bool,
    pub distance_error_pct: Option<f64>,
    pub overlap_ratio: Option<f64>,
    pub degraded: bool,
    pub oracle_calls: u64,
}

impl RunOutcome {
    pub fn from_route(route: &PlannedRoute, target_m: f64) -> Self {
        RunOutcome {
            hit: route.within_tolerance,
            distance_error_pct: Some(distance_error_pct(route.total_distance_m, target_m)),
            overlap_ratio: route.overlap_ratio,
            degraded: route.is_degraded(),
            oracle_calls: route.trace.oracle_calls,
        }
    }

    /// A failed run. Match failures still report how close the search got.
    pub fn from_error(error: &AppError, target_m: f64) -> Self {
        match error {
            AppError::MatchFailure(failure) => RunOutcome {
                hit: false,
                distance_error_pct: failure
                    .closest_distance_m
                    .map(|d| distance_error_pct(d, target_m)),
                overlap_ratio: None,
                degraded: false,
                oracle_calls: failure.trace.oracle_calls,
            },
            _ => RunOutcome {
                hit: false,
                distance_error_pct: None,
                overlap_ratio: None,
                degraded: false,
                oracle_calls: 0,
            },
        }
    }
}

fn distance_error_pct(distance_m: f64, target_m: f64) -> f64 {
    if target_m <= 0.0 {
        return 0.0;
    }
    (distance_m - target_m).abs() / target_m * 100.0
}

/// Aggregated results for a single scenario across N runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: EvalScenario,
    pub runs: usize,
    pub hit_rate: f64,
    pub distance_error_pct: Option<StatSummary>,
    pub overlap_ratio: Option<StatSummary>,
    pub degraded_count: usize,
    pub mean_oracle_calls: f64,
}

/// Mean and standard deviation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StatSummary {
    pub mean: f64,
    pub std_dev: f64,
}

impl ScenarioResult {
    pub fn from_outcomes(scenario: EvalScenario, outcomes: &[RunOutcome]) -> Self {
        let runs = outcomes.len();
        let hits = outcomes.iter().filter(|o| o.hit).count();
        let errors: Vec<f64> = outcomes.iter().filter_map(|o| o.distance_error_pct).collect();
        let overlaps: Vec<f64> = outcomes.iter().filter_map(|o| o.overlap_ratio).collect();
        let calls: Vec<f64> = outcomes.iter().map(|o| o.oracle_calls as f64).collect();

        ScenarioResult {
            scenario,
            runs,
            hit_rate: if runs == 0 { 0.0 } else { hits as f64 / runs as f64 },
            distance_error_pct: stat_summary(&errors),
            overlap_ratio: stat_summary(&overlaps),
            degraded_count: outcomes.iter().filter(|o| o.degraded).count(),
            mean_oracle_calls: stat_summary(&calls).map(|s| s.mean).unwrap_or(0.0),
        }
    }
}

fn stat_summary(values: &[f64]) -> Option<StatSummary> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = if values.len() > 1 {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };

    Some(StatSummary {
        mean,
        std_dev: variance.sqrt(),
    })
}

/// Format a single scenario result for display
pub fn format_scenario_result(result: &ScenarioResult) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n{} ({} runs, {} steps, {:?} {:?})\n",
        result.scenario.name,
        result.runs,
        result.scenario.step_goal,
        result.scenario.trip_type,
        result.scenario.activity,
    ));
    out.push_str(&format!("  hit_rate:         {:.0}%\n", result.hit_rate * 100.0));

    match result.distance_error_pct {
        Some(err) => out.push_str(&format!(
            "  distance_error:   {:.1}% +/- {:.1}%\n",
            err.mean, err.std_dev,
        )),
        None => out.push_str("  distance_error:   n/a\n"),
    }
    if let Some(overlap) = result.overlap_ratio {
        out.push_str(&format!(
            "  overlap:          {:.2} +/- {:.2}\n",
            overlap.mean, overlap.std_dev,
        ));
    }
    out.push_str(&format!("  degraded:         {}\n", result.degraded_count));
    out.push_str(&format!("  oracle_calls:     {:.1}\n", result.mean_oracle_calls));

    out
}

/// Format the full evaluation report
pub fn format_report(results: &[ScenarioResult], generated_at: &str) -> String {
    let mut report = format!("=== Route Matching Evaluation Report ({}) ===\n", generated_at);

    for result in results {
        report.push_str(&format_scenario_result(result));
    }

    report
}
