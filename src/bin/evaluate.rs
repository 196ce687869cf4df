use std::env;
use std::sync::Arc;
use steproute::config::Config;
use steproute::evaluation::{
    default_scenarios, format_report, EvalScenario, RunOutcome, ScenarioResult,
};
use steproute::models::{Pace, PlanningRequest};
use steproute::services::mapbox::{AuthMode, MapboxClient};
use steproute::services::oracle::RoutingOracle;
use steproute::services::route_matcher::RouteMatcher;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_help() {
    eprintln!(
        "\
Usage: evaluate [OPTIONS]

Options:
  --scenario=FILTER     Only run scenarios whose name contains FILTER
  --runs=N              Number of runs per scenario (default: 3)
  --json                Output results as JSON
  --help                Show this help message"
    );
}

fn planning_request(scenario: &EvalScenario) -> PlanningRequest {
    PlanningRequest {
        origin: scenario.origin,
        step_goal: scenario.step_goal,
        height_m: scenario.height_m,
        weight_kg: 70.0,
        pace: Pace::Moderate,
        trip_type: scenario.trip_type,
        activity: scenario.activity,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (less verbose for eval)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "steproute=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI args
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help") {
        print_help();
        return Ok(());
    }

    let scenario_filter = args.iter().find_map(|a| a.strip_prefix("--scenario="));
    let runs: usize = args
        .iter()
        .find_map(|a| a.strip_prefix("--runs="))
        .and_then(|s| s.parse().ok())
        .unwrap_or(3)
        .max(1);
    let json_output = args.iter().any(|a| a == "--json");

    let config = Config::from_env().map_err(|e| format!("Config error: {}", e))?;

    let oracle: Arc<dyn RoutingOracle> = if let Some(ref base_url) = config.mapbox_base_url {
        Arc::new(MapboxClient::with_config(
            config.mapbox_api_key.clone(),
            base_url.clone(),
            AuthMode::BearerHeader,
        ))
    } else {
        Arc::new(MapboxClient::new(config.mapbox_api_key.clone()))
    };
    let matcher = RouteMatcher::new(oracle, config.matcher.clone());

    // Select scenarios
    let all_scenarios = default_scenarios();
    let scenarios: Vec<&EvalScenario> = if let Some(filter) = scenario_filter {
        all_scenarios
            .iter()
            .filter(|s| s.name.contains(filter))
            .collect()
    } else {
        all_scenarios.iter().collect()
    };

    if scenarios.is_empty() {
        eprintln!("No scenarios matched filter. Available:");
        for s in &all_scenarios {
            eprintln!("  {}", s.name);
        }
        std::process::exit(1);
    }

    eprintln!(
        "Running {} scenarios x {} runs each...",
        scenarios.len(),
        runs
    );

    let mut results = Vec::new();

    for scenario in &scenarios {
        let request = planning_request(scenario);
        let window = matcher.target_window(&request)?;
        let mut outcomes = Vec::with_capacity(runs);

        for run in 0..runs {
            eprintln!("  {} (run {}/{})", scenario.name, run + 1, runs);

            let outcome = match matcher.plan_route(&request).await {
                Ok(route) => RunOutcome::from_route(&route, window.target_m),
                Err(e) => {
                    eprintln!("    Failed: {}", e);
                    RunOutcome::from_error(&e, window.target_m)
                }
            };
            outcomes.push(outcome);
        }

        results.push(ScenarioResult::from_outcomes((*scenario).clone(), &outcomes));
    }

    let generated_at = OffsetDateTime::now_utc().format(&Rfc3339)?;

    if json_output {
        let report = serde_json::json!({
            "generated_at": generated_at,
            "backend": matcher.backend_name(),
            "runs": runs,
            "scenarios": results,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_report(&results, &generated_at));
    }

    Ok(())
}
