use crate::evaluation::EvalScenario;
use crate::models::{Activity, Coordinates, TripType};

fn scenario(
    name: &str,
    lat: f64,
    lon: f64,
    step_goal: u32,
    trip_type: TripType,
    activity: Activity,
) -> Option<EvalScenario> {
    Some(EvalScenario {
        name: name.to_string(),
        origin: Coordinates::new(lat, lon).ok()?,
        step_goal,
        height_m: 1.70,
        trip_type,
        activity,
    })
}

/// Default evaluation scenarios covering dense cities, a moderate town and a
/// sparse rural network, across both trip types and activities
pub fn default_scenarios() -> Vec<EvalScenario> {
    [
        // --- Paris (dense grid) ---
        scenario("paris_10k_one_way_walk", 48.8566, 2.3522, 10_000, TripType::OneWay, Activity::Walk),
        scenario("paris_10k_round_trip_walk", 48.8566, 2.3522, 10_000, TripType::RoundTrip, Activity::Walk),
        scenario("paris_6k_round_trip_run", 48.8566, 2.3522, 6_000, TripType::RoundTrip, Activity::Run),
        // --- Monaco (steep, constrained) ---
        scenario("monaco_5k_round_trip_walk", 43.7384, 7.4246, 5_000, TripType::RoundTrip, Activity::Walk),
        // --- Prague (river crossings) ---
        scenario("prague_8k_one_way_walk", 50.0755, 14.4378, 8_000, TripType::OneWay, Activity::Walk),
        // --- Rennes (moderate city) ---
        scenario("rennes_12k_round_trip_walk", 48.1173, -1.6778, 12_000, TripType::RoundTrip, Activity::Walk),
        // --- Rural Brittany (sparse network, exercises adjustment and same-path fallback) ---
        scenario("bretagne_rural_8k_round_trip_walk", 48.28, -3.57, 8_000, TripType::RoundTrip, Activity::Walk),
        scenario("bretagne_rural_15k_one_way_run", 48.28, -3.57, 15_000, TripType::OneWay, Activity::Run),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenarios_cover_both_trip_types() {
        let scenarios = default_scenarios();
        assert_eq!(scenarios.len(), 8);
        assert!(scenarios.iter().any(|s| s.trip_type == TripType::OneWay));
        assert!(scenarios.iter().any(|s| s.trip_type == TripType::RoundTrip));
        assert!(scenarios.iter().any(|s| s.activity == Activity::Run));
    }
}
