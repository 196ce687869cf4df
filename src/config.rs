use crate::constants::*;
use crate::models::{AttemptCounting, ResetMode};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub mapbox_api_key: String,
    /// Set to route through a directions proxy (bearer auth) instead of Mapbox
    pub mapbox_base_url: Option<String>,
    pub session_ttl_seconds: u64,
    pub session_max_entries: u64,
    pub matcher: MatcherConfig,
    pub selection: SelectionConfig,
}

#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Accepted deviation from the target distance (0.05 = ±5%)
    pub distance_tolerance: f64,

    /// Ring densities tried in order; each is a full circle of probes
    pub bearing_counts: Vec<usize>,

    /// Radius nudge between probes at the same bearing (fraction of the base radius)
    pub tolerance_step: f64,

    /// Largest radius nudge tried
    pub max_tolerance_factor: f64,

    /// Distance (m) within which a return-leg sample counts as retracing the outbound leg
    pub overlap_buffer_m: f64,

    /// Points sampled along the return leg when scoring overlap
    pub overlap_sample_points: usize,

    /// Overlap at or below which a return leg is accepted as distinct
    pub acceptable_overlap: f64,

    /// Overlap at or above which the return is treated as the same path
    pub same_path_overlap: f64,

    /// Alternatives requested for the return leg during differentiation
    pub max_alternatives: u32,

    /// Detour offset as a fraction of the outbound distance, clamped to min/max
    pub detour_offset_ratio: f64,
    pub detour_min_offset_m: f64,
    pub detour_max_offset_m: f64,

    /// Detour waypoints generated on each side of the outbound path
    pub detour_count_per_side: usize,

    /// Maximum concurrent oracle calls within one search
    pub oracle_fanout: usize,

    pub ring_search_budget_ms: u64,
    pub differentiation_budget_ms: u64,

    /// Capacity of the per-search oracle memo
    pub memo_max_entries: u64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            distance_tolerance: DEFAULT_DISTANCE_TOLERANCE,
            bearing_counts: DEFAULT_BEARING_COUNTS.to_vec(),
            tolerance_step: DEFAULT_TOLERANCE_STEP,
            max_tolerance_factor: DEFAULT_MAX_TOLERANCE_FACTOR,
            overlap_buffer_m: DEFAULT_OVERLAP_BUFFER_M,
            overlap_sample_points: DEFAULT_OVERLAP_SAMPLE_POINTS,
            acceptable_overlap: DEFAULT_ACCEPTABLE_OVERLAP,
            same_path_overlap: DEFAULT_SAME_PATH_OVERLAP,
            max_alternatives: DEFAULT_MAX_ALTERNATIVES,
            detour_offset_ratio: DEFAULT_DETOUR_OFFSET_RATIO,
            detour_min_offset_m: DEFAULT_DETOUR_MIN_OFFSET_M,
            detour_max_offset_m: DEFAULT_DETOUR_MAX_OFFSET_M,
            detour_count_per_side: DEFAULT_DETOUR_COUNT_PER_SIDE,
            oracle_fanout: DEFAULT_ORACLE_FANOUT,
            ring_search_budget_ms: DEFAULT_RING_SEARCH_BUDGET_MS,
            differentiation_budget_ms: DEFAULT_DIFFERENTIATION_BUDGET_MS,
            memo_max_entries: DEFAULT_MEMO_MAX_ENTRIES,
        }
    }
}

impl MatcherConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let config = Self {
            distance_tolerance: env::var("ROUTE_DISTANCE_TOLERANCE")
                .unwrap_or_else(|_| defaults.distance_tolerance.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_DISTANCE_TOLERANCE")?,

            bearing_counts: match env::var("ROUTE_BEARING_COUNTS") {
                Ok(raw) => parse_usize_list(&raw)
                    .map_err(|_| "Invalid ROUTE_BEARING_COUNTS (expected e.g. 16,20,24)")?,
                Err(_) => defaults.bearing_counts,
            },

            tolerance_step: env::var("ROUTE_TOLERANCE_STEP")
                .unwrap_or_else(|_| defaults.tolerance_step.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_TOLERANCE_STEP")?,

            max_tolerance_factor: env::var("ROUTE_MAX_TOLERANCE_FACTOR")
                .unwrap_or_else(|_| defaults.max_tolerance_factor.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_MAX_TOLERANCE_FACTOR")?,

            overlap_buffer_m: env::var("ROUTE_OVERLAP_BUFFER_M")
                .unwrap_or_else(|_| defaults.overlap_buffer_m.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_OVERLAP_BUFFER_M")?,

            overlap_sample_points: env::var("ROUTE_OVERLAP_SAMPLE_POINTS")
                .unwrap_or_else(|_| defaults.overlap_sample_points.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_OVERLAP_SAMPLE_POINTS")?,

            acceptable_overlap: env::var("ROUTE_ACCEPTABLE_OVERLAP")
                .unwrap_or_else(|_| defaults.acceptable_overlap.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_ACCEPTABLE_OVERLAP")?,

            same_path_overlap: env::var("ROUTE_SAME_PATH_OVERLAP")
                .unwrap_or_else(|_| defaults.same_path_overlap.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_SAME_PATH_OVERLAP")?,

            max_alternatives: env::var("ROUTE_MAX_ALTERNATIVES")
                .unwrap_or_else(|_| defaults.max_alternatives.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_MAX_ALTERNATIVES")?,

            detour_offset_ratio: env::var("ROUTE_DETOUR_OFFSET_RATIO")
                .unwrap_or_else(|_| defaults.detour_offset_ratio.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_DETOUR_OFFSET_RATIO")?,

            detour_min_offset_m: env::var("ROUTE_DETOUR_MIN_OFFSET_M")
                .unwrap_or_else(|_| defaults.detour_min_offset_m.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_DETOUR_MIN_OFFSET_M")?,

            detour_max_offset_m: env::var("ROUTE_DETOUR_MAX_OFFSET_M")
                .unwrap_or_else(|_| defaults.detour_max_offset_m.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_DETOUR_MAX_OFFSET_M")?,

            detour_count_per_side: env::var("ROUTE_DETOUR_COUNT_PER_SIDE")
                .unwrap_or_else(|_| defaults.detour_count_per_side.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_DETOUR_COUNT_PER_SIDE")?,

            oracle_fanout: env::var("ROUTE_ORACLE_FANOUT")
                .unwrap_or_else(|_| defaults.oracle_fanout.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_ORACLE_FANOUT")?,

            ring_search_budget_ms: env::var("ROUTE_RING_SEARCH_BUDGET_MS")
                .unwrap_or_else(|_| defaults.ring_search_budget_ms.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_RING_SEARCH_BUDGET_MS")?,

            differentiation_budget_ms: env::var("ROUTE_DIFFERENTIATION_BUDGET_MS")
                .unwrap_or_else(|_| defaults.differentiation_budget_ms.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_DIFFERENTIATION_BUDGET_MS")?,

            memo_max_entries: env::var("ROUTE_MEMO_MAX_ENTRIES")
                .unwrap_or_else(|_| defaults.memo_max_entries.to_string())
                .parse()
                .map_err(|_| "Invalid ROUTE_MEMO_MAX_ENTRIES")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("ROUTE_DISTANCE_TOLERANCE", self.distance_tolerance),
            ("ROUTE_TOLERANCE_STEP", self.tolerance_step),
            ("ROUTE_MAX_TOLERANCE_FACTOR", self.max_tolerance_factor),
            ("ROUTE_OVERLAP_BUFFER_M", self.overlap_buffer_m),
            ("ROUTE_ACCEPTABLE_OVERLAP", self.acceptable_overlap),
            ("ROUTE_SAME_PATH_OVERLAP", self.same_path_overlap),
            ("ROUTE_DETOUR_OFFSET_RATIO", self.detour_offset_ratio),
            ("ROUTE_DETOUR_MIN_OFFSET_M", self.detour_min_offset_m),
            ("ROUTE_DETOUR_MAX_OFFSET_M", self.detour_max_offset_m),
        ] {
            if !value.is_finite() {
                return Err(format!("{} must be a finite number, got {}", name, value));
            }
        }

        if !(self.distance_tolerance > 0.0 && self.distance_tolerance < 1.0) {
            return Err("ROUTE_DISTANCE_TOLERANCE must be between 0 and 1".to_string());
        }
        if self.bearing_counts.is_empty() || self.bearing_counts.contains(&0) {
            return Err("ROUTE_BEARING_COUNTS must list positive counts".to_string());
        }
        if self.tolerance_step <= 0.0 {
            return Err("ROUTE_TOLERANCE_STEP must be positive".to_string());
        }
        // Radii are base × (1 ± factor); a factor of 1 collapses the inner ring
        if !(0.0..1.0).contains(&self.max_tolerance_factor) {
            return Err("ROUTE_MAX_TOLERANCE_FACTOR must be in [0, 1)".to_string());
        }
        if self.overlap_buffer_m < 0.0 {
            return Err("ROUTE_OVERLAP_BUFFER_M must not be negative".to_string());
        }
        if self.detour_offset_ratio < 0.0 {
            return Err("ROUTE_DETOUR_OFFSET_RATIO must not be negative".to_string());
        }
        if self.detour_min_offset_m < 0.0 {
            return Err("ROUTE_DETOUR_MIN_OFFSET_M must not be negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.acceptable_overlap)
            || !(0.0..=1.0).contains(&self.same_path_overlap)
            || self.acceptable_overlap > self.same_path_overlap
        {
            return Err(
                "Overlap thresholds must satisfy 0 <= ROUTE_ACCEPTABLE_OVERLAP <= ROUTE_SAME_PATH_OVERLAP <= 1"
                    .to_string(),
            );
        }
        if self.detour_min_offset_m > self.detour_max_offset_m {
            return Err(
                "ROUTE_DETOUR_MIN_OFFSET_M must not exceed ROUTE_DETOUR_MAX_OFFSET_M".to_string(),
            );
        }
        if self.oracle_fanout == 0 {
            return Err("ROUTE_ORACLE_FANOUT must be at least 1".to_string());
        }
        if self.overlap_sample_points == 0 {
            return Err("ROUTE_OVERLAP_SAMPLE_POINTS must be at least 1".to_string());
        }
        Ok(())
    }

    /// Radius nudges in probe order: 0 first, then −step, +step, −2·step, …
    pub fn tolerance_factors(&self) -> Vec<f64> {
        let steps = (self.max_tolerance_factor / self.tolerance_step + 1e-9).floor() as usize;
        let mut factors = Vec::with_capacity(steps * 2 + 1);
        factors.push(0.0);
        for i in 1..=steps {
            let factor = i as f64 * self.tolerance_step;
            factors.push(-factor);
            factors.push(factor);
        }
        factors
    }

    /// Sideways distance for detour waypoints, scaled to the outbound leg
    pub fn detour_offset_m(&self, outbound_m: f64) -> f64 {
        (outbound_m * self.detour_offset_ratio)
            .clamp(self.detour_min_offset_m, self.detour_max_offset_m)
    }

    pub fn ring_search_budget(&self) -> Duration {
        Duration::from_millis(self.ring_search_budget_ms)
    }

    pub fn differentiation_budget(&self) -> Duration {
        Duration::from_millis(self.differentiation_budget_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionConfig {
    pub max_attempts: u32,
    pub reset_mode: ResetMode,
    pub attempt_counting: AttemptCounting,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_SELECTION_ATTEMPTS,
            reset_mode: ResetMode::default(),
            attempt_counting: AttemptCounting::default(),
        }
    }
}

impl SelectionConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let max_attempts: u32 = env::var("SELECTION_MAX_ATTEMPTS")
            .unwrap_or_else(|_| defaults.max_attempts.to_string())
            .parse()
            .map_err(|_| "Invalid SELECTION_MAX_ATTEMPTS")?;

        if max_attempts == 0 {
            return Err("SELECTION_MAX_ATTEMPTS must be at least 1".to_string());
        }

        Ok(Self {
            max_attempts,
            reset_mode: env::var("SELECTION_RESET_MODE")
                .unwrap_or_else(|_| "unlock".to_string())
                .parse()?,
            attempt_counting: env::var("SELECTION_ATTEMPT_COUNTING")
                .unwrap_or_else(|_| "valid_only".to_string())
                .parse()?,
        })
    }
}

fn parse_usize_list(raw: &str) -> Result<Vec<usize>, std::num::ParseIntError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            mapbox_api_key: env::var("MAPBOX_API_KEY").map_err(|_| "MAPBOX_API_KEY must be set")?,
            mapbox_base_url: env::var("MAPBOX_BASE_URL").ok().filter(|s| !s.is_empty()),
            session_ttl_seconds: env::var("SESSION_TTL_SECONDS")
                .unwrap_or_else(|_| DEFAULT_SESSION_TTL_SECONDS.to_string())
                .parse()
                .map_err(|_| "Invalid SESSION_TTL_SECONDS")?,
            session_max_entries: env::var("SESSION_MAX_ENTRIES")
                .unwrap_or_else(|_| DEFAULT_SESSION_MAX_ENTRIES.to_string())
                .parse()
                .map_err(|_| "Invalid SESSION_MAX_ENTRIES")?,
            matcher: MatcherConfig::from_env()?,
            selection: SelectionConfig::from_env()?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const MATCHER_VARS: &[&str] = &[
        "ROUTE_DISTANCE_TOLERANCE",
        "ROUTE_BEARING_COUNTS",
        "ROUTE_ACCEPTABLE_OVERLAP",
        "ROUTE_SAME_PATH_OVERLAP",
        "ROUTE_ORACLE_FANOUT",
        "ROUTE_MAX_TOLERANCE_FACTOR",
        "ROUTE_OVERLAP_BUFFER_M",
        "ROUTE_DETOUR_OFFSET_RATIO",
        "ROUTE_DETOUR_MIN_OFFSET_M",
        "ROUTE_DETOUR_MAX_OFFSET_M",
        "SELECTION_MAX_ATTEMPTS",
        "SELECTION_RESET_MODE",
        "SELECTION_ATTEMPT_COUNTING",
    ];

    fn clear_vars() {
        for var in MATCHER_VARS {
            unsafe { env::remove_var(var) };
        }
    }

    #[test]
    fn test_tolerance_factor_order() {
        let factors = MatcherConfig::default().tolerance_factors();
        assert_eq!(factors.len(), 11);
        assert_eq!(factors[0], 0.0);
        assert!((factors[1] + 0.01).abs() < 1e-12);
        assert!((factors[2] - 0.01).abs() < 1e-12);
        assert!((factors[9] + 0.05).abs() < 1e-12);
        assert!((factors[10] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_detour_offset_clamped() {
        let config = MatcherConfig::default();
        assert_eq!(config.detour_offset_m(500.0), 150.0);
        assert!((config.detour_offset_m(3_000.0) - 450.0).abs() < 1e-9);
        assert_eq!(config.detour_offset_m(20_000.0), 800.0);
    }

    #[test]
    fn test_default_matcher_config_is_valid() {
        let config = MatcherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bearing_counts, vec![16, 20, 24]);
        assert_eq!(config.ring_search_budget(), Duration::from_secs(30));
        assert_eq!(config.differentiation_budget(), Duration::from_secs(8));
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let config = MatcherConfig {
            acceptable_overlap: 0.9,
            same_path_overlap: 0.5,
            ..MatcherConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MatcherConfig {
            oracle_fanout: 0,
            ..MatcherConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_usize_list() {
        assert_eq!(parse_usize_list("16, 20,24").unwrap(), vec![16, 20, 24]);
        assert!(parse_usize_list("16,x").is_err());
    }

    #[test]
    #[serial]
    fn test_matcher_config_from_env() {
        clear_vars();
        unsafe {
            env::set_var("ROUTE_DISTANCE_TOLERANCE", "0.08");
            env::set_var("ROUTE_BEARING_COUNTS", "8,12");
        }

        let config = MatcherConfig::from_env().unwrap();
        assert_eq!(config.distance_tolerance, 0.08);
        assert_eq!(config.bearing_counts, vec![8, 12]);
        assert_eq!(config.oracle_fanout, DEFAULT_ORACLE_FANOUT);

        clear_vars();
    }

    #[test]
    #[serial]
    fn test_matcher_config_invalid_value_names_variable() {
        clear_vars();
        unsafe { env::set_var("ROUTE_ORACLE_FANOUT", "many") };

        let err = MatcherConfig::from_env().unwrap_err();
        assert!(err.contains("ROUTE_ORACLE_FANOUT"), "{}", err);

        for (var, value) in [
            ("ROUTE_DETOUR_MIN_OFFSET_M", "NaN"),
            ("ROUTE_DETOUR_MAX_OFFSET_M", "NaN"),
            ("ROUTE_DETOUR_MIN_OFFSET_M", "-10"),
            ("ROUTE_MAX_TOLERANCE_FACTOR", "1.0"),
            ("ROUTE_MAX_TOLERANCE_FACTOR", "inf"),
            ("ROUTE_OVERLAP_BUFFER_M", "-5"),
            ("ROUTE_OVERLAP_BUFFER_M", "NaN"),
            ("ROUTE_DETOUR_OFFSET_RATIO", "-0.1"),
            ("ROUTE_DETOUR_OFFSET_RATIO", "NaN"),
        ] {
            clear_vars();
            unsafe { env::set_var(var, value) };

            let err = MatcherConfig::from_env().unwrap_err();
            assert!(err.contains(var), "{}={} gave: {}", var, value, err);
        }

        clear_vars();
    }

    #[test]
    fn test_validated_config_detour_offset_is_clamped() {
        let config = MatcherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detour_offset_m(100.0), config.detour_min_offset_m);
        assert_eq!(config.detour_offset_m(100_000.0), config.detour_max_offset_m);
        assert!((config.detour_offset_m(3_000.0) - 450.0).abs() < 1e-9);
    }

    #[test]
    #[serial]
    fn test_selection_config_from_env() {
        clear_vars();
        assert_eq!(SelectionConfig::from_env().unwrap(), SelectionConfig::default());

        unsafe {
            env::set_var("SELECTION_MAX_ATTEMPTS", "5");
            env::set_var("SELECTION_RESET_MODE", "lock_with_default");
            env::set_var("SELECTION_ATTEMPT_COUNTING", "all_clicks");
        }
        let config = SelectionConfig::from_env().unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.reset_mode, ResetMode::LockWithDefault);
        assert_eq!(config.attempt_counting, AttemptCounting::AllClicks);

        unsafe { env::set_var("SELECTION_MAX_ATTEMPTS", "0") };
        assert!(SelectionConfig::from_env().is_err());

        clear_vars();
    }
}
