//! Stable application-wide constants.
//!
//! Values here are physiological coefficients, structural limits of the search,
//! and default fallbacks for env-var-based configuration. They should rarely change.
//! For tuning knobs that benefit from runtime experimentation, see
//! [`MatcherConfig`](crate::config::MatcherConfig) instead.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";

// --- Planning sessions ---

/// Idle time after which a planning session is evicted. Overridden by `SESSION_TTL_SECONDS`.
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 3_600;
/// Maximum number of concurrently tracked sessions. Overridden by `SESSION_MAX_ENTRIES`.
pub const DEFAULT_SESSION_MAX_ENTRIES: u64 = 10_000;

// --- Stride model ---
// Stride length is estimated as a fraction of body height. The walking
// coefficient is the classic 0.415 rule; running strides are longer.

pub const STRIDE_HEIGHT_RATIO_WALK: f64 = 0.415;
pub const STRIDE_HEIGHT_RATIO_RUN: f64 = 0.5;
/// Stride used when height is missing or invalid (walking).
pub const DEFAULT_STRIDE_WALK_M: f64 = 0.72;
/// Stride used when height is missing or invalid (running).
/// Same implied height as the walking default (~1.735 m).
pub const DEFAULT_STRIDE_RUN_M: f64 = 0.87;

// --- Pace tables ---

pub const SPEED_SLOW_KMH: f64 = 4.0;
pub const SPEED_MODERATE_KMH: f64 = 5.0;
pub const SPEED_FAST_KMH: f64 = 6.0;
pub const SPEED_FAST_RUN_KMH: f64 = 6.5;

/// kcal per km per kg of body weight.
pub const CALORIE_COEFFICIENT_SLOW: f64 = 0.35;
pub const CALORIE_COEFFICIENT_MODERATE: f64 = 0.50;
pub const CALORIE_COEFFICIENT_FAST: f64 = 0.70;

// --- Geodesy ---

/// Mean Earth radius used by all spherical formulas.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
/// Meters per degree of latitude on the spherical model.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
/// Decimal places used when memoizing oracle requests (~1.1 m at the equator).
pub const MEMO_COORDINATE_PRECISION: u32 = 5;

// --- Target matching defaults (overridable through MatcherConfig) ---

/// Accepted deviation from the target distance (±5%).
pub const DEFAULT_DISTANCE_TOLERANCE: f64 = 0.05;
/// Ring sizes tried by the direct ring search, in order.
pub const DEFAULT_BEARING_COUNTS: [usize; 3] = [16, 20, 24];
/// Increment between radius variants of a ring.
pub const DEFAULT_TOLERANCE_STEP: f64 = 0.01;
/// Largest radius variant, as a fraction of the base radius.
pub const DEFAULT_MAX_TOLERANCE_FACTOR: f64 = 0.05;

/// Buffer (meters) within which a sampled point counts as overlapping.
pub const DEFAULT_OVERLAP_BUFFER_M: f64 = 15.0;
/// Maximum number of points sampled along a candidate path.
pub const DEFAULT_OVERLAP_SAMPLE_POINTS: usize = 50;
/// Overlap at or below which a return path is accepted without further search.
pub const DEFAULT_ACCEPTABLE_OVERLAP: f64 = 0.30;
/// Overlap at or above which a return path is treated as a retrace.
pub const DEFAULT_SAME_PATH_OVERLAP: f64 = 0.95;

/// Alternatives requested from the oracle during differentiation.
pub const DEFAULT_MAX_ALTERNATIVES: u32 = 3;
/// Detour offset as a fraction of the outbound leg.
pub const DEFAULT_DETOUR_OFFSET_RATIO: f64 = 0.15;
pub const DEFAULT_DETOUR_MIN_OFFSET_M: f64 = 150.0;
pub const DEFAULT_DETOUR_MAX_OFFSET_M: f64 = 800.0;
/// Interior sample points used to build detour waypoints.
pub const DEFAULT_DETOUR_COUNT_PER_SIDE: usize = 3;

/// Oracle calls allowed in flight at once within a phase.
pub const DEFAULT_ORACLE_FANOUT: usize = 4;
pub const DEFAULT_RING_SEARCH_BUDGET_MS: u64 = 30_000;
pub const DEFAULT_DIFFERENTIATION_BUDGET_MS: u64 = 8_000;
/// Upper bound on memoized oracle answers within one search.
pub const DEFAULT_MEMO_MAX_ENTRIES: u64 = 2_048;

// --- Manual selection ---

pub const DEFAULT_MAX_SELECTION_ATTEMPTS: u32 = 3;

// --- Mapbox ---

/// Mapbox Directions accepts at most 25 coordinates per request.
pub const MAPBOX_MAX_WAYPOINTS: usize = 25;
/// Mapbox returns at most 3 alternatives.
pub const MAPBOX_MAX_ALTERNATIVES: u32 = 3;
