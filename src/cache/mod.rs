pub mod memory;

pub use memory::MemoizedOracle;

use crate::constants::MEMO_COORDINATE_PRECISION;
use crate::models::Coordinates;
use crate::services::oracle::RouteOptions;
use serde::{Deserialize, Serialize};

/// Memo key for one oracle request.
/// Waypoints are snapped to ~1 m so near-identical probes share an answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteRequestKey {
    waypoints: Vec<(i64, i64)>,
    alternatives: bool,
    max_alternatives: u32,
}

impl RouteRequestKey {
    pub fn new(waypoints: &[Coordinates], options: RouteOptions) -> Self {
        RouteRequestKey {
            waypoints: waypoints
                .iter()
                .map(|c| c.grid_key(MEMO_COORDINATE_PRECISION))
                .collect(),
            alternatives: options.alternatives,
            max_alternatives: if options.alternatives {
                options.max_alternatives
            } else {
                0
            },
        }
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses > 0 {
            (self.hits as f64 / (self.hits + self.misses) as f64) * 100.0
        } else {
            0.0
        }
    }
}
