use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What `reset()` does to the attempt limiter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResetMode {
    /// Back to `Open(0)` with the default route active
    #[default]
    Unlock,
    /// Default route restored, manual re-selection stays disabled
    LockWithDefault,
}

impl FromStr for ResetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "unlock" => Ok(ResetMode::Unlock),
            "lock_with_default" | "lock" => Ok(ResetMode::LockWithDefault),
            _ => Err(format!(
                "Invalid reset mode: {}. Use 'unlock' or 'lock_with_default'",
                s
            )),
        }
    }
}

/// Which clicks consume an attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttemptCounting {
    #[default]
    ValidOnly,
    /// Legacy variant: rejected clicks also consume an attempt
    AllClicks,
}

impl FromStr for AttemptCounting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "valid_only" | "valid" => Ok(AttemptCounting::ValidOnly),
            "all_clicks" | "all" => Ok(AttemptCounting::AllClicks),
            _ => Err(format!(
                "Invalid attempt counting: {}. Use 'valid_only' or 'all_clicks'",
                s
            )),
        }
    }
}

/// Snapshot of the attempt limiter exposed to callers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttemptState {
    pub valid_attempt_count: u32,
    pub max_attempts: u32,
    pub locked: bool,
}

impl AttemptState {
    pub fn remaining(&self) -> u32 {
        if self.locked {
            0
        } else {
            self.max_attempts.saturating_sub(self.valid_attempt_count)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    TooClose,
    TooFar,
    /// The oracle could not route to the proposed point
    Unroutable,
    Locked,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::TooClose => write!(f, "too close"),
            RejectionReason::TooFar => write!(f, "too far"),
            RejectionReason::Unroutable => write!(f, "unroutable"),
            RejectionReason::Locked => write!(f, "locked"),
        }
    }
}

/// Why a proposed destination was not committed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRejection {
    pub reason: RejectionReason,
    /// Straight-line distance from origin to the proposed point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub straight_line_m: Option<f64>,
    /// Per-leg radius the straight-line distance was compared against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_radius_m: Option<f64>,
    /// Routed distance, when the oracle answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routed_distance_m: Option<f64>,
}

impl SelectionRejection {
    pub fn locked() -> Self {
        SelectionRejection {
            reason: RejectionReason::Locked,
            straight_line_m: None,
            target_radius_m: None,
            routed_distance_m: None,
        }
    }
}
