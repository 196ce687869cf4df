use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    RingSearch,
    Differentiation,
    Adjustment,
    SamePathFallback,
    ManualSelection,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// The phase produced the result it was looking for
    Matched,
    /// Every option was tried without success
    Exhausted,
    /// Wall-clock budget ran out; best-so-far was kept
    TimedOut,
    /// A fallback was accepted instead of a full match
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTrace {
    pub phase: SearchPhase,
    pub candidates_evaluated: u32,
    pub oracle_failures: u32,
    pub outcome: PhaseOutcome,
    pub elapsed_ms: u64,
}

/// Advisory record of what the matcher did, for "why this route" diagnostics.
/// Not a stable wire contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchTrace {
    pub phases: Vec<PhaseTrace>,
    pub oracle_calls: u64,
    pub memo_hits: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_overlap_ratio: Option<f64>,
}

impl SearchTrace {
    pub fn record(&mut self, phase: PhaseTrace) {
        self.phases.push(phase);
    }

    pub fn phase(&self, phase: SearchPhase) -> Option<&PhaseTrace> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    pub fn candidates_evaluated(&self) -> u32 {
        self.phases.iter().map(|p| p.candidates_evaluated).sum()
    }
}
