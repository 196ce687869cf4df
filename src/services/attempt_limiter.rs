use crate::config::SelectionConfig;
use crate::models::{AttemptCounting, AttemptState, ResetMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterState {
    /// Accepting clicks; holds the number of attempts already consumed
    Open(u32),
    /// Rejecting clicks; holds the attempt count at the time of locking
    Locked(u32),
}

/// Gates manual destination overrides to a fixed number of attempts.
///
/// Only valid selections consume an attempt unless the limiter is configured
/// with `AttemptCounting::AllClicks`. Once the budget is spent the limiter
/// locks until `reset`.
#[derive(Debug, Clone)]
pub struct AttemptLimiter {
    state: LimiterState,
    max_attempts: u32,
    counting: AttemptCounting,
}

impl AttemptLimiter {
    pub fn new(max_attempts: u32, counting: AttemptCounting) -> Self {
        AttemptLimiter {
            state: LimiterState::Open(0),
            max_attempts: max_attempts.max(1),
            counting,
        }
    }

    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(config.max_attempts, config.attempt_counting)
    }

    pub fn state(&self) -> LimiterState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state, LimiterState::Locked(_))
    }

    pub fn snapshot(&self) -> AttemptState {
        let (count, locked) = match self.state {
            LimiterState::Open(count) => (count, false),
            LimiterState::Locked(count) => (count, true),
        };
        AttemptState {
            valid_attempt_count: count,
            max_attempts: self.max_attempts,
            locked,
        }
    }

    /// A destination was accepted; returns the new state
    pub fn record_valid(&mut self) -> LimiterState {
        self.consume();
        self.state
    }

    /// A destination was rejected. Only counts under `AllClicks`.
    pub fn record_invalid(&mut self) -> LimiterState {
        if self.counting == AttemptCounting::AllClicks {
            self.consume();
        }
        self.state
    }

    pub fn reset(&mut self, mode: ResetMode) {
        self.state = match mode {
            ResetMode::Unlock => LimiterState::Open(0),
            ResetMode::LockWithDefault => LimiterState::Locked(0),
        };
        tracing::debug!(mode = ?mode, state = ?self.state, "Attempt limiter reset");
    }

    fn consume(&mut self) {
        if let LimiterState::Open(count) = self.state {
            let count = count + 1;
            self.state = if count >= self.max_attempts {
                tracing::info!(
                    attempts = count,
                    "Selection attempts exhausted ({}), locking",
                    count
                );
                LimiterState::Locked(count)
            } else {
                LimiterState::Open(count)
            };
        }
    }
}
