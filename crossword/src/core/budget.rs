//! Countdown of remaining attempts shared by the build, solve and proposal loops.

/// Retry budget that counts down to exhaustion and can be refilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    initial: u32,
    remaining: u32,
}

impl RetryBudget {
    pub fn new(initial: u32) -> Self {
        Self {
            initial,
            remaining: initial,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Spend one attempt. Returns `true` while attempts remain afterwards.
    pub fn consume(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        !self.is_exhausted()
    }

    /// Refill to the initial value (after a successful round).
    pub fn reset(&mut self) {
        self.remaining = self.initial;
    }

    /// Refill to `remaining` attempts, which may differ from the initial value.
    pub fn reset_to(&mut self, remaining: u32) {
        self.remaining = remaining;
    }
}
