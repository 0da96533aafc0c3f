use serde::{Deserialize, Serialize};

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    Running { remaining_seconds: u64 },
    Expired,
}

/// One-second-resolution budget countdown for a single block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    block_index: usize,
    budget_seconds: u64,
    remaining_seconds: u64,
}

impl Countdown {
    pub fn new(block_index: usize, budget_seconds: u64) -> Self {
        Self {
            block_index,
            budget_seconds,
            remaining_seconds: budget_seconds,
        }
    }

    /// A countdown that already ran for `elapsed_seconds`.
    pub fn resumed(block_index: usize, budget_seconds: u64, elapsed_seconds: u64) -> Self {
        Self {
            block_index,
            budget_seconds,
            remaining_seconds: budget_seconds.saturating_sub(elapsed_seconds),
        }
    }

    pub fn block_index(&self) -> usize {
        self.block_index
    }

    pub fn budget_seconds(&self) -> u64 {
        self.budget_seconds
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    /// Take one second off. Reports `Expired` on the tick that reaches zero
    /// (and on any tick after that).
    pub fn tick(&mut self) -> CountdownTick {
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            CountdownTick::Expired
        } else {
            CountdownTick::Running {
                remaining_seconds: self.remaining_seconds,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_on_the_budget_th_tick() {
        let mut countdown = Countdown::new(0, 3);
        assert_eq!(countdown.tick(), CountdownTick::Running { remaining_seconds: 2 });
        assert_eq!(countdown.tick(), CountdownTick::Running { remaining_seconds: 1 });
        assert_eq!(countdown.tick(), CountdownTick::Expired);
        assert_eq!(countdown.remaining_seconds(), 0);
    }

    #[test]
    fn zero_budget_expires_immediately() {
        let mut countdown = Countdown::new(2, 0);
        assert_eq!(countdown.tick(), CountdownTick::Expired);
        assert_eq!(countdown.block_index(), 2);
    }

    #[test]
    fn resumed_subtracts_elapsed() {
        assert_eq!(Countdown::resumed(1, 100, 40).remaining_seconds(), 60);
        assert_eq!(Countdown::resumed(1, 100, 400).remaining_seconds(), 0);
    }
}
