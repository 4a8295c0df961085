//! Execution budgets for one top-level command.
//!
//! A [`Budget`] is created when a command starts and shared by every nested
//! verb and function call it makes. Every evaluated form costs one tick,
//! builtins that build strings or lists also pay one tick per byte or item
//! they produce, and every nested call enters one level of depth.

use std::time::{Duration, Instant};

use moorhen_foundation::{Error, ExecutionLimit, Result};

/// How often (in ticks) the wall clock is consulted.
const CLOCK_INTERVAL: u64 = 64;

/// Tick, wall-time, and depth limits with their running counters.
#[derive(Clone, Debug)]
pub struct Budget {
    max_ticks: u64,
    ticks: u64,
    max_wall_time: Duration,
    started: Instant,
    max_depth: usize,
    depth: usize,
}

impl Budget {
    /// Starts a budget now.
    #[must_use]
    pub fn new(max_ticks: u64, max_wall_time: Duration, max_depth: usize) -> Self {
        Self {
            max_ticks,
            ticks: 0,
            max_wall_time,
            started: Instant::now(),
            max_depth,
            depth: 0,
        }
    }

    /// A budget that never runs out.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(u64::MAX, Duration::MAX, usize::MAX)
    }

    /// Charges one tick.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded` once the tick or wall-time budget is spent.
    /// Every later tick fails too.
    pub fn tick(&mut self) -> Result<()> {
        self.charge(1)
    }

    /// Charges `ticks` at once.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded` if the charge does not fit in what is left,
    /// or if the wall clock has run out.
    pub fn charge(&mut self, ticks: u64) -> Result<()> {
        let before = self.ticks;
        self.ticks = self.ticks.saturating_add(ticks);
        if self.ticks > self.max_ticks {
            return Err(Error::limit_exceeded(ExecutionLimit::MaxTicks {
                limit: self.max_ticks,
            }));
        }
        if self.ticks / CLOCK_INTERVAL != before / CLOCK_INTERVAL {
            self.check_clock()?;
        }
        Ok(())
    }

    /// Ticks left before the limit.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.max_ticks.saturating_sub(self.ticks)
    }

    /// Enters one level of nested call.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded` if the depth or wall-time limit is reached.
    pub fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(Error::limit_exceeded(ExecutionLimit::MaxDepth {
                limit: self.max_depth,
            }));
        }
        self.check_clock()?;
        self.depth += 1;
        Ok(())
    }

    /// Leaves one level of nested call.
    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn check_clock(&self) -> Result<()> {
        if self.started.elapsed() > self.max_wall_time {
            return Err(Error::limit_exceeded(ExecutionLimit::MaxWallTime {
                limit_ms: u64::try_from(self.max_wall_time.as_millis()).unwrap_or(u64::MAX),
            }));
        }
        Ok(())
    }

    /// Ticks charged so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Current nesting depth.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Time since the budget started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::unlimited()
    }
}
