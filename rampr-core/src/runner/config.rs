use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_MAX_VUS: u64 = 5_000;
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Hard cap on concurrent virtual users; higher targets are clamped.
    pub max_vus: u64,
    /// Control-loop period: how often the pool is reconciled and progress is reported.
    pub tick: Duration,
    /// How long an aborted run waits for in-flight requests before cancelling them.
    pub drain_grace: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_vus: DEFAULT_MAX_VUS,
            tick: DEFAULT_TICK,
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_vus == 0 {
            return Err(Error::InvalidMaxVus);
        }
        if self.tick.is_zero() {
            return Err(Error::InvalidTick);
        }
        Ok(())
    }
}
