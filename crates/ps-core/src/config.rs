//! Run configuration.
//!
//! `SimConfig` is an immutable value assembled once by the application
//! (normally from CLI flags) and handed to the runner.  [`SimConfig::validate`]
//! is the single precondition check; nothing downstream re-validates.

use crate::{CoreError, CoreResult};

/// How vehicles are driven.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionMode {
    /// One process, one graph; each vehicle driven to completion in turn.
    #[default]
    Sequential,
    /// One process, one graph; one independent unit of work per vehicle.
    Concurrent,
    /// Spatially partitioned: one root rank plus one leaf rank per strip.
    Distributed,
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Sequential  => "sequential",
            ExecutionMode::Concurrent  => "concurrent",
            ExecutionMode::Distributed => "distributed",
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level simulation configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Number of vehicles seeded on the root graph.
    pub vehicles: usize,

    /// Lower bound of the uniform speed draw (distance units per step).
    pub min_speed: f64,

    /// Upper bound of the uniform speed draw.
    pub max_speed: f64,

    /// Number of vertical strips (= leaf ranks) in distributed mode.
    pub partitions: usize,

    pub mode: ExecutionMode,

    /// Master RNG seed.  The same seed and graph always produce the same fleet.
    pub seed: u64,

    /// Worker thread count for vehicle drive units.  `None` uses all logical
    /// cores.
    pub num_threads: Option<usize>,

    /// Origin/destination pairs tried per vehicle before seeding gives up.
    pub max_seed_attempts: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            vehicles:          100,
            min_speed:         1.0,
            max_speed:         10.0,
            partitions:        1,
            mode:              ExecutionMode::Sequential,
            seed:              42,
            num_threads:       None,
            max_seed_attempts: 1_000,
        }
    }
}

impl SimConfig {
    /// Check every scalar precondition in one place.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.min_speed.is_finite() && self.min_speed > 0.0) {
            return Err(CoreError::Config(format!(
                "min_speed must be finite and > 0, got {}",
                self.min_speed
            )));
        }
        if !(self.max_speed.is_finite() && self.max_speed > 0.0) {
            return Err(CoreError::Config(format!(
                "max_speed must be finite and > 0, got {}",
                self.max_speed
            )));
        }
        if self.min_speed > self.max_speed {
            return Err(CoreError::Config(format!(
                "min_speed {} exceeds max_speed {}",
                self.min_speed, self.max_speed
            )));
        }
        if self.partitions == 0 {
            return Err(CoreError::Config("partitions must be >= 1".into()));
        }
        if self.max_seed_attempts == 0 {
            return Err(CoreError::Config("max_seed_attempts must be >= 1".into()));
        }
        if self.num_threads == Some(0) {
            return Err(CoreError::Config("num_threads must be >= 1 when set".into()));
        }
        Ok(())
    }

    /// Total ranks needed in distributed mode: the root plus one per strip.
    #[inline]
    pub fn world_size(&self) -> usize {
        self.partitions + 1
    }
}
