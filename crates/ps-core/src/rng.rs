//! Deterministic simulation-level RNG wrapper.
//!
//! All randomness in a run (origin/destination sampling, speed assignment,
//! vehicle IDs) is drawn on the root from a single `SimRng` seeded by
//! `SimConfig::seed`, so a given seed and graph always produce the same
//! fleet.  The step algorithm itself never touches an RNG.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::VehicleId;

/// Simulation-level RNG for fleet seeding.
///
/// Used only from the thread that seeds the fleet.  The type is `!Sync` to
/// prevent accidental sharing across threads.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Uniform speed in `[min, max]`.  Collapses to `min` when the range is
    /// empty so a fixed-speed fleet (`min == max`) needs no special casing.
    #[inline]
    pub fn speed(&mut self, min: f64, max: f64) -> f64 {
        if max > min { self.0.gen_range(min..=max) } else { min }
    }

    /// Draw a fresh vehicle identifier.
    #[inline]
    pub fn vehicle_id(&mut self) -> VehicleId {
        VehicleId::generate(&mut self.0)
    }
}
