//! Crosswalk builder configuration.

use std::ops::RangeInclusive;
use std::time::Duration;

use super::error::BuildError;

/// Accepted discovery radii in meters.
pub const RADIUS_RANGE_M: RangeInclusive<u32> = 100..=800;

/// Configuration parameters for a crosswalk build.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Discovery search radius (meters).
    pub radius_m: u32,

    /// Number of stations whose discovery queries run concurrently.
    pub batch_size: usize,

    /// Attempts per station when the source rate-limits us.
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry
    /// (milliseconds).
    pub initial_backoff_ms: u64,
}

impl BuilderConfig {
    /// Reject radii outside [`RADIUS_RANGE_M`] and empty batches.
    pub fn validate(&self) -> Result<(), BuildError> {
        if !RADIUS_RANGE_M.contains(&self.radius_m) {
            return Err(BuildError::InvalidRadius(self.radius_m));
        }
        if self.batch_size == 0 || self.max_attempts == 0 {
            return Err(BuildError::InvalidConfig(
                "batch_size and max_attempts must be positive",
            ));
        }
        Ok(())
    }

    /// Delay before retry number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry);
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor))
    }

    pub fn with_radius(mut self, radius_m: u32) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff_ms = u64::try_from(initial.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            radius_m: 300,
            batch_size: 5,
            max_attempts: 3,
            initial_backoff_ms: 1_000,
        }
    }
}
