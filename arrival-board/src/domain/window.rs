//! Arrival time windows.

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Inclusive range of minutes-until-arrival a caller wants to see.
///
/// Construction does not validate; callers pass windows straight from
/// request parameters and [`TimeWindow::validate`] rejects inverted ranges
/// before any work is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub min_minutes: u32,
    pub max_minutes: u32,
}

impl TimeWindow {
    pub fn new(min_minutes: u32, max_minutes: u32) -> Self {
        Self {
            min_minutes,
            max_minutes,
        }
    }

    /// Reject `min > max`.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.min_minutes > self.max_minutes {
            return Err(DomainError::InvalidWindow {
                min: self.min_minutes,
                max: self.max_minutes,
            });
        }
        Ok(())
    }

    /// Whether `minutes` falls inside the window (both ends inclusive).
    pub fn contains(&self, minutes: u32) -> bool {
        self.min_minutes <= minutes && minutes <= self.max_minutes
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::new(2, 20)
    }
}
