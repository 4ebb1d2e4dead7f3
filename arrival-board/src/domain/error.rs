//! Domain error types.
//!
//! These errors represent validation failures in the domain layer.
//! They are distinct from API/IO errors.

/// Domain-level validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// `min_minutes` is greater than `max_minutes`
    #[error("invalid time window: min {min} > max {max}")]
    InvalidWindow { min: u32, max: u32 },

    /// Latitude or longitude out of range
    #[error("invalid coordinates: ({lat}, {lon})")]
    InvalidCoordinates { lat: f64, lon: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidWindow { min: 5, max: 3 };
        assert_eq!(err.to_string(), "invalid time window: min 5 > max 3");

        let err = DomainError::InvalidCoordinates {
            lat: 91.0,
            lon: 0.5,
        };
        assert_eq!(err.to_string(), "invalid coordinates: (91, 0.5)");
    }
}
