//! The station-discovery source abstraction.

use std::future::Future;

use serde::Serialize;

use crate::domain::{Coordinates, ExternalId, TransportMode};

/// A station returned by a proximity search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub external_id: ExternalId,
    pub name: String,
    pub coordinates: Coordinates,
    /// Modes served at the candidate. Empty when the source has no mode
    /// metadata for it.
    pub modes: Vec<TransportMode>,
}

/// Error from a discovery query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    /// The source asked us to slow down
    #[error("rate limited by discovery source")]
    RateLimited,

    /// Any other failure
    #[error("discovery failed: {0}")]
    Upstream(String),
}

/// Trait for finding candidate stations near a coordinate.
pub trait DiscoverySource: Send + Sync {
    fn find_nearby(
        &self,
        coordinates: Coordinates,
        radius_m: u32,
    ) -> impl Future<Output = Result<Vec<Candidate>, DiscoveryError>> + Send;
}
