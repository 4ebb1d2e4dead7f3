//! Crosswalk builder errors.

use crate::crosswalk::CrosswalkError;
use crate::domain::StationId;

/// Errors that stop a build before or after discovery.
///
/// Per-station discovery failures are not errors here; they are recorded
/// as unmatched stations in the audit report.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("discovery radius {0} m outside 100..=800 m")]
    InvalidRadius(u32),

    #[error("invalid builder config: {0}")]
    InvalidConfig(&'static str),

    /// An override names a station that is not in the catalog
    #[error("override for unknown station: {0}")]
    UnknownOverride(StationId),

    #[error(transparent)]
    Crosswalk(#[from] CrosswalkError),
}
