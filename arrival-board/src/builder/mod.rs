//! Offline crosswalk builder.
//!
//! Given a station catalog, asks a discovery source for nearby stations
//! and picks the best external id for each, writing a crosswalk file and
//! an audit report listing everything a human should check.

mod audit;
mod build;
mod config;
mod discovery;
mod error;
mod matching;

pub use audit::{AuditReason, AuditReport, AuditSummary, StationAudit};
pub use build::{BuildOutput, CrosswalkBuilder, Overrides, load_overrides};
pub use config::{BuilderConfig, RADIUS_RANGE_M};
pub use discovery::{Candidate, DiscoveryError, DiscoverySource};
pub use error::BuildError;
pub use matching::{
    ChosenCandidate, NameMatch, Selection, accepts_modes, name_match, normalize_name,
    select_candidate,
};
