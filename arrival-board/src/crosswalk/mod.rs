//! Crosswalk store and station identity resolver.
//!
//! The crosswalk maps the internal station catalog to the arrival source's
//! station ids and carries the static line map used when live data is
//! silent. It is built offline by [`crate::builder`], loaded once at
//! startup and treated as read-only afterwards.

mod entry;
mod error;
mod file;
mod resolve;
mod shared;
mod store;

pub use entry::{CrosswalkEntry, MatchConfidence};
pub use error::CrosswalkError;
pub use file::CrosswalkFile;
pub(crate) use file::{read_json, write_json};
pub use resolve::{Resolution, ResolveError, ResolvedSource};
pub use shared::SharedCrosswalk;
pub use store::{CrosswalkStore, StationKind, StationSummary};

#[cfg(test)]
pub(crate) use store::test_support;
