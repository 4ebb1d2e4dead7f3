//! Crosswalk store error types.

use std::path::PathBuf;

use crate::domain::StationId;

/// Errors that can occur when loading, validating or saving crosswalk data.
#[derive(Debug, thiserror::Error)]
pub enum CrosswalkError {
    /// Reading or writing a file failed
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File contents are not valid crosswalk JSON
    #[error("JSON error in {path}: {message}")]
    Json { path: PathBuf, message: String },

    /// The same id appears twice in the catalog
    #[error("duplicate id {0} in catalog")]
    DuplicateId(StationId),

    /// A complex is malformed (too few, unknown or repeated constituents)
    #[error("invalid complex {id}: {reason}")]
    InvalidComplex { id: StationId, reason: String },

    /// A crosswalk or line entry refers to a station not in the catalog
    #[error("{context} refers to unknown station {id}")]
    UnknownReference {
        context: &'static str,
        id: StationId,
    },

    /// A crosswalk entry is internally inconsistent
    #[error("invalid crosswalk entry for {id}: {reason}")]
    InvalidEntry { id: StationId, reason: &'static str },

    /// A station has out-of-range coordinates
    #[error("station {id}: {source}")]
    InvalidStation {
        id: StationId,
        #[source]
        source: crate::domain::DomainError,
    },
}
