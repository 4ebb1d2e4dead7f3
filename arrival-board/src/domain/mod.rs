//! Domain types for the arrival board.
//!
//! Identifiers, line codes, time windows and arrival records. Types that
//! carry an invariant enforce it at construction, except [`TimeWindow`],
//! which is validated explicitly so inverted requests can be reported.

mod arrival;
mod error;
mod line;
mod station;
mod window;

pub use arrival::{ArrivalRecord, BoardEntry};
pub use error::DomainError;
pub use line::{InvalidLine, LineCode, LineSet};
pub use station::{Complex, Coordinates, ExternalId, InvalidId, Station, StationId, TransportMode};
pub use window::TimeWindow;
