//! Arrival records.

use serde::Serialize;

use super::{LineCode, StationId};

/// One upcoming train as reported by the arrival source for a single stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardEntry {
    pub line: LineCode,
    pub destination: String,
    pub minutes_until_arrival: u32,
}

impl BoardEntry {
    pub fn new(line: LineCode, destination: impl Into<String>, minutes_until_arrival: u32) -> Self {
        Self {
            line,
            destination: destination.into(),
            minutes_until_arrival,
        }
    }
}

/// A board entry tagged with the constituent stop it was reported for.
///
/// Produced per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrivalRecord {
    pub line: LineCode,
    pub destination: String,
    pub minutes_until_arrival: u32,
    pub source_station_id: StationId,
}

impl ArrivalRecord {
    pub fn from_entry(entry: BoardEntry, source_station_id: StationId) -> Self {
        Self {
            line: entry.line,
            destination: entry.destination,
            minutes_until_arrival: entry.minutes_until_arrival,
            source_station_id,
        }
    }
}
