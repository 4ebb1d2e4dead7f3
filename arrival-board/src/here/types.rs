//! HERE Transit API v8 response DTOs.
//!
//! These types map directly to the `/v8/departures` and `/v8/stations`
//! JSON responses. They use `Option` liberally because HERE omits fields
//! rather than sending null values.

use serde::Deserialize;

/// Response from `GET /v8/departures?ids=...`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeparturesResponse {
    /// One board per requested station id.
    #[serde(default)]
    pub boards: Vec<Board>,
}

/// Departures for one station.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    /// The station the board belongs to.
    pub place: Option<Place>,

    #[serde(default)]
    pub departures: Vec<Departure>,
}

/// A single departure on a board.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Departure {
    /// Departure time, ISO 8601 with offset (e.g. `2026-01-22T14:30:00-05:00`).
    pub time: Option<String>,

    /// Delay in seconds relative to schedule, when known.
    pub delay: Option<i64>,

    /// The vehicle serving this departure.
    pub transport: Option<Transport>,
}

/// Line and direction information for a departure or a station.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transport {
    /// Transport mode, e.g. `subway`, `regionalTrain`, `bus`.
    pub mode: Option<String>,

    /// Line name, e.g. `"4"` or `"JSQ-33"`.
    pub name: Option<String>,

    /// Short line name when `name` is absent.
    pub short_name: Option<String>,

    /// Direction text, e.g. `"Woodlawn"`.
    pub headsign: Option<String>,
}

/// A HERE place (station).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// HERE station id, e.g. `"10327_73"`.
    pub id: Option<String>,

    pub name: Option<String>,

    pub location: Option<Location>,
}

/// WGS84 location as HERE spells it.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Response from `GET /v8/stations?in=lat,lng;r=radius&return=transport`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationsResponse {
    #[serde(default)]
    pub stations: Vec<StationItem>,
}

/// One station found by a proximity search.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationItem {
    pub place: Option<Place>,

    /// Lines serving this station. Absent when HERE has no mode metadata.
    #[serde(default)]
    pub transports: Vec<Transport>,
}
