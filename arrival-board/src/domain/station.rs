//! Station identity types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Error returned when parsing an invalid station identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} id: {reason}")]
pub struct InvalidId {
    kind: &'static str,
    reason: &'static str,
}

fn check_id(kind: &'static str, s: &str) -> Result<String, InvalidId> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(InvalidId {
            kind,
            reason: "must not be empty",
        });
    }
    if trimmed.chars().any(char::is_control) {
        return Err(InvalidId {
            kind,
            reason: "must not contain control characters",
        });
    }
    Ok(trimmed.to_string())
}

/// Internal catalog identifier for a station or a complex.
///
/// Identifiers are opaque strings such as `"A27"`, `"World Trade Center"`
/// or `"WTC"`. Surrounding whitespace is trimmed; empty ids are rejected.
///
/// # Examples
///
/// ```
/// use arrival_board::domain::StationId;
///
/// let id = StationId::parse(" A27 ").unwrap();
/// assert_eq!(id.as_str(), "A27");
/// assert!(StationId::parse("  ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationId(String);

impl StationId {
    /// Parse a station id from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidId> {
        check_id("station", s).map(Self)
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StationId {
    type Error = InvalidId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StationId> for String {
    fn from(id: StationId) -> Self {
        id.0
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier understood by the real-time arrival source (e.g. `"10327_73"`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalId(String);

impl ExternalId {
    /// Parse an external id from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidId> {
        check_id("external", s).map(Self)
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ExternalId {
    type Error = InvalidId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ExternalId> for String {
    fn from(id: ExternalId) -> Self {
        id.0
    }
}

impl fmt::Debug for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExternalId({})", self.0)
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mode of transport served at a station or discovery candidate.
///
/// Parsing accepts both the catalog spellings (`"regional-rail"`) and the
/// discovery service's (`"regionalTrain"`). Unknown modes are kept verbatim
/// so they can be reported, but never count as rail-like.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransportMode {
    Subway,
    RegionalRail,
    LightRail,
    Bus,
    Ferry,
    Tram,
    Other(String),
}

impl TransportMode {
    /// Parse a mode name. Never fails; unrecognised names become `Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "subway" | "metro" => TransportMode::Subway,
            "regional-rail" | "regionalTrain" | "rail" | "highSpeedTrain" | "intercityTrain"
            | "interRegionalTrain" | "cityTrain" => TransportMode::RegionalRail,
            "light-rail" | "lightRail" => TransportMode::LightRail,
            "bus" | "busRapid" | "privateBus" => TransportMode::Bus,
            "ferry" => TransportMode::Ferry,
            "tram" => TransportMode::Tram,
            other => TransportMode::Other(other.to_string()),
        }
    }

    /// Canonical catalog spelling.
    pub fn as_str(&self) -> &str {
        match self {
            TransportMode::Subway => "subway",
            TransportMode::RegionalRail => "regional-rail",
            TransportMode::LightRail => "light-rail",
            TransportMode::Bus => "bus",
            TransportMode::Ferry => "ferry",
            TransportMode::Tram => "tram",
            TransportMode::Other(s) => s,
        }
    }

    /// Subway, regional rail and light rail.
    pub fn is_rail_like(&self) -> bool {
        matches!(
            self,
            TransportMode::Subway | TransportMode::RegionalRail | TransportMode::LightRail
        )
    }
}

impl From<String> for TransportMode {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<TransportMode> for String {
    fn from(mode: TransportMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting values outside the valid ranges.
    pub fn new(lat: f64, lon: f64) -> Result<Self, DomainError> {
        let coords = Self { lat, lon };
        coords.validate()?;
        Ok(coords)
    }

    /// Check the latitude and longitude ranges.
    pub fn validate(&self) -> Result<(), DomainError> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lon_ok = self.lon.is_finite() && (-180.0..=180.0).contains(&self.lon);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(DomainError::InvalidCoordinates {
                lat: self.lat,
                lon: self.lon,
            })
        }
    }

    /// Great-circle (haversine) distance in meters.
    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos()
                * other.lat.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }
}

/// A physical stop from the canonical catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub mode: TransportMode,
    #[serde(flatten)]
    pub coordinates: Coordinates,
}

/// A set of physically distinct stops presented as one logical station.
///
/// Constituents are held by id and resolved through the crosswalk store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub id: StationId,
    pub name: String,
    pub stations: Vec<StationId>,
}
