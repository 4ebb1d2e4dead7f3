//! Conversion from HERE DTOs to domain types.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::builder::Candidate;
use crate::domain::{BoardEntry, Coordinates, ExternalId, LineCode, TransportMode};

use super::types::{Departure, DeparturesResponse, StationsResponse, Transport};

/// Destination shown when HERE gives no headsign.
const UNKNOWN_DESTINATION: &str = "Unknown";

/// Convert a departures response into board entries relative to `now`.
///
/// Departures without a parseable time are skipped rather than failing the
/// whole board.
pub fn convert_departures(response: &DeparturesResponse, now: DateTime<Utc>) -> Vec<BoardEntry> {
    response
        .boards
        .iter()
        .flat_map(|board| board.departures.iter())
        .filter_map(|departure| match convert_departure(departure, now) {
            Some(entry) => Some(entry),
            None => {
                debug!(time = ?departure.time, "skipping departure without a usable time");
                None
            }
        })
        .collect()
}

fn convert_departure(departure: &Departure, now: DateTime<Utc>) -> Option<BoardEntry> {
    let time = departure.time.as_deref()?;
    let minutes = minutes_until(time, now)?;

    let transport = departure.transport.as_ref();
    let line = line_name(transport);
    let destination = transport
        .and_then(|t| t.headsign.as_deref())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .unwrap_or(UNKNOWN_DESTINATION);

    Some(BoardEntry::new(line, destination, minutes))
}

/// Line code: `name`, else `shortName`, else the headsign's first word,
/// else `N/A`.
fn line_name(transport: Option<&Transport>) -> LineCode {
    let from_fields = transport.and_then(|t| {
        [t.name.as_deref(), t.short_name.as_deref()]
            .into_iter()
            .flatten()
            .find_map(|s| LineCode::parse(s).ok())
            .or_else(|| {
                t.headsign
                    .as_deref()
                    .and_then(|h| h.split_whitespace().next())
                    .and_then(|w| LineCode::parse(w).ok())
            })
    });

    from_fields.unwrap_or_else(LineCode::unknown)
}

/// Whole minutes from `now` until an ISO 8601 timestamp, clamped at zero.
///
/// Partial minutes are truncated, so a train 90 seconds out shows as 1.
pub fn minutes_until(iso: &str, now: DateTime<Utc>) -> Option<u32> {
    let when = DateTime::parse_from_rfc3339(iso.trim()).ok()?;
    let secs = (when.with_timezone(&Utc) - now).num_seconds();
    let mins = (secs / 60).max(0);
    Some(u32::try_from(mins).unwrap_or(u32::MAX))
}

/// Convert a proximity search response into discovery candidates.
///
/// Places without an id or a location cannot be ranked and are dropped.
/// Candidates keep whatever modes HERE reports, possibly none.
pub fn convert_stations(response: &StationsResponse) -> Vec<Candidate> {
    response
        .stations
        .iter()
        .filter_map(|item| {
            let place = item.place.as_ref()?;
            let external_id = place.id.as_deref().and_then(|id| ExternalId::parse(id).ok());
            let location = place.location;

            let (Some(external_id), Some(location)) = (external_id, location) else {
                trace!(name = ?place.name, "dropping place without id or location");
                return None;
            };
            let coordinates = Coordinates::new(location.lat, location.lng).ok()?;

            let mut modes: Vec<TransportMode> = Vec::new();
            for mode in item.transports.iter().filter_map(|t| t.mode.as_deref()) {
                let mode = TransportMode::parse(mode);
                if !modes.contains(&mode) {
                    modes.push(mode);
                }
            }

            Some(Candidate {
                external_id,
                name: place.name.clone().unwrap_or_default(),
                coordinates,
                modes,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        // 2026-01-22 14:25:00 -05:00
        Utc.with_ymd_and_hms(2026, 1, 22, 19, 25, 0).unwrap()
    }

    fn departures(json: &str) -> DeparturesResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn minutes_are_truncated_and_clamped() {
        assert_eq!(minutes_until("2026-01-22T14:30:00-05:00", now()), Some(5));
        assert_eq!(minutes_until("2026-01-22T14:26:30-05:00", now()), Some(1));
        assert_eq!(minutes_until("2026-01-22T14:25:59-05:00", now()), Some(0));
        assert_eq!(minutes_until("2026-01-22T14:20:00-05:00", now()), Some(0));
        assert_eq!(minutes_until("2026-01-22T19:45:00Z", now()), Some(20));
        assert_eq!(minutes_until("soon", now()), None);
    }

    #[test]
    fn converts_board() {
        let response = departures(
            r#"{"boards":[{"place":{"id":"10327_73","name":"Grand Central"},"departures":[
                {"time":"2026-01-22T14:30:00-05:00","transport":{"mode":"subway","name":"4","headsign":"Woodlawn"}},
                {"time":"2026-01-22T14:33:00-05:00","transport":{"mode":"subway","name":"7","headsign":"Flushing-Main St"}}
            ]}]}"#,
        );

        let entries = convert_departures(&response, now());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].line.as_str(), "4");
        assert_eq!(entries[0].destination, "Woodlawn");
        assert_eq!(entries[0].minutes_until_arrival, 5);
        assert_eq!(entries[1].line.as_str(), "7");
        assert_eq!(entries[1].minutes_until_arrival, 8);
    }

    #[test]
    fn line_name_fallbacks() {
        let response = departures(
            r#"{"boards":[{"departures":[
                {"time":"2026-01-22T14:30:00-05:00","transport":{"shortName":"JSQ-33","headsign":"Journal Square"}},
                {"time":"2026-01-22T14:30:00-05:00","transport":{"name":"  ","headsign":"Hoboken via Newport"}},
                {"time":"2026-01-22T14:30:00-05:00","transport":{}},
                {"time":"2026-01-22T14:30:00-05:00"}
            ]}]}"#,
        );

        let entries = convert_departures(&response, now());
        let lines: Vec<&str> = entries.iter().map(|e| e.line.as_str()).collect();
        assert_eq!(lines, vec!["JSQ-33", "Hoboken", "N/A", "N/A"]);
        assert_eq!(entries[2].destination, "Unknown");
    }

    #[test]
    fn departures_without_time_are_skipped() {
        let response = departures(
            r#"{"boards":[{"departures":[
                {"transport":{"name":"A"}},
                {"time":"garbage","transport":{"name":"C"}},
                {"time":"2026-01-22T14:40:00-05:00","transport":{"name":"E"}}
            ]}]}"#,
        );

        let entries = convert_departures(&response, now());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].line.as_str(), "E");
        assert_eq!(entries[0].minutes_until_arrival, 15);
    }

    #[test]
    fn empty_board_is_empty_not_error() {
        let entries = convert_departures(&departures(r#"{"boards":[]}"#), now());
        assert!(entries.is_empty());
        let entries = convert_departures(&departures("{}"), now());
        assert!(entries.is_empty());
    }

    #[test]
    fn converts_stations_with_modes() {
        let response: StationsResponse = serde_json::from_str(
            r#"{"stations":[
                {"place":{"id":"10327_73","name":"Grand Central-42 St","location":{"lat":40.7527,"lng":-73.9772}},
                 "transports":[{"mode":"subway","name":"4"},{"mode":"subway","name":"5"},{"mode":"regionalTrain","name":"Hudson"}]},
                {"place":{"id":"bus_1","name":"E 42 St/Park Av","location":{"lat":40.7525,"lng":-73.9775}},
                 "transports":[{"mode":"bus","name":"M42"}]},
                {"place":{"id":"no_meta","name":"Mystery","location":{"lat":40.7526,"lng":-73.9770}}},
                {"place":{"name":"No Id","location":{"lat":40.75,"lng":-73.97}}},
                {"place":{"id":"no_loc","name":"Nowhere"}}
            ]}"#,
        )
        .unwrap();

        let candidates = convert_stations(&response);
        assert_eq!(candidates.len(), 3);

        assert_eq!(candidates[0].external_id.as_str(), "10327_73");
        assert_eq!(
            candidates[0].modes,
            vec![TransportMode::Subway, TransportMode::RegionalRail]
        );
        assert_eq!(candidates[1].modes, vec![TransportMode::Bus]);
        assert!(candidates[2].modes.is_empty());
    }
}
