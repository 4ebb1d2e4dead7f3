//! Candidate selection for a single catalog station.
//!
//! Candidates are first filtered by mode, then ranked by name agreement
//! and distance. Nothing is guessed: with no acceptable candidate the
//! station stays unmatched.

use std::cmp::Ordering;

use crate::crosswalk::MatchConfidence;
use crate::domain::{ExternalId, Station, TransportMode};

use super::discovery::Candidate;

/// Normalise a station name for comparison.
///
/// Lowercases, treats punctuation as word breaks, drops ordinal suffixes
/// (`42nd` -> `42`) and folds common street words to one spelling.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase().replace('&', " and ");
    let spaced: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    spaced
        .split_whitespace()
        .map(|word| match word {
            "street" => "st",
            "avenue" | "ave" => "av",
            "square" => "sq",
            "road" => "rd",
            "place" => "pl",
            "center" | "centre" => "ctr",
            other => strip_ordinal(other),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `42nd` -> `42`; anything else unchanged.
fn strip_ordinal(word: &str) -> &str {
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(digits) = word.strip_suffix(suffix)
            && !digits.is_empty()
            && digits.chars().all(|c| c.is_ascii_digit())
        {
            return digits;
        }
    }
    word
}

/// How well a candidate's name agrees with the station's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NameMatch {
    Exact,
    Partial,
    None,
}

/// Compare two names after normalisation.
///
/// Partial means one name's words appear as a contiguous run inside the
/// other's. Words are compared whole, so `18 Av` and `8 Av` do not match.
pub fn name_match(station_name: &str, candidate_name: &str) -> NameMatch {
    let a = normalize_name(station_name);
    let b = normalize_name(candidate_name);
    if a.is_empty() || b.is_empty() {
        return NameMatch::None;
    }
    if a == b {
        return NameMatch::Exact;
    }

    let a: Vec<&str> = a.split(' ').collect();
    let b: Vec<&str> = b.split(' ').collect();
    if contains_words(&a, &b) || contains_words(&b, &a) {
        NameMatch::Partial
    } else {
        NameMatch::None
    }
}

fn contains_words(haystack: &[&str], needle: &[&str]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Whether a candidate serving `modes` can stand in for a station of
/// `station_mode`.
///
/// Rail-like modes are always accepted; a bus, ferry or tram station also
/// accepts its own mode. Candidates without mode metadata never qualify.
pub fn accepts_modes(station_mode: &TransportMode, modes: &[TransportMode]) -> bool {
    modes
        .iter()
        .any(|m| m.is_rail_like() || (!station_mode.is_rail_like() && m == station_mode))
}

/// The candidate picked for a station.
#[derive(Debug, Clone, PartialEq)]
pub struct ChosenCandidate {
    pub external_id: ExternalId,
    pub name: String,
    pub distance_m: f64,
}

/// Outcome of ranking one station's candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub confidence: MatchConfidence,
    pub chosen: Option<ChosenCandidate>,
    /// Candidates returned by discovery.
    pub candidates: usize,
    /// Rejected for carrying no mode metadata.
    pub rejected_no_modes: usize,
    /// Rejected for serving only unacceptable modes.
    pub rejected_mode: usize,
}

/// Pick the best candidate for `station`.
///
/// Ranking: exact name, then partial name, then name-agnostic; within a
/// tier the nearest wins; equal distances fall back to the smaller
/// external id.
pub fn select_candidate(station: &Station, candidates: &[Candidate]) -> Selection {
    let mut rejected_no_modes = 0;
    let mut rejected_mode = 0;
    let mut best: Option<(NameMatch, f64, &Candidate)> = None;

    for candidate in candidates {
        if candidate.modes.is_empty() {
            rejected_no_modes += 1;
            continue;
        }
        if !accepts_modes(&station.mode, &candidate.modes) {
            rejected_mode += 1;
            continue;
        }

        let tier = name_match(&station.name, &candidate.name);
        let distance = station.coordinates.distance_m(&candidate.coordinates);

        let better = match &best {
            None => true,
            Some((best_tier, best_distance, best_candidate)) => {
                tier.cmp(best_tier)
                    .then_with(|| distance.total_cmp(best_distance))
                    .then_with(|| candidate.external_id.cmp(&best_candidate.external_id))
                    == Ordering::Less
            }
        };
        if better {
            best = Some((tier, distance, candidate));
        }
    }

    let (confidence, chosen) = match best {
        None => (MatchConfidence::Unmatched, None),
        Some((tier, distance_m, candidate)) => {
            let confidence = match tier {
                NameMatch::Exact => MatchConfidence::Exact,
                NameMatch::Partial => MatchConfidence::NameMatched,
                NameMatch::None => MatchConfidence::Proximity,
            };
            let chosen = ChosenCandidate {
                external_id: candidate.external_id.clone(),
                name: candidate.name.clone(),
                distance_m,
            };
            (confidence, Some(chosen))
        }
    };

    Selection {
        confidence,
        chosen,
        candidates: candidates.len(),
        rejected_no_modes,
        rejected_mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinates, StationId};

    fn station(name: &str, mode: TransportMode) -> Station {
        Station {
            id: StationId::parse("S1").unwrap(),
            name: name.to_string(),
            mode,
            coordinates: Coordinates::new(40.7527, -73.9772).unwrap(),
        }
    }

    fn candidate(id: &str, name: &str, lat: f64, lon: f64, modes: &[&str]) -> Candidate {
        Candidate {
            external_id: ExternalId::parse(id).unwrap(),
            name: name.to_string(),
            coordinates: Coordinates::new(lat, lon).unwrap(),
            modes: modes.iter().map(|m| TransportMode::parse(m)).collect(),
        }
    }

    #[test]
    fn normalisation() {
        assert_eq!(normalize_name("Times Square-42nd Street"), "times sq 42 st");
        assert_eq!(normalize_name("Times Sq - 42 St"), "times sq 42 st");
        assert_eq!(normalize_name("Lexington Ave/53rd St"), "lexington av 53 st");
        assert_eq!(normalize_name("  "), "");
        // "1st" is an ordinal but "st" alone is a word
        assert_eq!(normalize_name("1st Avenue"), "1 av");
    }

    #[test]
    fn name_tiers() {
        assert_eq!(name_match("Grand Central-42nd St", "Grand Central - 42 St"), NameMatch::Exact);
        assert_eq!(name_match("Grand Central-42nd St", "Grand Central"), NameMatch::Partial);
        assert_eq!(name_match("Fulton St", "Chambers St"), NameMatch::None);
        assert_eq!(name_match("", "Fulton St"), NameMatch::None);
        assert_eq!(name_match("42 St-Grand Central", "Grand Central"), NameMatch::Partial);
    }

    #[test]
    fn partial_names_compare_whole_words() {
        assert_eq!(name_match("18 Av", "8 Av"), NameMatch::None);
        assert_eq!(name_match("Canal St", "Al St"), NameMatch::None);
        assert_eq!(name_match("Central Park North", "Park"), NameMatch::Partial);
    }

    #[test]
    fn similar_number_does_not_outrank_nearer_stop() {
        let mut s = station("18 Av", TransportMode::Subway);
        s.coordinates = Coordinates::new(40.6201, -73.9903).unwrap();
        let candidates = vec![
            candidate("8av_far", "8 Av", 40.6350, -74.0115, &["subway"]),
            candidate("18av_near", "Bensonhurst", 40.6202, -73.9904, &["subway"]),
        ];

        let selection = select_candidate(&s, &candidates);
        assert_eq!(selection.confidence, MatchConfidence::Proximity);
        assert_eq!(selection.chosen.unwrap().external_id.as_str(), "18av_near");
    }

    #[test]
    fn mode_acceptance() {
        use TransportMode::*;
        assert!(accepts_modes(&Subway, &[Bus, Subway]));
        assert!(accepts_modes(&Subway, &[RegionalRail]));
        assert!(!accepts_modes(&Subway, &[Bus]));
        assert!(!accepts_modes(&Subway, &[]));
        assert!(accepts_modes(&Ferry, &[Ferry]));
        assert!(!accepts_modes(&Ferry, &[Bus]));
        assert!(!accepts_modes(&Subway, &[Other("walk".into())]));
    }

    #[test]
    fn bus_only_candidates_leave_subway_station_unmatched() {
        let s = station("Grand Central-42nd St", TransportMode::Subway);
        let candidates = vec![
            candidate("bus_1", "Grand Central-42nd St", 40.7527, -73.9772, &["bus"]),
            candidate("bus_2", "E 42 St/Park Av", 40.7525, -73.9775, &["bus"]),
        ];

        let selection = select_candidate(&s, &candidates);
        assert_eq!(selection.confidence, MatchConfidence::Unmatched);
        assert!(selection.chosen.is_none());
        assert_eq!(selection.rejected_mode, 2);
    }

    #[test]
    fn exact_name_wins_at_equal_distance() {
        let s = station("Grand Central-42nd St", TransportMode::Subway);
        let candidates = vec![
            candidate("a_other", "Shuttle Platform", 40.7530, -73.9770, &["subway"]),
            candidate("z_exact", "Grand Central - 42 St", 40.7530, -73.9770, &["subway"]),
        ];

        let selection = select_candidate(&s, &candidates);
        assert_eq!(selection.confidence, MatchConfidence::Exact);
        assert_eq!(selection.chosen.unwrap().external_id.as_str(), "z_exact");
    }

    #[test]
    fn partial_name_beats_nearer_unnamed() {
        let s = station("Grand Central-42nd St", TransportMode::Subway);
        let candidates = vec![
            candidate("near", "Madison Av", 40.7527, -73.9772, &["subway"]),
            candidate("far", "Grand Central", 40.7540, -73.9760, &["regionalTrain"]),
        ];

        let selection = select_candidate(&s, &candidates);
        assert_eq!(selection.confidence, MatchConfidence::NameMatched);
        assert_eq!(selection.chosen.unwrap().external_id.as_str(), "far");
    }

    #[test]
    fn nearest_without_name_is_proximity() {
        let s = station("Grand Central-42nd St", TransportMode::Subway);
        let candidates = vec![
            candidate("far", "Bryant Park", 40.7540, -73.9840, &["subway"]),
            candidate("near", "Madison Av", 40.7528, -73.9773, &["subway"]),
        ];

        let selection = select_candidate(&s, &candidates);
        assert_eq!(selection.confidence, MatchConfidence::Proximity);
        let chosen = selection.chosen.unwrap();
        assert_eq!(chosen.external_id.as_str(), "near");
        assert!(chosen.distance_m < 20.0);
    }

    #[test]
    fn equal_distance_ties_break_on_external_id() {
        let s = station("Fulton St", TransportMode::Subway);
        let candidates = vec![
            candidate("b", "Fulton St", 40.7101, -74.0070, &["subway"]),
            candidate("a", "Fulton St", 40.7101, -74.0070, &["subway"]),
        ];

        let selection = select_candidate(&s, &candidates);
        assert_eq!(selection.chosen.unwrap().external_id.as_str(), "a");
    }

    #[test]
    fn candidates_without_modes_are_rejected() {
        let s = station("Fulton St", TransportMode::Subway);
        let candidates = vec![candidate("x", "Fulton St", 40.7101, -74.0070, &[])];

        let selection = select_candidate(&s, &candidates);
        assert_eq!(selection.confidence, MatchConfidence::Unmatched);
        assert_eq!(selection.rejected_no_modes, 1);
        assert_eq!(selection.candidates, 1);
    }
}
