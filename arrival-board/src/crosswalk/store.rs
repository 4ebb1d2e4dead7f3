//! Validated, read-only crosswalk store.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Serialize;

use crate::domain::{Complex, ExternalId, LineSet, Station, StationId};

use super::entry::{CrosswalkEntry, MatchConfidence};
use super::error::CrosswalkError;
use super::file::CrosswalkFile;

/// A complex together with its derived line set.
#[derive(Debug, Clone)]
pub(crate) struct ComplexRecord {
    pub(crate) complex: Complex,
    pub(crate) lines: LineSet,
}

/// Whether a logical id names a single stop or a complex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StationKind {
    Station,
    Complex,
}

/// Summary row for station listings and search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationSummary {
    pub id: StationId,
    pub name: String,
    pub kind: StationKind,
}

/// Immutable lookup tables built from a [`CrosswalkFile`].
///
/// Complexes refer to their constituents by id; every lookup is a hash
/// lookup into these tables. Once built the store is never mutated;
/// reloading builds a new store (see [`super::SharedCrosswalk`]).
#[derive(Debug, Clone, Default)]
pub struct CrosswalkStore {
    pub(crate) stations: HashMap<StationId, Station>,
    pub(crate) complexes: HashMap<StationId, ComplexRecord>,
    pub(crate) external: HashMap<StationId, ExternalId>,
    confidence: HashMap<StationId, MatchConfidence>,
    pub(crate) lines: HashMap<StationId, LineSet>,
}

impl CrosswalkStore {
    /// Load and validate a crosswalk file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CrosswalkError> {
        Self::from_file(CrosswalkFile::load(path)?)
    }

    /// Validate a parsed file and build the lookup tables.
    ///
    /// Rejects duplicate ids, complexes sharing an id with a station,
    /// complexes with fewer than two, unknown or repeated constituents,
    /// and crosswalk or line entries for stations not in the catalog.
    pub fn from_file(file: CrosswalkFile) -> Result<Self, CrosswalkError> {
        let mut stations = HashMap::with_capacity(file.stations.len());
        for station in file.stations {
            station
                .coordinates
                .validate()
                .map_err(|e| CrosswalkError::InvalidStation {
                    id: station.id.clone(),
                    source: e,
                })?;
            if stations.contains_key(&station.id) {
                return Err(CrosswalkError::DuplicateId(station.id));
            }
            stations.insert(station.id.clone(), station);
        }

        let mut external = HashMap::new();
        let mut confidence = HashMap::new();
        for entry in file.crosswalk {
            validate_entry(&entry, &stations)?;
            if confidence.contains_key(&entry.internal_id) {
                return Err(CrosswalkError::InvalidEntry {
                    id: entry.internal_id,
                    reason: "station has more than one crosswalk entry",
                });
            }
            confidence.insert(entry.internal_id.clone(), entry.confidence);
            if let Some(ext) = entry.external_id {
                external.insert(entry.internal_id, ext);
            }
        }

        let mut lines = HashMap::with_capacity(file.lines.len());
        for (id, set) in file.lines {
            if !stations.contains_key(&id) {
                return Err(CrosswalkError::UnknownReference {
                    context: "line map",
                    id,
                });
            }
            lines.insert(id, set);
        }

        let mut complexes = HashMap::with_capacity(file.complexes.len());
        for complex in file.complexes {
            if stations.contains_key(&complex.id) || complexes.contains_key(&complex.id) {
                return Err(CrosswalkError::DuplicateId(complex.id));
            }
            validate_complex(&complex, &stations)?;

            let mut aggregated = LineSet::new();
            for member in &complex.stations {
                if let Some(member_lines) = lines.get(member) {
                    aggregated.union_with(member_lines);
                }
            }
            complexes.insert(
                complex.id.clone(),
                ComplexRecord {
                    complex,
                    lines: aggregated,
                },
            );
        }

        Ok(Self {
            stations,
            complexes,
            external,
            confidence,
            lines,
        })
    }

    /// Look up a plain station.
    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    /// Look up a complex.
    pub fn complex(&self, id: &StationId) -> Option<&Complex> {
        self.complexes.get(id).map(|r| &r.complex)
    }

    /// External id for a plain station, if it was matched.
    pub fn external_id(&self, id: &StationId) -> Option<&ExternalId> {
        self.external.get(id)
    }

    /// Builder confidence recorded for a station, if any entry exists.
    pub fn confidence(&self, id: &StationId) -> Option<MatchConfidence> {
        self.confidence.get(id).copied()
    }

    /// Number of plain stations.
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// Number of complexes.
    pub fn complex_count(&self) -> usize {
        self.complexes.len()
    }

    /// Number of stations with a usable external id.
    pub fn mapped_count(&self) -> usize {
        self.external.len()
    }

    /// All logical stations: complexes first, then stations, each by name.
    pub fn list(&self) -> Vec<StationSummary> {
        let mut complexes: Vec<StationSummary> = self
            .complexes
            .values()
            .map(|r| StationSummary {
                id: r.complex.id.clone(),
                name: r.complex.name.clone(),
                kind: StationKind::Complex,
            })
            .collect();
        complexes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let mut stations: Vec<StationSummary> = self
            .stations
            .values()
            .map(|s| StationSummary {
                id: s.id.clone(),
                name: s.name.clone(),
                kind: StationKind::Station,
            })
            .collect();
        stations.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        complexes.extend(stations);
        complexes
    }

    /// Search logical stations by id or name.
    ///
    /// An exact (case-insensitive) id match comes first, followed by
    /// case-insensitive substring matches on name or id in listing order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<StationSummary> {
        let query = query.trim().to_lowercase();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let all = self.list();
        let (exact, rest): (Vec<_>, Vec<_>) = all
            .into_iter()
            .partition(|s| s.id.as_str().to_lowercase() == query);

        exact
            .into_iter()
            .chain(rest.into_iter().filter(|s| {
                s.name.to_lowercase().contains(&query)
                    || s.id.as_str().to_lowercase().contains(&query)
            }))
            .take(limit)
            .collect()
    }
}

fn validate_entry(
    entry: &CrosswalkEntry,
    stations: &HashMap<StationId, Station>,
) -> Result<(), CrosswalkError> {
    if !stations.contains_key(&entry.internal_id) {
        return Err(CrosswalkError::UnknownReference {
            context: "crosswalk entry",
            id: entry.internal_id.clone(),
        });
    }
    match (entry.confidence, &entry.external_id) {
        (MatchConfidence::Unmatched, Some(_)) => Err(CrosswalkError::InvalidEntry {
            id: entry.internal_id.clone(),
            reason: "unmatched entry must not carry an external id",
        }),
        (MatchConfidence::Unmatched, None) => Ok(()),
        (_, None) => Err(CrosswalkError::InvalidEntry {
            id: entry.internal_id.clone(),
            reason: "matched entry is missing its external id",
        }),
        (_, Some(_)) => Ok(()),
    }
}

fn validate_complex(
    complex: &Complex,
    stations: &HashMap<StationId, Station>,
) -> Result<(), CrosswalkError> {
    if complex.stations.len() < 2 {
        return Err(CrosswalkError::InvalidComplex {
            id: complex.id.clone(),
            reason: "needs at least 2 stations".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for member in &complex.stations {
        if !stations.contains_key(member) {
            return Err(CrosswalkError::InvalidComplex {
                id: complex.id.clone(),
                reason: format!("unknown constituent {member}"),
            });
        }
        if !seen.insert(member) {
            return Err(CrosswalkError::InvalidComplex {
                id: complex.id.clone(),
                reason: format!("constituent {member} listed twice"),
            });
        }
    }
    Ok(())
}
