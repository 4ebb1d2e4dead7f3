//! Station identity resolution.
//!
//! Turns a logical id (plain station or complex) into the external ids
//! that must be queried, plus the static lines to fall back on.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::{ExternalId, LineSet, StationId};

use super::store::{CrosswalkStore, StationKind};

/// Errors from resolving a logical station id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Neither a station nor a complex has this id
    #[error("unknown station: {0}")]
    UnknownStation(StationId),
}

/// One external source to query, tagged with the constituent it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSource {
    pub station_id: StationId,
    pub external_id: ExternalId,
}

/// Result of resolving a logical id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub logical_id: StationId,
    pub kind: StationKind,
    /// Matched sources in constituent order. Empty if nothing is mapped.
    pub sources: Vec<ResolvedSource>,
    pub static_lines: LineSet,
}

impl Resolution {
    /// External ids to query, in order.
    pub fn external_ids(&self) -> impl Iterator<Item = &ExternalId> {
        self.sources.iter().map(|s| &s.external_id)
    }

    /// Whether at least one live source is mapped.
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}

impl CrosswalkStore {
    /// Resolve a logical id to its external sources and static lines.
    ///
    /// A complex silently drops constituents without a crosswalk match, so
    /// it degrades to the matched subset instead of failing. When several
    /// constituents map to the same external id, only the first is kept.
    pub fn resolve(&self, logical_id: &StationId) -> Result<Resolution, ResolveError> {
        if self.stations.contains_key(logical_id) {
            let sources = self
                .external
                .get(logical_id)
                .map(|ext| ResolvedSource {
                    station_id: logical_id.clone(),
                    external_id: ext.clone(),
                })
                .into_iter()
                .collect();

            return Ok(Resolution {
                logical_id: logical_id.clone(),
                kind: StationKind::Station,
                sources,
                static_lines: self.lines.get(logical_id).cloned().unwrap_or_default(),
            });
        }

        if let Some(record) = self.complexes.get(logical_id) {
            let mut seen = HashSet::new();
            let sources = record
                .complex
                .stations
                .iter()
                .filter_map(|member| {
                    self.external.get(member).map(|ext| ResolvedSource {
                        station_id: member.clone(),
                        external_id: ext.clone(),
                    })
                })
                // Constituents sharing one external stop are queried once
                .filter(|source| seen.insert(source.external_id.clone()))
                .collect();

            return Ok(Resolution {
                logical_id: logical_id.clone(),
                kind: StationKind::Complex,
                sources,
                static_lines: record.lines.clone(),
            });
        }

        Err(ResolveError::UnknownStation(logical_id.clone()))
    }

    /// Static fallback: the lines served at a station or complex.
    pub fn static_lines(&self, logical_id: &StationId) -> Result<LineSet, ResolveError> {
        if self.stations.contains_key(logical_id) {
            return Ok(self.lines.get(logical_id).cloned().unwrap_or_default());
        }
        self.complexes
            .get(logical_id)
            .map(|record| record.lines.clone())
            .ok_or_else(|| ResolveError::UnknownStation(logical_id.clone()))
    }
}
