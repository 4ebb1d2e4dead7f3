//! Build audit report.
//!
//! Every catalog station gets one row describing what happened to it.
//! Rows that need a human (unmatched or proximity-only) are listed again
//! under `review` so they can be turned into manual overrides.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::crosswalk::{CrosswalkError, MatchConfidence, write_json};
use crate::domain::{ExternalId, StationId};

/// Why a station ended up unmatched or flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuditReason {
    /// Discovery returned nothing within the radius
    NoCandidates,
    /// Every candidate lacked mode metadata
    NoModeMetadata,
    /// Candidates existed but none served an acceptable mode
    ModeMismatch,
    /// Discovery failed after retries
    DiscoveryFailed,
    /// Matched only by proximity
    LowConfidence,
}

/// One station's outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationAudit {
    pub station_id: StationId,
    pub station_name: String,
    pub confidence: MatchConfidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<ExternalId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    pub candidates: usize,
    pub rejected_no_modes: usize,
    pub rejected_mode: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<AuditReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StationAudit {
    pub fn needs_review(&self) -> bool {
        self.confidence.needs_review()
    }
}

/// Totals per confidence level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub total: usize,
    pub exact: usize,
    pub name_matched: usize,
    pub proximity: usize,
    pub manual_override: usize,
    pub unmatched: usize,
}

impl AuditSummary {
    fn count(stations: &[StationAudit]) -> Self {
        let mut summary = Self {
            total: stations.len(),
            ..Self::default()
        };
        for audit in stations {
            match audit.confidence {
                MatchConfidence::Exact => summary.exact += 1,
                MatchConfidence::NameMatched => summary.name_matched += 1,
                MatchConfidence::Proximity => summary.proximity += 1,
                MatchConfidence::ManualOverride => summary.manual_override += 1,
                MatchConfidence::Unmatched => summary.unmatched += 1,
            }
        }
        summary
    }
}

/// Report written alongside the crosswalk.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    pub radius_m: u32,
    pub summary: AuditSummary,
    /// Ids of stations needing manual review, in catalog order.
    pub review: Vec<StationId>,
    pub stations: Vec<StationAudit>,
}

impl AuditReport {
    pub fn new(stations: Vec<StationAudit>, radius_m: u32, generated_at: DateTime<Utc>) -> Self {
        let review = stations
            .iter()
            .filter(|a| a.needs_review())
            .map(|a| a.station_id.clone())
            .collect();

        Self {
            generated_at,
            radius_m,
            summary: AuditSummary::count(&stations),
            review,
            stations,
        }
    }

    /// Rows needing manual review.
    pub fn review_items(&self) -> impl Iterator<Item = &StationAudit> {
        self.stations.iter().filter(|a| a.needs_review())
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CrosswalkError> {
        write_json(path.as_ref(), self)
    }
}
