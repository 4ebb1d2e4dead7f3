//! Crosswalk entries and match confidence.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{ExternalId, StationId};

/// How an external id was chosen for a station.
///
/// Only the builder's audit trail looks at this; arrival queries never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchConfidence {
    /// Nearest candidate whose normalised name equals the station's.
    Exact,
    /// Nearest candidate whose name contains, or is contained in, the station's.
    NameMatched,
    /// Nearest mode-compatible candidate with no name agreement.
    Proximity,
    /// Taken from the manual override table.
    ManualOverride,
    /// No acceptable candidate; the station has no external id.
    Unmatched,
}

impl MatchConfidence {
    /// Whether a human should look at this result before trusting it.
    pub fn needs_review(&self) -> bool {
        matches!(self, MatchConfidence::Proximity | MatchConfidence::Unmatched)
    }
}

impl fmt::Display for MatchConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchConfidence::Exact => "exact",
            MatchConfidence::NameMatched => "nameMatched",
            MatchConfidence::Proximity => "proximity",
            MatchConfidence::ManualOverride => "manualOverride",
            MatchConfidence::Unmatched => "unmatched",
        };
        f.write_str(s)
    }
}

/// Mapping of one internal station to the arrival source's identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrosswalkEntry {
    pub internal_id: StationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<ExternalId>,
    pub confidence: MatchConfidence,
}

impl CrosswalkEntry {
    /// A matched entry.
    pub fn matched(
        internal_id: StationId,
        external_id: ExternalId,
        confidence: MatchConfidence,
    ) -> Self {
        Self {
            internal_id,
            external_id: Some(external_id),
            confidence,
        }
    }

    /// An entry recording that no match was found.
    pub fn unmatched(internal_id: StationId) -> Self {
        Self {
            internal_id,
            external_id: None,
            confidence: MatchConfidence::Unmatched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_serializes_camel_case() {
        assert_eq!(
            serde_json::to_string(&MatchConfidence::NameMatched).unwrap(),
            "\"nameMatched\""
        );
        assert_eq!(
            serde_json::from_str::<MatchConfidence>("\"manualOverride\"").unwrap(),
            MatchConfidence::ManualOverride
        );
        assert_eq!(MatchConfidence::Proximity.to_string(), "proximity");
    }

    #[test]
    fn review_flags() {
        assert!(MatchConfidence::Unmatched.needs_review());
        assert!(MatchConfidence::Proximity.needs_review());
        assert!(!MatchConfidence::Exact.needs_review());
        assert!(!MatchConfidence::ManualOverride.needs_review());
    }

    #[test]
    fn unmatched_entry_omits_external_id() {
        let entry = CrosswalkEntry::unmatched(StationId::parse("A38").unwrap());
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"internalId":"A38","confidence":"unmatched"}"#);
    }
}
