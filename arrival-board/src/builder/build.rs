//! Offline crosswalk build.
//!
//! Stations are processed in batches; within a batch the discovery queries
//! run concurrently. Manual overrides are applied first and skip discovery.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::crosswalk::{
    CrosswalkEntry, CrosswalkError, CrosswalkFile, CrosswalkStore, MatchConfidence, read_json,
};
use crate::domain::{ExternalId, Station, StationId};

use super::audit::{AuditReason, AuditReport, StationAudit};
use super::config::BuilderConfig;
use super::discovery::{Candidate, DiscoveryError, DiscoverySource};
use super::error::BuildError;
use super::matching::select_candidate;

/// Explicit station → external id table. Always wins over discovery.
pub type Overrides = BTreeMap<StationId, ExternalId>;

/// Load an overrides table: a JSON object of `{"stationId": "externalId"}`.
pub fn load_overrides(path: impl AsRef<Path>) -> Result<Overrides, CrosswalkError> {
    read_json(path.as_ref())
}

/// Crosswalk entries and audit report from one build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// One entry per catalog station, in catalog order.
    pub entries: Vec<CrosswalkEntry>,
    pub report: AuditReport,
}

/// Matches catalog stations to discovery-source ids.
pub struct CrosswalkBuilder<D> {
    source: D,
    config: BuilderConfig,
}

impl<D: DiscoverySource> CrosswalkBuilder<D> {
    /// Create a builder, validating the config.
    pub fn new(source: D, config: BuilderConfig) -> Result<Self, BuildError> {
        config.validate()?;
        Ok(Self { source, config })
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    /// Match every station.
    pub async fn run(
        &self,
        stations: &[Station],
        overrides: &Overrides,
    ) -> Result<BuildOutput, BuildError> {
        if let Some(unknown) = overrides
            .keys()
            .find(|id| !stations.iter().any(|s| &s.id == *id))
        {
            return Err(BuildError::UnknownOverride(unknown.clone()));
        }

        let mut audits = Vec::with_capacity(stations.len());
        for (batch, chunk) in stations.chunks(self.config.batch_size).enumerate() {
            let futures: Vec<_> = chunk
                .iter()
                .map(|station| self.match_station(station, overrides))
                .collect();
            audits.extend(join_all(futures).await);

            info!(
                batch = batch + 1,
                done = audits.len(),
                total = stations.len(),
                "Discovery batch complete"
            );
        }

        let entries = audits
            .iter()
            .map(|audit| match &audit.external_id {
                Some(ext) => {
                    CrosswalkEntry::matched(audit.station_id.clone(), ext.clone(), audit.confidence)
                }
                None => CrosswalkEntry::unmatched(audit.station_id.clone()),
            })
            .collect();

        let report = AuditReport::new(audits, self.config.radius_m, Utc::now());
        info!(
            total = report.summary.total,
            exact = report.summary.exact,
            name_matched = report.summary.name_matched,
            proximity = report.summary.proximity,
            manual_override = report.summary.manual_override,
            unmatched = report.summary.unmatched,
            "Crosswalk build finished"
        );

        Ok(BuildOutput { entries, report })
    }

    /// Build a crosswalk file from a catalog, replacing its crosswalk
    /// section. The result is validated before it is returned.
    pub async fn build_file(
        &self,
        catalog: CrosswalkFile,
        overrides: &Overrides,
    ) -> Result<(CrosswalkFile, AuditReport), BuildError> {
        let output = self.run(&catalog.stations, overrides).await?;
        let file = CrosswalkFile {
            crosswalk: output.entries,
            ..catalog
        };
        CrosswalkStore::from_file(file.clone())?;
        Ok((file, output.report))
    }

    async fn match_station(&self, station: &Station, overrides: &Overrides) -> StationAudit {
        if let Some(ext) = overrides.get(&station.id) {
            debug!(station = %station.id, external_id = %ext, "Using manual override");
            return StationAudit {
                external_id: Some(ext.clone()),
                ..blank_audit(station, MatchConfidence::ManualOverride)
            };
        }

        let candidates = match self.discover(station).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(station = %station.id, error = %e, "Discovery failed");
                return StationAudit {
                    reason: Some(AuditReason::DiscoveryFailed),
                    error: Some(e.to_string()),
                    ..blank_audit(station, MatchConfidence::Unmatched)
                };
            }
        };

        let selection = select_candidate(station, &candidates);
        let reason = match selection.confidence {
            MatchConfidence::Unmatched if selection.candidates == 0 => {
                Some(AuditReason::NoCandidates)
            }
            MatchConfidence::Unmatched if selection.rejected_no_modes == selection.candidates => {
                Some(AuditReason::NoModeMetadata)
            }
            MatchConfidence::Unmatched => Some(AuditReason::ModeMismatch),
            MatchConfidence::Proximity => Some(AuditReason::LowConfidence),
            _ => None,
        };

        if selection.confidence == MatchConfidence::Unmatched {
            warn!(
                station = %station.id,
                name = %station.name,
                candidates = selection.candidates,
                "No acceptable candidate"
            );
        }

        let (external_id, matched_name, distance_m) = match selection.chosen {
            Some(chosen) => (
                Some(chosen.external_id),
                Some(chosen.name),
                Some(chosen.distance_m),
            ),
            None => (None, None, None),
        };

        StationAudit {
            external_id,
            matched_name,
            distance_m,
            candidates: selection.candidates,
            rejected_no_modes: selection.rejected_no_modes,
            rejected_mode: selection.rejected_mode,
            reason,
            ..blank_audit(station, selection.confidence)
        }
    }

    /// Query discovery, retrying rate-limit errors with exponential backoff.
    async fn discover(&self, station: &Station) -> Result<Vec<Candidate>, DiscoveryError> {
        let mut retry = 0;
        loop {
            match self
                .source
                .find_nearby(station.coordinates, self.config.radius_m)
                .await
            {
                Err(DiscoveryError::RateLimited) if retry + 1 < self.config.max_attempts => {
                    let delay = self.config.backoff(retry);
                    warn!(station = %station.id, retry = retry + 1, ?delay, "Rate limited, backing off");
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                other => return other,
            }
        }
    }
}

fn blank_audit(station: &Station, confidence: MatchConfidence) -> StationAudit {
    StationAudit {
        station_id: station.id.clone(),
        station_name: station.name.clone(),
        confidence,
        external_id: None,
        matched_name: None,
        distance_m: None,
        candidates: 0,
        rejected_no_modes: 0,
        rejected_mode: 0,
        reason: None,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinates, LineCode, TransportMode};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;

    fn sid(s: &str) -> StationId {
        StationId::parse(s).unwrap()
    }

    fn key(c: Coordinates) -> String {
        format!("{:.4},{:.4}", c.lat, c.lon)
    }

    fn station(id: &str, name: &str, lat: f64, lon: f64) -> Station {
        Station {
            id: sid(id),
            name: name.to_string(),
            mode: TransportMode::Subway,
            coordinates: Coordinates::new(lat, lon).unwrap(),
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

    /// Mock discovery source keyed by query coordinates.
    #[derive(Default)]
    struct MockDiscovery {
        results: HashMap<String, Vec<Candidate>>,
        errors: HashMap<String, DiscoveryError>,
        /// Rate-limit this many calls per location before answering.
        rate_limits: Mutex<HashMap<String, u32>>,
        calls: AtomicUsize,
    }

    impl MockDiscovery {
        fn with(mut self, lat: f64, lon: f64, candidates: Vec<Candidate>) -> Self {
            self.results
                .insert(key(Coordinates::new(lat, lon).unwrap()), candidates);
            self
        }

        fn failing(mut self, lat: f64, lon: f64, err: DiscoveryError) -> Self {
            self.errors.insert(key(Coordinates::new(lat, lon).unwrap()), err);
            self
        }

        fn rate_limited(self, lat: f64, lon: f64, times: u32) -> Self {
            self.rate_limits
                .lock()
                .unwrap()
                .insert(key(Coordinates::new(lat, lon).unwrap()), times);
            self
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DiscoverySource for MockDiscovery {
        async fn find_nearby(
            &self,
            coordinates: Coordinates,
            _radius_m: u32,
        ) -> Result<Vec<Candidate>, DiscoveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let k = key(coordinates);

            {
                let mut limits = self.rate_limits.lock().unwrap();
                if let Some(remaining) = limits.get_mut(&k)
                    && *remaining > 0
                {
                    *remaining -= 1;
                    return Err(DiscoveryError::RateLimited);
                }
            }

            if let Some(err) = self.errors.get(&k) {
                return Err(err.clone());
            }
            Ok(self.results.get(&k).cloned().unwrap_or_default())
        }
    }

    fn builder(source: MockDiscovery) -> CrosswalkBuilder<MockDiscovery> {
        let config = BuilderConfig::default()
            .with_batch_size(2)
            .with_backoff(Duration::from_millis(1));
        CrosswalkBuilder::new(source, config).unwrap()
    }

    #[tokio::test]
    async fn exact_name_match_at_same_coordinates() {
        let source = MockDiscovery::default().with(
            40.7527,
            -73.9772,
            vec![
                candidate("other", "Vanderbilt Av", 40.7527, -73.9772, &["subway"]),
                candidate("gc", "Grand Central - 42 St", 40.7527, -73.9772, &["subway"]),
            ],
        );
        let b = builder(source);

        let out = b
            .run(
                &[station("631", "Grand Central-42nd St", 40.7527, -73.9772)],
                &Overrides::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            out.entries,
            vec![CrosswalkEntry::matched(
                sid("631"),
                ExternalId::parse("gc").unwrap(),
                MatchConfidence::Exact
            )]
        );
        assert!(out.report.review.is_empty());
    }

    #[tokio::test]
    async fn bus_only_candidates_are_unmatched_and_flagged() {
        let source = MockDiscovery::default().with(
            40.7527,
            -73.9772,
            vec![candidate("bus", "Grand Central", 40.7527, -73.9772, &["bus"])],
        );
        let b = builder(source);

        let out = b
            .run(
                &[station("631", "Grand Central-42nd St", 40.7527, -73.9772)],
                &Overrides::new(),
            )
            .await
            .unwrap();

        assert_eq!(out.entries, vec![CrosswalkEntry::unmatched(sid("631"))]);
        assert_eq!(out.report.review, vec![sid("631")]);
        assert_eq!(out.report.stations[0].reason, Some(AuditReason::ModeMismatch));
    }

    #[tokio::test]
    async fn unmatched_reasons() {
        let source = MockDiscovery::default().with(
            40.70,
            -74.00,
            vec![candidate("x", "Somewhere", 40.70, -74.00, &[])],
        );
        let b = builder(source);

        let out = b
            .run(
                &[
                    station("1", "Nowhere", 40.60, -74.00),
                    station("2", "Somewhere", 40.70, -74.00),
                ],
                &Overrides::new(),
            )
            .await
            .unwrap();

        let reasons: Vec<_> = out.report.stations.iter().map(|a| a.reason).collect();
        assert_eq!(
            reasons,
            vec![
                Some(AuditReason::NoCandidates),
                Some(AuditReason::NoModeMetadata)
            ]
        );
    }

    #[tokio::test]
    async fn override_wins_and_skips_discovery() {
        let source = MockDiscovery::default().with(
            40.7527,
            -73.9772,
            vec![candidate("gc", "Grand Central", 40.7527, -73.9772, &["subway"])],
        );
        let b = builder(source);

        let mut overrides = Overrides::new();
        overrides.insert(sid("723"), ExternalId::parse("10327_73").unwrap());

        let out = b
            .run(
                &[
                    station("723", "Grand Central-42nd St", 40.7527, -73.9772),
                    station("631", "Grand Central-42nd St", 40.7527, -73.9772),
                ],
                &overrides,
            )
            .await
            .unwrap();

        assert_eq!(out.entries[0].confidence, MatchConfidence::ManualOverride);
        assert_eq!(out.entries[0].external_id.as_ref().unwrap().as_str(), "10327_73");
        assert_eq!(out.entries[1].confidence, MatchConfidence::NameMatched);
        assert_eq!(b.source().call_count(), 1);
        assert_eq!(out.report.summary.manual_override, 1);
    }

    #[tokio::test]
    async fn override_for_unknown_station_is_rejected() {
        let b = builder(MockDiscovery::default());
        let mut overrides = Overrides::new();
        overrides.insert(sid("999"), ExternalId::parse("x").unwrap());

        let err = b
            .run(&[station("1", "A", 40.7, -74.0)], &overrides)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::UnknownOverride(id) if id == sid("999")));
    }

    #[tokio::test]
    async fn rate_limit_is_retried() {
        let source = MockDiscovery::default()
            .with(
                40.7101,
                -74.0070,
                vec![candidate("fulton", "Fulton St", 40.7101, -74.0070, &["subway"])],
            )
            .rate_limited(40.7101, -74.0070, 2);
        let b = builder(source);

        let out = b
            .run(&[station("A27", "Fulton St", 40.7101, -74.0070)], &Overrides::new())
            .await
            .unwrap();

        assert_eq!(out.entries[0].confidence, MatchConfidence::Exact);
        assert_eq!(b.source().call_count(), 3);
    }

    #[tokio::test]
    async fn persistent_rate_limit_gives_up() {
        let source = MockDiscovery::default().rate_limited(40.7101, -74.0070, 10);
        let b = builder(source);

        let out = b
            .run(&[station("A27", "Fulton St", 40.7101, -74.0070)], &Overrides::new())
            .await
            .unwrap();

        let audit = &out.report.stations[0];
        assert_eq!(audit.confidence, MatchConfidence::Unmatched);
        assert_eq!(audit.reason, Some(AuditReason::DiscoveryFailed));
        assert_eq!(b.source().call_count(), 3);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let source = MockDiscovery::default().failing(
            40.7101,
            -74.0070,
            DiscoveryError::Upstream("500".into()),
        );
        let b = builder(source);

        let out = b
            .run(&[station("A27", "Fulton St", 40.7101, -74.0070)], &Overrides::new())
            .await
            .unwrap();

        assert_eq!(out.report.stations[0].reason, Some(AuditReason::DiscoveryFailed));
        assert!(out.report.stations[0].error.as_ref().unwrap().contains("500"));
        assert_eq!(b.source().call_count(), 1);
    }

    #[tokio::test]
    async fn batches_preserve_catalog_order() {
        let mut source = MockDiscovery::default();
        let mut stations = Vec::new();
        for i in 0..5 {
            let lat = 40.70 + f64::from(i) * 0.01;
            let name = format!("Station {i}");
            source = source.with(
                lat,
                -74.0,
                vec![candidate(&format!("ext{i}"), &name, lat, -74.0, &["subway"])],
            );
            stations.push(station(&format!("s{i}"), &name, lat, -74.0));
        }
        let b = builder(source);

        let out = b.run(&stations, &Overrides::new()).await.unwrap();

        let ids: Vec<&str> = out
            .entries
            .iter()
            .map(|e| e.external_id.as_ref().unwrap().as_str())
            .collect();
        assert_eq!(ids, vec!["ext0", "ext1", "ext2", "ext3", "ext4"]);
    }

    #[tokio::test]
    async fn build_file_produces_loadable_crosswalk() {
        let source = MockDiscovery::default()
            .with(
                40.7101,
                -74.0070,
                vec![candidate("10327_100", "Fulton St", 40.7101, -74.0070, &["subway"])],
            )
            .with(
                40.7126,
                -74.0099,
                vec![candidate("10327_322", "World Trade Center", 40.7126, -74.0099, &["rail"])],
            );
        let b = builder(source);

        let mut lines = BTreeMap::new();
        lines.insert(sid("A27"), [LineCode::parse("A").unwrap()].into_iter().collect());
        let catalog = CrosswalkFile {
            stations: vec![
                station("A27", "Fulton St", 40.7101, -74.0070),
                station("WTC_PATH", "World Trade Center", 40.7126, -74.0099),
            ],
            complexes: vec![crate::domain::Complex {
                id: sid("WTC"),
                name: "World Trade Center".to_string(),
                stations: vec![sid("A27"), sid("WTC_PATH")],
            }],
            crosswalk: vec![],
            lines,
        };

        let (file, report) = b.build_file(catalog, &Overrides::new()).await.unwrap();
        assert_eq!(report.summary.exact, 2);

        let dir = tempdir().unwrap();
        let path = dir.path().join("crosswalk.json");
        file.save(&path).unwrap();

        let store = CrosswalkStore::load(&path).unwrap();
        let resolution = store.resolve(&sid("WTC")).unwrap();
        assert_eq!(resolution.sources.len(), 2);
    }

    #[test]
    fn overrides_load_from_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("overrides.json");
        std::fs::write(&path, r#"{"723": "10327_73", "901": "10327_73"}"#).unwrap();

        let overrides = load_overrides(&path).unwrap();
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides[&sid("901")].as_str(), "10327_73");
    }
}
