//! Concurrent arrival aggregation.
//!
//! A request resolves its logical id against one crosswalk snapshot, fans
//! out one query per external stop, waits for every query to settle, then
//! merges, sorts and filters. Queries run as plain futures joined together,
//! so dropping the request future cancels all of them.

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::crosswalk::{Resolution, ResolveError, ResolvedSource, SharedCrosswalk};
use crate::domain::{ArrivalRecord, BoardEntry, DomainError, ExternalId, LineSet, StationId, TimeWindow};

use super::config::AggregatorConfig;
use super::merge::{apply_line_filter, apply_window, merge_boards, observed_lines};
use super::source::{ArrivalSource, SourceError};

/// A query against one external stop that did not produce a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformFailure {
    pub station_id: StationId,
    pub external_id: ExternalId,
    #[serde(serialize_with = "serialize_display")]
    pub error: SourceError,
}

fn serialize_display<S: serde::Serializer>(
    error: &SourceError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Error from an arrivals request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArrivalError {
    /// Neither a station nor a complex has this id
    #[error("unknown station: {0}")]
    UnknownStation(StationId),

    /// The id is known but none of its stops has a crosswalk match
    #[error("no arrival source mapped for {0}")]
    NoSourceMapped(StationId),

    /// Every queried stop failed
    #[error("all {} arrival sources failed for {station}", failures.len())]
    UpstreamUnavailable {
        station: StationId,
        failures: Vec<PlatformFailure>,
    },

    /// `min_minutes > max_minutes`
    #[error("invalid time window: min {min} > max {max}")]
    InvalidWindow { min: u32, max: u32 },
}

impl From<ResolveError> for ArrivalError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::UnknownStation(id) => ArrivalError::UnknownStation(id),
        }
    }
}

/// What to return for an arrivals request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalQuery {
    pub window: TimeWindow,
    /// Restrict results to these lines. Applied after the window.
    pub lines: Option<LineSet>,
    /// Cap on returned records. Falls back to the configured limit.
    pub limit: Option<usize>,
}

impl ArrivalQuery {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            lines: None,
            limit: None,
        }
    }

    pub fn with_lines(mut self, lines: LineSet) -> Self {
        self.lines = Some(lines);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Result of an arrivals request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrivalResult {
    pub logical_id: StationId,

    /// Filtered records, sorted by minutes then line.
    pub records: Vec<ArrivalRecord>,

    /// Whether the merged board, before any filtering, carried a line.
    /// Callers use this to decide whether to show static lines instead.
    pub any_live_line_observed: bool,

    /// Lines seen on the merged board before filtering.
    pub live_lines: LineSet,

    /// Stops that failed while at least one other succeeded.
    pub failures: Vec<PlatformFailure>,
}

/// Resolves logical stations and aggregates their live boards.
pub struct Aggregator<S> {
    source: S,
    crosswalk: SharedCrosswalk,
    config: AggregatorConfig,
}

impl<S: ArrivalSource> Aggregator<S> {
    pub fn new(source: S, crosswalk: SharedCrosswalk, config: AggregatorConfig) -> Self {
        Self {
            source,
            crosswalk,
            config,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn crosswalk(&self) -> &SharedCrosswalk {
        &self.crosswalk
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Resolve a logical id against the current crosswalk.
    pub async fn resolve(&self, logical_id: &StationId) -> Result<Resolution, ResolveError> {
        self.crosswalk.snapshot().await.resolve(logical_id)
    }

    /// Static lines served at a station or complex.
    pub async fn get_static_lines(&self, logical_id: &StationId) -> Result<LineSet, ResolveError> {
        self.crosswalk.snapshot().await.static_lines(logical_id)
    }

    /// Arrivals within `window`, using the configured result limit.
    pub async fn get_arrivals(
        &self,
        logical_id: &StationId,
        window: TimeWindow,
    ) -> Result<ArrivalResult, ArrivalError> {
        self.query(logical_id, ArrivalQuery::new(window)).await
    }

    /// Arrivals for a full query.
    pub async fn query(
        &self,
        logical_id: &StationId,
        query: ArrivalQuery,
    ) -> Result<ArrivalResult, ArrivalError> {
        if let Err(DomainError::InvalidWindow { min, max }) = query.window.validate() {
            return Err(ArrivalError::InvalidWindow { min, max });
        }

        let resolution = self.resolve(logical_id).await?;
        if !resolution.has_sources() {
            return Err(ArrivalError::NoSourceMapped(logical_id.clone()));
        }

        let (boards, failures) = self.fetch_all(&resolution.sources).await;

        if boards.is_empty() {
            return Err(ArrivalError::UpstreamUnavailable {
                station: logical_id.clone(),
                failures,
            });
        }

        let merged = merge_boards(boards);
        let live_lines = observed_lines(&merged);
        let total = merged.len();

        let mut records = apply_window(merged, query.window);
        if let Some(lines) = &query.lines {
            records = apply_line_filter(records, lines);
        }
        if let Some(limit) = query.limit.or(self.config.result_limit) {
            records.truncate(limit);
        }

        debug!(
            station = %logical_id,
            sources = resolution.sources.len(),
            failed = failures.len(),
            merged = total,
            returned = records.len(),
            "Aggregated arrivals"
        );

        Ok(ArrivalResult {
            logical_id: logical_id.clone(),
            records,
            any_live_line_observed: !live_lines.is_empty(),
            live_lines,
            failures,
        })
    }

    /// Live lines if the result saw any, else the static lines.
    pub async fn lines_for_display(
        &self,
        logical_id: &StationId,
        result: &ArrivalResult,
    ) -> Result<LineSet, ResolveError> {
        if result.any_live_line_observed {
            return Ok(result.live_lines.clone());
        }
        self.get_static_lines(logical_id).await
    }

    /// Query every source concurrently, each under its own timeout.
    ///
    /// Successful boards come back in source order.
    async fn fetch_all(
        &self,
        sources: &[ResolvedSource],
    ) -> (Vec<(StationId, Vec<BoardEntry>)>, Vec<PlatformFailure>) {
        let timeout = self.config.query_timeout();

        let futures: Vec<_> = sources
            .iter()
            .map(|src| async move {
                let result =
                    match tokio::time::timeout(timeout, self.source.fetch_board(&src.external_id))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(SourceError::Timeout(timeout)),
                    };
                (src, result)
            })
            .collect();

        let results = join_all(futures).await;

        let mut boards = Vec::new();
        let mut failures = Vec::new();
        for (src, result) in results {
            match result {
                Ok(entries) => boards.push((src.station_id.clone(), entries)),
                Err(e) => {
                    warn!(
                        station = %src.station_id,
                        external_id = %src.external_id,
                        error = %e,
                        "Failed to fetch board"
                    );
                    failures.push(PlatformFailure {
                        station_id: src.station_id.clone(),
                        external_id: src.external_id.clone(),
                        error: e,
                    });
                }
            }
        }

        (boards, failures)
    }
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod tests;
