//! HERE Transit API v8 HTTP client.
//!
//! Provides async methods for the departures board and the station
//! proximity search. Handles authentication, rate limiting, and conversion
//! to domain types.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::trace;

use crate::aggregator::{ArrivalSource, SourceError};
use crate::builder::{Candidate, DiscoveryError, DiscoverySource};
use crate::domain::{BoardEntry, Coordinates, ExternalId};

use super::convert::{convert_departures, convert_stations};
use super::error::HereError;
use super::types::{DeparturesResponse, StationsResponse};

/// Default departures endpoint.
const DEFAULT_DEPARTURES_URL: &str = "https://transit.hereapi.com/v8/departures";

/// Default station search endpoint.
const DEFAULT_STATIONS_URL: &str = "https://transit.hereapi.com/v8/stations";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Maximum characters of a response body kept in a JSON error.
const ERROR_BODY_CHARS: usize = 500;

/// Configuration for the HERE client.
#[derive(Debug, Clone)]
pub struct HereConfig {
    /// API key, sent as the `apiKey` query parameter
    pub api_key: String,
    /// Departures endpoint (defaults to production HERE)
    pub departures_url: String,
    /// Station search endpoint (defaults to production HERE)
    pub stations_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl HereConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            departures_url: DEFAULT_DEPARTURES_URL.to_string(),
            stations_url: DEFAULT_STATIONS_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Point both endpoints at a different host (for testing).
    ///
    /// `base` is the prefix before `/v8/...`, e.g. `http://localhost:8080`.
    pub fn with_base_url(mut self, base: impl AsRef<str>) -> Self {
        let base = base.as_ref().trim_end_matches('/');
        self.departures_url = format!("{base}/v8/departures");
        self.stations_url = format!("{base}/v8/stations");
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HERE Transit API client.
///
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
/// Cloning is cheap and clones share the semaphore.
#[derive(Debug, Clone)]
pub struct HereClient {
    http: reqwest::Client,
    api_key: String,
    departures_url: String,
    stations_url: String,
    semaphore: Arc<Semaphore>,
}

impl HereClient {
    /// Create a new HERE client with the given configuration.
    pub fn new(config: HereConfig) -> Result<Self, HereError> {
        if config.api_key.trim().is_empty() {
            return Err(HereError::ApiError {
                status: 0,
                message: "API key must not be empty".to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key,
            departures_url: config.departures_url,
            stations_url: config.stations_url,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Fetch the raw departures board for one HERE station id.
    pub async fn get_departures_raw(
        &self,
        external_id: &ExternalId,
    ) -> Result<DeparturesResponse, HereError> {
        self.get_json(
            &self.departures_url,
            &[
                ("ids", external_id.as_str().to_string()),
                ("apiKey", self.api_key.clone()),
            ],
        )
        .await
    }

    /// Fetch departures for one HERE station id, as minutes from `now`.
    pub async fn get_departures(
        &self,
        external_id: &ExternalId,
        now: DateTime<Utc>,
    ) -> Result<Vec<BoardEntry>, HereError> {
        let response = self.get_departures_raw(external_id).await?;
        Ok(convert_departures(&response, now))
    }

    /// Search for stations within `radius_m` metres of `coordinates`.
    pub async fn find_stations(
        &self,
        coordinates: Coordinates,
        radius_m: u32,
    ) -> Result<Vec<Candidate>, HereError> {
        let area = format!("{},{};r={}", coordinates.lat, coordinates.lon, radius_m);
        let response: StationsResponse = self
            .get_json(
                &self.stations_url,
                &[
                    ("in", area),
                    ("return", "transport".to_string()),
                    ("apiKey", self.api_key.clone()),
                ],
            )
            .await?;
        Ok(convert_stations(&response))
    }

    /// Issue a GET under the semaphore and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, HereError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| HereError::ApiError {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        trace!(url, "HERE request");
        let response = self.http.get(url).query(query).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(HereError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(HereError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HereError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| HereError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(ERROR_BODY_CHARS).collect()),
        })
    }
}

impl ArrivalSource for HereClient {
    async fn fetch_board(&self, external_id: &ExternalId) -> Result<Vec<BoardEntry>, SourceError> {
        Ok(self.get_departures(external_id, Utc::now()).await?)
    }
}

impl DiscoverySource for HereClient {
    async fn find_nearby(
        &self,
        coordinates: Coordinates,
        radius_m: u32,
    ) -> Result<Vec<Candidate>, DiscoveryError> {
        Ok(self.find_stations(coordinates, radius_m).await?)
    }
}
