//! Process settings read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::aggregator::AggregatorConfig;
use crate::here::HereConfig;

/// Default location of the crosswalk file.
const DEFAULT_CROSSWALK_PATH: &str = "data/crosswalk.json";

/// Default per-query timeout in seconds.
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 8;

/// Default crosswalk reload interval in seconds.
const DEFAULT_RELOAD_INTERVAL_SECS: u64 = 300;

/// Errors from reading settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be an RFC 3339 timestamp, got {value:?}")]
    InvalidTime { var: &'static str, value: String },

    #[error("HERE_API_KEY is not set")]
    MissingApiKey,
}

/// Settings for the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// `HERE_API_KEY`
    pub here_api_key: Option<String>,
    /// `CROSSWALK_PATH`
    pub crosswalk_path: PathBuf,
    /// `MOCK_BOARDS_DIR`: serve boards from files instead of HERE
    pub mock_boards_dir: Option<PathBuf>,
    /// `MOCK_REFERENCE_TIME`: the instant mock boards are read against
    pub mock_reference_time: Option<DateTime<Utc>>,
    /// `QUERY_TIMEOUT_SECS`; must be at least 1
    pub query_timeout: Duration,
    /// `RELOAD_INTERVAL_SECS`; `0` disables reloading
    pub reload_interval: Option<Duration>,
}

impl Settings {
    /// Read settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read settings through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let number = |var: &'static str, default: u64| -> Result<u64, ConfigError> {
            match get(var) {
                None => Ok(default),
                Some(value) => value
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber { var, value }),
            }
        };

        let query_timeout_secs = number("QUERY_TIMEOUT_SECS", DEFAULT_QUERY_TIMEOUT_SECS)?;
        if query_timeout_secs == 0 {
            return Err(ConfigError::InvalidNumber {
                var: "QUERY_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        let reload_secs = number("RELOAD_INTERVAL_SECS", DEFAULT_RELOAD_INTERVAL_SECS)?;

        let var = "MOCK_REFERENCE_TIME";
        let mock_reference_time = get(var)
            .map(|value| {
                DateTime::parse_from_rfc3339(&value)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|_| ConfigError::InvalidTime { var, value })
            })
            .transpose()?;

        Ok(Self {
            here_api_key: get("HERE_API_KEY"),
            crosswalk_path: get("CROSSWALK_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CROSSWALK_PATH)),
            mock_boards_dir: get("MOCK_BOARDS_DIR").map(PathBuf::from),
            mock_reference_time,
            query_timeout: Duration::from_secs(query_timeout_secs),
            reload_interval: (reload_secs > 0).then(|| Duration::from_secs(reload_secs)),
        })
    }

    /// HERE client config, if an API key is set.
    pub fn here_config(&self) -> Result<HereConfig, ConfigError> {
        self.here_api_key
            .as_deref()
            .map(HereConfig::new)
            .ok_or(ConfigError::MissingApiKey)
    }

    /// Aggregator config with the configured timeout.
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig::default().with_query_timeout(self.query_timeout)
    }
}
