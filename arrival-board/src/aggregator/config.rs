//! Aggregator configuration.

use std::time::Duration;

use crate::domain::TimeWindow;

/// Configuration parameters for arrival aggregation.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Per-query timeout for each external stop (milliseconds).
    pub query_timeout_ms: u64,

    /// Window used when the caller doesn't supply one.
    pub default_window: TimeWindow,

    /// Maximum number of records to return, applied after filtering.
    /// `None` returns everything in the window.
    pub result_limit: Option<usize>,
}

impl AggregatorConfig {
    /// Returns the per-query timeout as a Duration.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Set the per-query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the window used when the caller leaves a bound out.
    pub fn with_default_window(mut self, window: TimeWindow) -> Self {
        self.default_window = window;
        self
    }

    /// Window from optional request bounds, filling gaps from the default.
    pub fn window(&self, min_minutes: Option<u32>, max_minutes: Option<u32>) -> TimeWindow {
        TimeWindow::new(
            min_minutes.unwrap_or(self.default_window.min_minutes),
            max_minutes.unwrap_or(self.default_window.max_minutes),
        )
    }

    /// Set the default result limit.
    pub fn with_result_limit(mut self, limit: usize) -> Self {
        self.result_limit = Some(limit);
        self
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 8_000,
            default_window: TimeWindow::default(),
            result_limit: None,
        }
    }
}
