//! The real-time arrival source abstraction.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{BoardEntry, ExternalId};

/// Error from fetching a single board.
///
/// An empty board is `Ok(vec![])`, never an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The source answered with an error or could not be reached
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The source answered but the payload could not be decoded
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// No answer within the per-query timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Trait for fetching the live departures board of one external stop.
///
/// This abstraction allows the aggregator to be tested with mock data.
pub trait ArrivalSource: Send + Sync {
    /// Fetch upcoming arrivals at `external_id`.
    fn fetch_board(
        &self,
        external_id: &ExternalId,
    ) -> impl Future<Output = Result<Vec<BoardEntry>, SourceError>> + Send;
}

impl<S: ArrivalSource> ArrivalSource for Arc<S> {
    async fn fetch_board(&self, external_id: &ExternalId) -> Result<Vec<BoardEntry>, SourceError> {
        (**self).fetch_board(external_id).await
    }
}
