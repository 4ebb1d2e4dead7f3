//! Caching layer for arrival boards.
//!
//! Boards are cached per external stop for a short TTL so several displays
//! polling the same station, or overlapping complexes, share one upstream
//! query. Minutes in a cached board are as of the fetch, so the TTL should
//! stay well under a minute.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::aggregator::{ArrivalSource, SourceError};
use crate::domain::{BoardEntry, ExternalId};

/// Cached board entry.
type CachedBoard = Arc<Vec<BoardEntry>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(20),
            max_capacity: 1000,
        }
    }
}

/// Arrival source with caching.
///
/// Wraps any [`ArrivalSource`] and caches successful boards. Errors are
/// never cached, so a failing stop is retried on the next request.
pub struct CachedArrivalSource<S> {
    source: S,
    boards: MokaCache<ExternalId, CachedBoard>,
}

impl<S: ArrivalSource> CachedArrivalSource<S> {
    /// Create a new cached source.
    pub fn new(source: S, config: &CacheConfig) -> Self {
        let boards = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { source, boards }
    }

    /// Access the underlying source for operations that bypass cache.
    pub fn inner(&self) -> &S {
        &self.source
    }

    /// Get cache statistics.
    pub fn cache_entry_count(&self) -> u64 {
        self.boards.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.boards.invalidate_all();
    }
}

impl<S: ArrivalSource> ArrivalSource for CachedArrivalSource<S> {
    async fn fetch_board(&self, external_id: &ExternalId) -> Result<Vec<BoardEntry>, SourceError> {
        if let Some(cached) = self.boards.get(external_id).await {
            trace!(external_id = %external_id, "board cache hit");
            return Ok(cached.as_ref().clone());
        }

        let entries = self.source.fetch_board(external_id).await?;
        self.boards
            .insert(external_id.clone(), Arc::new(entries.clone()))
            .await;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LineCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls; fails for ids starting with "bad".
    struct CountingSource {
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ArrivalSource for CountingSource {
        async fn fetch_board(
            &self,
            external_id: &ExternalId,
        ) -> Result<Vec<BoardEntry>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if external_id.as_str().starts_with("bad") {
                return Err(SourceError::Upstream("boom".into()));
            }
            Ok(vec![BoardEntry::new(
                LineCode::parse("A").unwrap(),
                "Far Rockaway",
                4,
            )])
        }
    }

    fn ext(s: &str) -> ExternalId {
        ExternalId::parse(s).unwrap()
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(20));
        assert_eq!(config.max_capacity, 1000);
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let cached = CachedArrivalSource::new(CountingSource::new(), &CacheConfig::default());

        let first = cached.fetch_board(&ext("10327_100")).await.unwrap();
        let second = cached.fetch_board(&ext("10327_100")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cached.inner().call_count(), 1);

        cached.fetch_board(&ext("10327_322")).await.unwrap();
        assert_eq!(cached.inner().call_count(), 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cached = CachedArrivalSource::new(CountingSource::new(), &CacheConfig::default());

        assert!(cached.fetch_board(&ext("bad-1")).await.is_err());
        assert!(cached.fetch_board(&ext("bad-1")).await.is_err());

        assert_eq!(cached.inner().call_count(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cached = CachedArrivalSource::new(CountingSource::new(), &CacheConfig::default());

        cached.fetch_board(&ext("10327_100")).await.unwrap();
        cached.invalidate_cache();
        cached.fetch_board(&ext("10327_100")).await.unwrap();

        assert_eq!(cached.inner().call_count(), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let config = CacheConfig {
            ttl: Duration::from_millis(20),
            max_capacity: 10,
        };
        let cached = CachedArrivalSource::new(CountingSource::new(), &config);

        cached.fetch_board(&ext("10327_100")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        cached.fetch_board(&ext("10327_100")).await.unwrap();

        assert_eq!(cached.inner().call_count(), 2);
    }
}
