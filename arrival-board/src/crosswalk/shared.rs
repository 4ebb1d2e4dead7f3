//! Shared, hot-reloadable handle to the crosswalk store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::error::CrosswalkError;
use super::store::CrosswalkStore;

/// Thread-safe crosswalk handle.
///
/// Readers take an `Arc` snapshot and keep using it for the whole request,
/// so a concurrent [`SharedCrosswalk::reload`] never exposes a half-updated
/// table: the swap replaces the `Arc` in one step.
#[derive(Clone)]
pub struct SharedCrosswalk {
    inner: Arc<RwLock<Arc<CrosswalkStore>>>,
    path: Option<PathBuf>,
}

impl SharedCrosswalk {
    /// Load the store from a file. The path is remembered for reloads.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CrosswalkError> {
        let path = path.as_ref().to_path_buf();
        let store = CrosswalkStore::load(&path)?;
        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(store))),
            path: Some(path),
        })
    }

    /// Wrap an in-memory store. [`SharedCrosswalk::reload`] is a no-op.
    pub fn from_store(store: CrosswalkStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(store))),
            path: None,
        }
    }

    /// Current store snapshot.
    pub async fn snapshot(&self) -> Arc<CrosswalkStore> {
        let guard = self.inner.read().await;
        Arc::clone(&guard)
    }

    /// Replace the store wholesale.
    pub async fn replace(&self, store: CrosswalkStore) {
        let mut guard = self.inner.write().await;
        *guard = Arc::new(store);
    }

    /// Re-read the backing file and swap it in.
    ///
    /// On success, returns the number of stations loaded. On failure the
    /// existing store is kept and the error is returned.
    pub async fn reload(&self) -> Result<usize, CrosswalkError> {
        let Some(path) = &self.path else {
            return Ok(self.snapshot().await.station_count());
        };

        let store = CrosswalkStore::load(path)?;
        let count = store.station_count();
        self.replace(store).await;
        Ok(count)
    }
}
