//! Mock arrival source for running without API access.
//!
//! Loads sample HERE departure boards from JSON files and serves them
//! as if they were live API responses.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::aggregator::{ArrivalSource, SourceError};
use crate::domain::{BoardEntry, ExternalId};

use super::convert::convert_departures;
use super::error::HereError;
use super::types::DeparturesResponse;

/// Mock arrival source that serves departures from JSON files.
///
/// Minutes are computed against `reference_time` when set, so fixture
/// times stay meaningful; otherwise against the wall clock.
#[derive(Clone)]
pub struct MockArrivalSource {
    /// Pre-loaded boards, keyed by HERE station id.
    boards: Arc<RwLock<HashMap<ExternalId, DeparturesResponse>>>,
    reference_time: Option<DateTime<Utc>>,
    data_dir: PathBuf,
}

impl MockArrivalSource {
    /// Create a new mock source by loading JSON files from a directory.
    ///
    /// Expects files named `{externalId}.json` (e.g. `10327_73.json`).
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, HereError> {
        let data_dir = data_dir.as_ref();
        let boards = load_boards(data_dir)?;

        Ok(Self {
            boards: Arc::new(RwLock::new(boards)),
            reference_time: None,
            data_dir: data_dir.to_path_buf(),
        })
    }

    /// Pin "now" to a fixed instant.
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// List available stations in the mock data.
    pub async fn available_stations(&self) -> Vec<ExternalId> {
        let boards = self.boards.read().await;
        let mut ids: Vec<ExternalId> = boards.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Reload mock data from disk. On failure the current boards stay.
    pub async fn reload(&self) -> Result<usize, HereError> {
        let fresh = load_boards(&self.data_dir)?;
        let count = fresh.len();
        *self.boards.write().await = fresh;
        Ok(count)
    }
}

fn load_error(message: String) -> HereError {
    HereError::ApiError { status: 0, message }
}

fn load_boards(data_dir: &Path) -> Result<HashMap<ExternalId, DeparturesResponse>, HereError> {
    let mut boards = HashMap::new();

    let entries = std::fs::read_dir(data_dir)
        .map_err(|e| load_error(format!("Failed to read mock data directory: {e}")))?;

    for entry in entries {
        let entry = entry.map_err(|e| load_error(format!("Failed to read directory entry: {e}")))?;

        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        // "10327_73.json" -> "10327_73"
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| ExternalId::parse(s).ok())
            .ok_or_else(|| load_error(format!("Invalid filename: {}", path.display())))?;

        let json = std::fs::read_to_string(&path)
            .map_err(|e| load_error(format!("Failed to read {}: {e}", path.display())))?;

        let board: DeparturesResponse = serde_json::from_str(&json).map_err(|e| HereError::Json {
            message: format!("{}: {e}", path.display()),
            body: None,
        })?;

        boards.insert(id, board);
    }

    if boards.is_empty() {
        return Err(load_error(format!(
            "No mock board files found in {}",
            data_dir.display()
        )));
    }

    Ok(boards)
}

impl ArrivalSource for MockArrivalSource {
    async fn fetch_board(&self, external_id: &ExternalId) -> Result<Vec<BoardEntry>, SourceError> {
        let boards = self.boards.read().await;

        let board = boards.get(external_id).ok_or_else(|| {
            SourceError::Upstream(format!("no mock data for station {external_id}"))
        })?;

        let now = self.reference_time.unwrap_or_else(Utc::now);
        Ok(convert_departures(board, now))
    }
}
