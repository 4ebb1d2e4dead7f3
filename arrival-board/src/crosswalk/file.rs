//! On-disk crosswalk document.
//!
//! One JSON file carries the station catalog, complexes, the crosswalk
//! produced by the builder and the static line map:
//!
//! ```json
//! {
//!   "stations":  [{"id": "A27", "name": "Fulton St", "mode": "subway", "lat": 40.71, "lon": -74.0}],
//!   "complexes": [{"id": "WTC", "name": "World Trade Center", "stations": ["A27", "E01"]}],
//!   "crosswalk": [{"internalId": "A27", "externalId": "10327_100", "confidence": "exact"}],
//!   "lines":     {"A27": ["A", "C"]}
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{Complex, LineSet, Station, StationId};

use super::entry::CrosswalkEntry;
use super::error::CrosswalkError;

/// Serialized form of the crosswalk store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrosswalkFile {
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub complexes: Vec<Complex>,
    #[serde(default)]
    pub crosswalk: Vec<CrosswalkEntry>,
    #[serde(default)]
    pub lines: BTreeMap<StationId, LineSet>,
}

impl CrosswalkFile {
    /// Read and parse a crosswalk file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CrosswalkError> {
        read_json(path.as_ref())
    }

    /// Write the file as pretty-printed JSON.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CrosswalkError> {
        write_json(path.as_ref(), self)
    }
}

/// Read a JSON document of any shape (catalogs, override tables).
pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, CrosswalkError> {
    let contents = std::fs::read_to_string(path).map_err(|e| CrosswalkError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&contents).map_err(|e| CrosswalkError::Json {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write a value as pretty JSON, creating parent directories.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CrosswalkError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| CrosswalkError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let json = serde_json::to_string_pretty(value).map_err(|e| CrosswalkError::Json {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    std::fs::write(path, json).map_err(|e| CrosswalkError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crosswalk::MatchConfidence;
    use crate::domain::{Coordinates, ExternalId, LineCode, TransportMode};
    use tempfile::tempdir;

    fn sample() -> CrosswalkFile {
        let fulton = StationId::parse("A27").unwrap();
        let mut lines = BTreeMap::new();
        lines.insert(
            fulton.clone(),
            ["A", "C"].iter().map(|l| LineCode::parse(l).unwrap()).collect(),
        );

        CrosswalkFile {
            stations: vec![Station {
                id: fulton.clone(),
                name: "Fulton St".to_string(),
                mode: TransportMode::Subway,
                coordinates: Coordinates::new(40.7101, -74.0070).unwrap(),
            }],
            complexes: vec![],
            crosswalk: vec![CrosswalkEntry::matched(
                fulton,
                ExternalId::parse("10327_100").unwrap(),
                MatchConfidence::Exact,
            )],
            lines,
        }
    }

    #[test]
    fn save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crosswalk.json");

        let file = sample();
        file.save(&path).unwrap();

        let loaded = CrosswalkFile::load(&path).unwrap();
        assert_eq!(loaded, file);
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("crosswalk.json");

        sample().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CrosswalkFile::load("/nonexistent/path/crosswalk.json").unwrap_err();
        assert!(matches!(err, CrosswalkError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_json_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{\"stations\": [").unwrap();

        let err = CrosswalkFile::load(&path).unwrap_err();
        assert!(matches!(err, CrosswalkError::Json { .. }));
    }

    #[test]
    fn sections_default_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "{}").unwrap();

        let loaded = CrosswalkFile::load(&path).unwrap();
        assert!(loaded.stations.is_empty());
        assert!(loaded.lines.is_empty());
    }
}
