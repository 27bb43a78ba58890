//! Pattern Stores
//!
//! The engine only needs `get(name)`; where patterns come from is up to the
//! store. Two stores are provided:
//!
//! - [`InMemoryPatternStore`] - patterns registered in code (tests, embedding)
//! - [`DirectoryPatternStore`] - one JSON [`PatternRecord`] per `*.json` file

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::error::{PatternError, Result};
use super::{Pattern, PatternRecord};

/// Source of named patterns
pub trait PatternStore: Send + Sync {
    /// Look up a pattern by name
    ///
    /// Returns [`PatternError::NotFound`] on a miss.
    fn get(&self, name: &str) -> Result<Pattern>;

    /// Names of all available patterns, sorted
    fn names(&self) -> Vec<String>;
}

/// Pattern store backed by a map
#[derive(Debug, Default)]
pub struct InMemoryPatternStore {
    patterns: RwLock<HashMap<String, Pattern>>,
}

impl InMemoryPatternStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a pattern
    pub fn insert(&self, name: impl Into<String>, pattern: Pattern) {
        self.patterns.write().insert(name.into(), pattern);
    }

    /// Remove a pattern, returning it if present
    pub fn remove(&self, name: &str) -> Option<Pattern> {
        self.patterns.write().remove(name)
    }
}

impl<S: Into<String>> FromIterator<(S, Pattern)> for InMemoryPatternStore {
    fn from_iter<I: IntoIterator<Item = (S, Pattern)>>(iter: I) -> Self {
        let patterns = iter.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            patterns: RwLock::new(patterns),
        }
    }
}

impl PatternStore for InMemoryPatternStore {
    fn get(&self, name: &str) -> Result<Pattern> {
        self.patterns
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| PatternError::NotFound(name.to_string()))
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.patterns.read().keys().cloned().collect();
        names.sort();
        names
    }
}

/// Pattern store backed by a directory of JSON records
///
/// Records are keyed by their `name` field, not by file name. Files that
/// fail to parse are logged and skipped so one bad file does not hide the
/// rest.
#[derive(Debug)]
pub struct DirectoryPatternStore {
    directory: PathBuf,
    records: RwLock<BTreeMap<String, PatternRecord>>,
}

impl DirectoryPatternStore {
    /// Open a pattern directory, creating it if missing, and load all records
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();

        if !directory.exists() {
            fs::create_dir_all(&directory).map_err(|e| PatternError::io(&directory, e))?;
            info!("Created pattern directory: {}", directory.display());
        }

        let store = Self {
            directory,
            records: RwLock::new(BTreeMap::new()),
        };
        let count = store.reload()?;
        if count == 0 {
            warn!(
                "No patterns found in {}; add *.json pattern records",
                store.directory.display()
            );
        }

        Ok(store)
    }

    /// Directory this store reads from
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Rescan the directory, replacing all loaded records
    ///
    /// Returns the number of records loaded.
    pub fn reload(&self) -> Result<usize> {
        let entries =
            fs::read_dir(&self.directory).map_err(|e| PatternError::io(&self.directory, e))?;

        let mut records = BTreeMap::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };

            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match read_record(&path) {
                Ok(record) => {
                    debug!(
                        "Loaded pattern: {} ({}, {} points)",
                        record.name,
                        path.display(),
                        record.pattern.len()
                    );
                    records.insert(record.name.clone(), record);
                }
                Err(e) => error!("{}", e),
            }
        }

        let count = records.len();
        *self.records.write() = records;
        info!("Loaded {} patterns from {}", count, self.directory.display());
        Ok(count)
    }

    /// Load (or reload) the single record stored as `<directory>/<name>.json`
    pub fn load_file(&self, name: &str) -> Result<PatternRecord> {
        let path = self.record_path(name);
        if !path.exists() {
            return Err(PatternError::NotFound(name.to_string()));
        }

        let record = read_record(&path)?;
        self.records
            .write()
            .insert(record.name.clone(), record.clone());
        info!("Loaded pattern: {}", record.name);
        Ok(record)
    }

    /// Full record for a pattern, including its authoring baseline
    pub fn record(&self, name: &str) -> Option<PatternRecord> {
        self.records.read().get(name).cloned()
    }

    /// Write a record to `<directory>/<name>.json` and make it available
    pub fn save_record(&self, record: &PatternRecord) -> Result<PathBuf> {
        let path = self.record_path(&record.name);
        let json = serde_json::to_string_pretty(record).map_err(|e| PatternError::Encode {
            name: record.name.clone(),
            source: e,
        })?;

        fs::write(&path, json).map_err(|e| PatternError::io(&path, e))?;
        self.records
            .write()
            .insert(record.name.clone(), record.clone());

        debug!("Saved pattern {} to {}", record.name, path.display());
        Ok(path)
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{}.json", name))
    }
}

impl PatternStore for DirectoryPatternStore {
    fn get(&self, name: &str) -> Result<Pattern> {
        self.records
            .read()
            .get(name)
            .map(|r| r.pattern.clone())
            .ok_or_else(|| PatternError::NotFound(name.to_string()))
    }

    fn names(&self) -> Vec<String> {
        // BTreeMap keys are already sorted
        self.records.read().keys().cloned().collect()
    }
}

fn read_record(path: &Path) -> Result<PatternRecord> {
    let content = fs::read_to_string(path).map_err(|e| PatternError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| PatternError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternPoint;

    fn sample(n: i32) -> Pattern {
        (0..n).map(|i| PatternPoint::new(i, i * 2, 10)).collect()
    }

    #[test]
    fn test_in_memory_get_and_miss() {
        let store = InMemoryPatternStore::new();
        store.insert("ak47", sample(3));

        assert_eq!(store.get("ak47").unwrap().len(), 3);
        assert!(store.get("m4a4").unwrap_err().is_not_found());
    }

    #[test]
    fn test_in_memory_names_sorted() {
        let store: InMemoryPatternStore =
            [("mp9", sample(1)), ("ak47", sample(1)), ("famas", sample(1))]
                .into_iter()
                .collect();

        assert_eq!(store.names(), vec!["ak47", "famas", "mp9"]);
        assert!(store.remove("famas").is_some());
        assert_eq!(store.names(), vec!["ak47", "mp9"]);
    }

    #[test]
    fn test_directory_store_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("data").join("patterns");

        let store = DirectoryPatternStore::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert!(store.names().is_empty());
    }

    #[test]
    fn test_directory_store_save_and_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryPatternStore::open(tmp.path()).unwrap();

        let record = PatternRecord::new("ak47", sample(4));
        let path = store.save_record(&record).unwrap();
        assert!(path.ends_with("ak47.json"));

        let reopened = DirectoryPatternStore::open(tmp.path()).unwrap();
        assert_eq!(reopened.names(), vec!["ak47"]);
        assert_eq!(reopened.get("ak47").unwrap(), sample(4));
        assert_eq!(reopened.record("ak47").unwrap(), record);
    }

    #[test]
    fn test_directory_store_skips_invalid_and_foreign_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("broken.json"), "{ not json").unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignore me").unwrap();
        fs::write(
            tmp.path().join("m4a1.json"),
            r#"{ "name": "m4a1", "pattern": [ { "x": 1, "y": 2, "d": 3 } ] }"#,
        )
        .unwrap();

        let store = DirectoryPatternStore::open(tmp.path()).unwrap();
        assert_eq!(store.names(), vec!["m4a1"]);
    }

    #[test]
    fn test_directory_store_load_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryPatternStore::open(tmp.path()).unwrap();

        assert!(store.load_file("galil").unwrap_err().is_not_found());

        fs::write(
            tmp.path().join("galil.json"),
            r#"{ "name": "galil", "pattern": [ { "x": 0, "y": 5, "d": 90 } ] }"#,
        )
        .unwrap();

        let record = store.load_file("galil").unwrap();
        assert_eq!(record.pattern.total_duration_ms(), 90);
        assert!(store.get("galil").is_ok());
    }

    #[test]
    fn test_directory_store_load_file_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryPatternStore::open(tmp.path()).unwrap();
        fs::write(tmp.path().join("aug.json"), "[]").unwrap();

        assert!(matches!(
            store.load_file("aug"),
            Err(PatternError::Parse { .. })
        ));
    }

    #[test]
    fn test_directory_store_reads_numeric_default_hotkey() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("ak47.json"),
            r#"{
                "name": "ak47",
                "description": "Recoil pattern for ak47",
                "defaultHotkey": 0,
                "baseSettings": {
                    "sensitivity": 2.0,
                    "resolution": { "width": 1920, "height": 1080 },
                    "aspectRatio": "16:9"
                },
                "pattern": [ { "x": 0, "y": 4, "d": 30 } ]
            }"#,
        )
        .unwrap();
        fs::write(
            tmp.path().join("m4a4.json"),
            r#"{ "name": "m4a4", "defaultHotkey": 113, "pattern": [ { "x": 1, "y": 2, "d": 3 } ] }"#,
        )
        .unwrap();

        let store = DirectoryPatternStore::open(tmp.path()).unwrap();
        assert_eq!(store.names(), vec!["ak47", "m4a4"]);
        assert!(store.record("ak47").unwrap().default_hotkey.is_none());
        assert_eq!(
            store.record("m4a4").unwrap().default_hotkey.as_deref(),
            Some("F2")
        );
    }
}
