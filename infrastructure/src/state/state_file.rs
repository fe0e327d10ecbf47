//! Coordinator state snapshots as pretty-printed JSON files

use staged_application::CoordinatorState;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to access state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("State file {path} is not a valid snapshot: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A snapshot file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the snapshot, or `None` when the file does not exist yet
    pub fn load(&self) -> Result<Option<CoordinatorState>, SnapshotError> {
        if !self.exists() {
            debug!("No state file at {}", self.path.display());
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|source| SnapshotError::Io {
            path: self.path.clone(),
            source,
        })?;
        let state = serde_json::from_str(&content).map_err(|source| SnapshotError::Format {
            path: self.path.clone(),
            source,
        })?;
        info!("Loaded coordinator state from {}", self.path.display());
        Ok(Some(state))
    }

    /// Write the snapshot, creating parent directories as needed.
    ///
    /// The file is written next to its destination and renamed into place,
    /// so a crash never leaves a half-written snapshot behind.
    pub fn save(&self, state: &CoordinatorState) -> Result<(), SnapshotError> {
        let io_error = |source| SnapshotError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(state).map_err(|source| SnapshotError::Format {
            path: self.path.clone(),
            source,
        })?;

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json).map_err(io_error)?;
        fs::rename(&staging, &self.path).map_err(io_error)?;
        debug!("Saved coordinator state to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staged_application::CoordinatorSettings;
    use staged_domain::Identity;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("state.json"));
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("nested").join("state.json"));

        let settings = CoordinatorSettings::default().with_trusted_forwarder("relay");
        let state = CoordinatorState::initial(&settings);
        file.save(&state).unwrap();

        let loaded = file.load().unwrap().unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.trusted_forwarder, Some(Identity::from("relay")));
        assert!(!dir.path().join("nested").join("state.json.tmp").exists());
    }

    #[test]
    fn test_garbage_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();

        let err = StateFile::new(&path).load().unwrap_err();
        assert!(matches!(err, SnapshotError::Format { .. }));
    }

    #[test]
    fn test_snapshot_with_empty_configuration_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("state.json"));
        file.save(&CoordinatorState::initial(&CoordinatorSettings::default()))
            .unwrap();

        let mut value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(file.path()).unwrap()).unwrap();
        value["configs"]["configurations"] = serde_json::json!([{ "index": 1, "stages": [] }]);
        fs::write(file.path(), value.to_string()).unwrap();

        match file.load() {
            Err(SnapshotError::Format { source, .. }) => {
                assert!(source.to_string().contains("at least one stage"));
            }
            other => panic!("expected a format error, got {:?}", other),
        }
    }
}
