use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reconcile::ObservedState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// What the host last reported for each disk, kept between runs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StateFile {
    /// Observed state keyed by disk path
    #[serde(default)]
    pub disks: BTreeMap<String, ObservedState>,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            disks: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

impl StateFile {
    /// Load state from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::state_file()?)
    }

    /// Load state from disk, or return default if file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Update the timestamp and save to the default location
    pub fn save(&mut self) -> Result<PathBuf> {
        let path = paths::state_file()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Update the timestamp and save to `path`
    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        self.last_updated = Utc::now();
        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Last observation of `path`; unknown if never recorded
    pub fn observed(&self, path: &str) -> ObservedState {
        self.disks.get(path).cloned().unwrap_or_default()
    }

    /// Record an observation
    pub fn record(&mut self, path: &str, observed: ObservedState) {
        self.disks.insert(path.to_string(), observed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{DiskSpec, DiskStatus};

    fn present(path: &str, size: u64) -> ObservedState {
        ObservedState {
            status: DiskStatus::Present,
            attributes: DiskSpec::new(path).with_size(size),
            file_size: 4_194_304,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_state() {
        let state = StateFile::default();
        assert!(state.disks.is_empty());
        assert_eq!(state.observed("missing").status, DiskStatus::Unknown);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.toml");

        let mut state = StateFile::default();
        state.record(r"C:\vms\disk1.vhdx", present(r"C:\vms\disk1.vhdx", 1 << 30));
        state.record(r"C:\vms\gone.vhdx", ObservedState::absent());
        state.save_to(&path).unwrap();

        let loaded = StateFile::load_from(&path).unwrap();
        assert_eq!(loaded.disks.len(), 2);
        assert_eq!(
            loaded.observed(r"C:\vms\disk1.vhdx"),
            present(r"C:\vms\disk1.vhdx", 1 << 30)
        );
        assert_eq!(loaded.observed(r"C:\vms\gone.vhdx").status, DiskStatus::Absent);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateFile::load_from(&dir.path().join("state.toml")).unwrap();
        assert!(state.disks.is_empty());
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.toml");
        fs::write(&path, "disks = 3").unwrap();
        assert!(StateFile::load_from(&path).is_err());
    }
}
