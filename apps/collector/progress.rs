//! Resumable collection state. Every successful unit of work rewrites the
//! full snapshot, so a crash loses at most the in-flight item. Corrupt or
//! missing state means "start fresh", never an error.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};
use utils::errors::PROGRESS_WRITE_FAILED;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressSnapshot {
    #[serde(default)]
    completed_ids: Vec<String>,
    #[serde(default)]
    last_updated: String,
    #[serde(default)]
    total_completed: usize,
    #[serde(default)]
    last_organization: String,
    #[serde(default)]
    last_id: String,
}

/// Owned by the single collection loop; no internal locking. Concurrent
/// writers must serialize `mark_done` externally.
pub struct CollectionTracker {
    path: PathBuf,
    completed: HashSet<String>,
    last_organization: String,
    last_id: String,
}

impl CollectionTracker {
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let snapshot = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<ProgressSnapshot>(&raw) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt progress snapshot, starting fresh");
                    ProgressSnapshot::default()
                }
            },
            Err(_) => ProgressSnapshot::default(),
        };

        info!(
            path = %path.display(),
            completed = snapshot.completed_ids.len(),
            "Loaded collection progress"
        );

        Self {
            path,
            completed: snapshot.completed_ids.into_iter().collect(),
            last_organization: snapshot.last_organization,
            last_id: snapshot.last_id,
        }
    }

    pub fn is_done(&self, identity: &str) -> bool {
        self.completed.contains(identity)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Records a completed unit of work and immediately persists the full
    /// snapshot. Written to a temp file then renamed, so a torn write leaves
    /// the previous snapshot in place.
    pub fn mark_done(&mut self, identity: &str, organization: &str) -> Result<()> {
        self.completed.insert(identity.to_string());
        self.last_id = identity.to_string();
        self.last_organization = organization.to_string();

        let mut completed_ids: Vec<String> = self.completed.iter().cloned().collect();
        completed_ids.sort();

        let snapshot = ProgressSnapshot {
            total_completed: completed_ids.len(),
            completed_ids,
            last_updated: Utc::now().to_rfc3339(),
            last_organization: self.last_organization.clone(),
            last_id: self.last_id.clone(),
        };

        let serialized =
            serde_json::to_string_pretty(&snapshot).context(PROGRESS_WRITE_FAILED)?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, serialized).context(PROGRESS_WRITE_FAILED)?;
        fs::rename(&temp_path, &self.path).context(PROGRESS_WRITE_FAILED)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = CollectionTracker::load(dir.path().join("progress.json"));
        assert_eq!(tracker.completed_count(), 0);
        assert!(!tracker.is_done("anything"));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, "{not valid json").unwrap();

        let tracker = CollectionTracker::load(&path);
        assert_eq!(tracker.completed_count(), 0);
    }

    #[test]
    fn mark_done_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");

        let mut tracker = CollectionTracker::load(&path);
        tracker.mark_done("prop-1", "ens.eth").unwrap();
        tracker.mark_done("prop-2", "frax.eth").unwrap();

        let reloaded = CollectionTracker::load(&path);
        assert!(reloaded.is_done("prop-1"));
        assert!(reloaded.is_done("prop-2"));
        assert!(!reloaded.is_done("prop-3"));
        assert_eq!(reloaded.completed_count(), 2);
    }

    #[test]
    fn snapshot_carries_provenance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");

        let mut tracker = CollectionTracker::load(&path);
        tracker.mark_done("prop-9", "uniswap").unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let snapshot: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(snapshot["last_id"], "prop-9");
        assert_eq!(snapshot["last_organization"], "uniswap");
        assert_eq!(snapshot["total_completed"], 1);
        assert!(!snapshot["last_updated"].as_str().unwrap().is_empty());
    }
}
