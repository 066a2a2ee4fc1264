//! Tracking Repo - shared store for experiment and run records
//!
//! One repo is opened per process and handed to every experiment. Records
//! live in `DashMap`s, so concurrent dispatchers can register and finish
//! runs without an outer lock.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::{ExperimentRecord, RunRecord, RunStatus};
use crate::{Error, Result};

/// Directory (under the repo root) holding per-run artifacts.
pub const RUNS_DIR: &str = ".vo2/runs";

#[derive(Debug, Default)]
struct RepoInner {
    root: Option<PathBuf>,
    experiments: DashMap<String, ExperimentRecord>,
    runs: DashMap<String, RunRecord>,
}

/// Shared experiment-tracking repo.
///
/// Cloning is cheap and yields a handle to the same store.
///
/// ## Example
///
/// ```rust
/// use vo2_sweep::experiment::{RunStatus, TrackingRepo};
///
/// let repo = TrackingRepo::in_memory();
/// let run_id = repo.register_run("default", "NG_[0]", None);
///
/// repo.start_run(&run_id)?;
/// repo.complete_run(&run_id, RunStatus::Success)?;
///
/// assert_eq!(repo.run(&run_id).unwrap().status(), RunStatus::Success);
/// # Ok::<(), vo2_sweep::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TrackingRepo {
    inner: Arc<RepoInner>,
}

impl TrackingRepo {
    /// Create a repo that keeps records in memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a repo rooted at `root`; finished runs are written to
    /// `<root>/.vo2/runs/<run_id>.json`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the runs directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join(RUNS_DIR))?;
        Ok(Self {
            inner: Arc::new(RepoInner {
                root: Some(root),
                ..RepoInner::default()
            }),
        })
    }

    /// Root directory, if the repo persists runs.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.inner.root.as_deref()
    }

    /// Check if the repo holds no experiments and no runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.experiments.is_empty() && self.inner.runs.is_empty()
    }

    /// Get the number of experiments.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.inner.experiments.len()
    }

    /// Get the number of runs.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.inner.runs.len()
    }

    /// Register a new Pending run and return its opaque id.
    ///
    /// The parent experiment for `version` is created on first use.
    #[must_use]
    pub fn register_run(
        &self,
        version: &str,
        grid_key: &str,
        inputs: Option<serde_json::Value>,
    ) -> String {
        self.inner
            .experiments
            .entry(version.to_string())
            .or_insert_with(|| ExperimentRecord::new(version));

        let run_id = Uuid::new_v4().simple().to_string();
        let mut builder = RunRecord::builder(run_id.as_str(), version, grid_key);
        if let Some(inputs) = inputs {
            builder = builder.inputs(inputs);
        }
        self.inner.runs.insert(run_id.clone(), builder.build());
        debug!(run_id = %run_id, grid_key, "registered run");
        run_id
    }

    /// Mark a run as Running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRun`] if the id was never registered.
    pub fn start_run(&self, run_id: &str) -> Result<()> {
        let mut run = self
            .inner
            .runs
            .get_mut(run_id)
            .ok_or_else(|| Error::UnknownRun(run_id.to_string()))?;
        run.start();
        Ok(())
    }

    /// Finish a run with `status` and, for persistent repos, write its
    /// record to disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRun`] for unregistered ids, or an IO/JSON
    /// error if the run artifact cannot be written.
    pub fn complete_run(&self, run_id: &str, status: RunStatus) -> Result<()> {
        let record = {
            let mut run = self
                .inner
                .runs
                .get_mut(run_id)
                .ok_or_else(|| Error::UnknownRun(run_id.to_string()))?;
            run.complete(status);
            run.clone()
        };
        if let Some(path) = self.run_path(run_id) {
            let json = serde_json::to_vec_pretty(&record)?;
            std::fs::write(&path, json)?;
            debug!(path = %path.display(), "persisted run");
        }
        Ok(())
    }

    /// Path of a run's persisted record, for persistent repos.
    #[must_use]
    pub fn run_path(&self, run_id: &str) -> Option<PathBuf> {
        self.inner
            .root
            .as_ref()
            .map(|root| root.join(RUNS_DIR).join(format!("{run_id}.json")))
    }

    /// Get an experiment by version label.
    #[must_use]
    pub fn experiment(&self, version: &str) -> Option<ExperimentRecord> {
        self.inner.experiments.get(version).map(|e| e.clone())
    }

    /// Get a run by ID.
    #[must_use]
    pub fn run(&self, run_id: &str) -> Option<RunRecord> {
        self.inner.runs.get(run_id).map(|r| r.clone())
    }

    /// Get all runs of an experiment, ordered by grid key.
    #[must_use]
    pub fn runs_for_experiment(&self, version: &str) -> Vec<RunRecord> {
        let mut runs: Vec<RunRecord> = self
            .inner
            .runs
            .iter()
            .filter(|run| run.experiment_id() == version)
            .map(|run| run.clone())
            .collect();
        runs.sort_by(|a, b| a.grid_key().cmp(b.grid_key()));
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_default() {
        let repo = TrackingRepo::in_memory();
        assert!(repo.is_empty());
        assert_eq!(repo.experiment_count(), 0);
        assert_eq!(repo.run_count(), 0);
        assert!(repo.root().is_none());
    }

    #[test]
    fn test_register_creates_experiment_once() {
        let repo = TrackingRepo::in_memory();
        let a = repo.register_run("v1", "NG_[0]", None);
        let b = repo.register_run("v1", "OG_[0]", None);

        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert_eq!(repo.experiment_count(), 1);
        assert_eq!(repo.run_count(), 2);
        assert!(repo.experiment("v1").is_some());
    }

    #[test]
    fn test_runs_for_experiment_ordering() {
        let repo = TrackingRepo::in_memory();
        let _ = repo.register_run("v1", "OG_[0]", None);
        let _ = repo.register_run("v1", "NG_[0]", None);
        let _ = repo.register_run("v2", "NG_[0]", None);

        let runs = repo.runs_for_experiment("v1");
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].grid_key(), "NG_[0]");
        assert_eq!(runs[1].grid_key(), "OG_[0]");
    }

    #[test]
    fn test_unknown_run() {
        let repo = TrackingRepo::in_memory();
        assert!(matches!(repo.start_run("nope"), Err(Error::UnknownRun(_))));
        assert!(repo.complete_run("nope", RunStatus::Failed).is_err());
    }

    #[test]
    fn test_clone_shares_store() {
        let repo = TrackingRepo::in_memory();
        let handle = repo.clone();
        let id = handle.register_run("v1", "NG_[0]", None);
        assert!(repo.run(&id).is_some());
    }
}
