//! Sweep driver
//!
//! Enumerates the grid for a [`RunConfiguration`], dispatches every point
//! exactly once, and collects the [`ModelMapping`]. Persistence happens
//! once, after the last point has finished.
//!
//! ## Failure policy
//!
//! - `isolate_failures = false` (default): the first failing point aborts
//!   the sweep and no mapping is written.
//! - `isolate_failures = true`: failing points are logged and skipped; the
//!   mapping of completed points is written and the failures are reported
//!   in [`SweepReport`].

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RunConfiguration;
use crate::dispatch::Dispatcher;
use crate::experiment::{ExperimentLauncher, TrackingRepo};
use crate::grid::{Grid, GridPoint};
use crate::mapping::ModelMapping;
use crate::{Error, Result};

/// A grid point that failed under failure isolation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    /// Grid key of the failed point
    pub key: String,
    /// Error message
    pub message: String,
}

/// Outcome of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Grid points in the sweep
    pub planned: usize,
    /// Points whose experiment completed
    pub completed: usize,
    /// Points skipped after a failure (isolation only)
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    /// Whether every planned point completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.completed == self.planned
    }
}

/// Owns one sweep: configuration, launcher and tracking repo.
#[derive(Debug)]
pub struct Sweep<'a, L> {
    config: &'a RunConfiguration,
    launcher: &'a L,
    repo: &'a TrackingRepo,
}

impl<'a, L: ExperimentLauncher> Sweep<'a, L> {
    /// Create a sweep.
    #[must_use]
    pub const fn new(config: &'a RunConfiguration, launcher: &'a L, repo: &'a TrackingRepo) -> Self {
        Self {
            config,
            launcher,
            repo,
        }
    }

    /// Keys of every grid point, in dispatch order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateGridKey`] if two points share a key.
    pub fn plan(&self) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        Grid::new(self.config)
            .iter()
            .map(|point| {
                let key = point.key();
                if seen.insert(key.clone()) {
                    Ok(key)
                } else {
                    Err(Error::DuplicateGridKey(key))
                }
            })
            .collect()
    }

    /// Dispatch every grid point and return the mapping with a report.
    ///
    /// # Errors
    ///
    /// Returns the first dispatch error unless failures are isolated, a
    /// [`Error::DuplicateGridKey`] found before dispatch, or an error
    /// building the worker pool.
    pub fn run(&self) -> Result<(ModelMapping, SweepReport)> {
        let planned = self.plan()?.len();
        info!(
            points = planned,
            parallelism = self.config.parallelism(),
            version = self.config.version(),
            "starting sweep"
        );

        let dispatcher = Dispatcher::new(self.launcher, self.repo, self.config);
        let state = Mutex::new((ModelMapping::new(), Vec::new()));
        let grid = Grid::new(self.config);

        if self.config.parallelism() <= 1 {
            grid.iter()
                .try_for_each(|point| self.dispatch_one(&dispatcher, &point, &state))?;
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.parallelism())
                .build()
                .map_err(|e| Error::Other(format!("failed to build dispatch pool: {e}")))?;
            let points: Vec<GridPoint> = grid.iter().collect();
            pool.install(|| {
                points
                    .par_iter()
                    .try_for_each(|point| self.dispatch_one(&dispatcher, point, &state))
            })?;
        }

        let (mapping, failures) = state.into_inner().unwrap_or_else(PoisonError::into_inner);
        let report = SweepReport {
            planned,
            completed: mapping.len(),
            failures,
        };
        info!(
            completed = report.completed,
            failed = report.failures.len(),
            "sweep finished"
        );
        Ok((mapping, report))
    }

    fn dispatch_one(
        &self,
        dispatcher: &Dispatcher<'_, L>,
        point: &GridPoint,
        state: &Mutex<(ModelMapping, Vec<SweepFailure>)>,
    ) -> Result<()> {
        match dispatcher.dispatch(point) {
            Ok(id) => {
                let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
                guard.0.record(point.key(), id)
            }
            Err(e) if self.config.isolate_failures() => {
                let key = point.key();
                warn!(key = %key, error = %e, "experiment failed, continuing");
                let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
                guard.1.push(SweepFailure {
                    key,
                    message: e.to_string(),
                });
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Run a full sweep and write the mapping to `output`.
///
/// Nothing is written if the sweep aborts.
///
/// # Errors
///
/// Returns any sweep error, or an IO/YAML error while persisting.
pub fn run_sweep<L: ExperimentLauncher>(
    config: &RunConfiguration,
    launcher: &L,
    repo: &TrackingRepo,
    output: impl AsRef<Path>,
) -> Result<SweepReport> {
    let (mapping, report) = Sweep::new(config, launcher, repo).run()?;
    mapping.persist(output)?;
    Ok(report)
}
