//! Experiment dispatch
//!
//! Turns a [`GridPoint`] into exactly one synchronous experiment execution
//! and returns the experiment's id. The experiment is held by a guard that
//! releases it on every exit path, including errors and unwinding.

use tracing::{info, warn};

use crate::config::RunConfiguration;
use crate::experiment::{Experiment, ExperimentLauncher, ExperimentSpec, TrackingRepo};
use crate::grid::GridPoint;
use crate::Result;

/// Dispatches grid points to an experiment launcher.
#[derive(Debug)]
pub struct Dispatcher<'a, L> {
    launcher: &'a L,
    repo: &'a TrackingRepo,
    config: &'a RunConfiguration,
}

impl<'a, L: ExperimentLauncher> Dispatcher<'a, L> {
    /// Create a dispatcher sharing one launcher and one tracking repo.
    #[must_use]
    pub const fn new(launcher: &'a L, repo: &'a TrackingRepo, config: &'a RunConfiguration) -> Self {
        Self {
            launcher,
            repo,
            config,
        }
    }

    /// Build the input contract for a point.
    #[must_use]
    pub fn spec_for(&self, point: &GridPoint) -> ExperimentSpec {
        ExperimentSpec::for_point(point, self.config)
    }

    /// Run the experiment for `point` once and return its id.
    ///
    /// # Errors
    ///
    /// Propagates launch and fit/evaluate failures unchanged. Release
    /// failures are logged and never replace the result.
    pub fn dispatch(&self, point: &GridPoint) -> Result<String> {
        let spec = self.spec_for(point);
        info!(
            key = %spec.key,
            fold = %spec.fold,
            filters = spec.filters.len(),
            "running experiment"
        );
        let experiment = self.launcher.launch(&spec, self.repo)?;
        let mut guard = ReleaseGuard::new(experiment, spec.key);
        guard.experiment.fit_and_evaluate()?;
        let id = guard.experiment.id().to_string();
        guard.release();
        info!(key = %guard.key, id = %id, "experiment finished");
        Ok(id)
    }
}

/// Closes the wrapped experiment exactly once.
struct ReleaseGuard<E: Experiment> {
    experiment: E,
    key: String,
    released: bool,
}

impl<E: Experiment> ReleaseGuard<E> {
    const fn new(experiment: E, key: String) -> Self {
        Self {
            experiment,
            key,
            released: false,
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.experiment.close() {
            warn!(key = %self.key, error = %e, "failed to release experiment");
        }
    }
}

impl<E: Experiment> Drop for ReleaseGuard<E> {
    fn drop(&mut self) {
        self.release();
    }
}
