//! Experiment collaborators and run tracking
//!
//! The sweep never trains models itself. For each grid point it builds an
//! [`ExperimentSpec`] (the input contract), asks an [`ExperimentLauncher`]
//! for an [`Experiment`], runs it once, reads its id, and releases it.
//!
//! ## Tracking schema
//!
//! ```text
//! TrackingRepo
//!   └── ExperimentRecord (1 per version label) ──< RunRecord (1 per grid point)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use vo2_sweep::experiment::{CommandLauncher, Experiment, ExperimentLauncher, TrackingRepo};
//! use vo2_sweep::config::{RunConfiguration, RunOverrides};
//! use vo2_sweep::grid::Grid;
//! use vo2_sweep::experiment::ExperimentSpec;
//!
//! let config = RunConfiguration::resolve(RunOverrides::default().with_full_load(true))?;
//! let point = Grid::new(&config).iter().next().unwrap();
//! let spec = ExperimentSpec::for_point(&point, &config);
//!
//! let repo = TrackingRepo::in_memory();
//! let mut experiment = CommandLauncher::dry_run().launch(&spec, &repo)?;
//! experiment.fit_and_evaluate()?;
//! experiment.close()?;
//!
//! assert!(repo.run(experiment.id()).is_some());
//! # Ok::<(), vo2_sweep::Error>(())
//! ```

mod command;
mod experiment_record;
mod run_record;
mod store;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::RunConfiguration;
use crate::filter::FilterClause;
use crate::grid::{CohortGroup, Fold, GridPoint, TimeWindowSet};
use crate::Result;

pub use command::{CommandLauncher, TrackedExperiment, ENV_EXPERIMENT_ID, ENV_EXPERIMENT_SPEC};
pub use experiment_record::{ExperimentRecord, ExperimentRecordBuilder};
pub use run_record::{RunRecord, RunRecordBuilder, RunStatus};
pub use store::{TrackingRepo, RUNS_DIR};

/// Input contract handed to the experiment collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSpec {
    /// Mapping key of the grid point
    pub key: String,
    /// Cohort to model
    pub group: CohortGroup,
    /// Feature categories to include
    pub time_list: TimeWindowSet,
    /// Composed filters (baseline, run-level, stratification)
    pub filters: Vec<FilterClause>,
    /// Holdout selector
    pub fold: Fold,
    /// Version label for artifact versioning
    pub version: String,
    /// Columns to exclude from the feature set
    pub drop_columns: BTreeSet<String>,
    /// Train on the whole dataset
    pub full_load: bool,
}

impl ExperimentSpec {
    /// Build the contract for a grid point under a configuration.
    #[must_use]
    pub fn for_point(point: &GridPoint, config: &RunConfiguration) -> Self {
        Self {
            key: point.key(),
            group: point.cohort,
            time_list: point.time_windows.clone(),
            filters: point.filters.clone(),
            fold: point.fold,
            version: config.version().to_string(),
            drop_columns: point.drop_columns.clone(),
            full_load: config.full_load(),
        }
    }
}

/// A launched experiment bound to one grid point.
///
/// `fit_and_evaluate` is called at most once, then `id` is read, then
/// `close` releases tracking resources. `close` must be safe to call after
/// a failed fit, or without any fit at all.
pub trait Experiment {
    /// Opaque identifier assigned by the tracking repo.
    fn id(&self) -> &str;

    /// Train and evaluate, blocking until the artifact is persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting or evaluation fails.
    fn fit_and_evaluate(&mut self) -> Result<()>;

    /// Release resources held in the tracking repo.
    ///
    /// # Errors
    ///
    /// Returns an error if the release itself fails.
    fn close(&mut self) -> Result<()>;
}

/// Constructs experiments from input contracts.
///
/// Launchers are shared across dispatch threads, hence `Sync`.
pub trait ExperimentLauncher: Sync {
    /// Experiment type produced by this launcher.
    type Experiment: Experiment;

    /// Construct (but do not run) the experiment for `spec`.
    ///
    /// # Errors
    ///
    /// Returns an error if the experiment cannot be constructed.
    fn launch(&self, spec: &ExperimentSpec, repo: &TrackingRepo) -> Result<Self::Experiment>;
}
