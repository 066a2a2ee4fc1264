//! External trainer process collaborator

use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use super::{Experiment, ExperimentLauncher, ExperimentSpec, RunStatus, TrackingRepo};
use crate::{Error, Result};

/// Environment variable carrying the run id to the trainer.
pub const ENV_EXPERIMENT_ID: &str = "VO2_EXPERIMENT_ID";

/// Environment variable carrying the JSON input contract to the trainer.
pub const ENV_EXPERIMENT_SPEC: &str = "VO2_EXPERIMENT_SPEC";

#[derive(Debug, Clone)]
struct Trainer {
    program: PathBuf,
    args: Vec<String>,
}

/// Launches one trainer process per grid point.
///
/// The trainer receives [`ENV_EXPERIMENT_ID`] and [`ENV_EXPERIMENT_SPEC`]
/// and signals failure with a non-zero exit status. A launcher built with
/// [`CommandLauncher::dry_run`] starts no process and marks every run
/// successful, which previews the grid and the mapping document.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    trainer: Option<Trainer>,
}

impl CommandLauncher {
    /// Run `program args...` for each grid point.
    #[must_use]
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trainer: Some(Trainer {
                program: program.into(),
                args: args.into_iter().map(Into::into).collect(),
            }),
        }
    }

    /// Track runs without training anything.
    #[must_use]
    pub const fn dry_run() -> Self {
        Self { trainer: None }
    }
}

impl ExperimentLauncher for CommandLauncher {
    type Experiment = TrackedExperiment;

    fn launch(&self, spec: &ExperimentSpec, repo: &TrackingRepo) -> Result<TrackedExperiment> {
        let inputs = serde_json::to_value(spec)?;
        let spec_json = inputs.to_string();
        let id = repo.register_run(&spec.version, &spec.key, Some(inputs));
        Ok(TrackedExperiment {
            id,
            key: spec.key.clone(),
            spec_json,
            trainer: self.trainer.clone(),
            repo: repo.clone(),
            outcome: None,
            closed: false,
        })
    }
}

/// Experiment whose lifecycle is recorded in a [`TrackingRepo`].
#[derive(Debug)]
pub struct TrackedExperiment {
    id: String,
    key: String,
    spec_json: String,
    trainer: Option<Trainer>,
    repo: TrackingRepo,
    outcome: Option<RunStatus>,
    closed: bool,
}

impl TrackedExperiment {
    fn run_trainer(&self, trainer: &Trainer) -> Result<()> {
        debug!(program = %trainer.program.display(), key = %self.key, "spawning trainer");
        let status = Command::new(&trainer.program)
            .args(&trainer.args)
            .env(ENV_EXPERIMENT_ID, &self.id)
            .env(ENV_EXPERIMENT_SPEC, &self.spec_json)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| Error::ExperimentFailed {
                key: self.key.clone(),
                message: format!("failed to spawn {}: {e}", trainer.program.display()),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::ExperimentFailed {
                key: self.key.clone(),
                message: format!("trainer exited with {status}"),
            })
        }
    }
}

impl Experiment for TrackedExperiment {
    fn id(&self) -> &str {
        &self.id
    }

    fn fit_and_evaluate(&mut self) -> Result<()> {
        self.repo.start_run(&self.id)?;
        let result = match &self.trainer {
            Some(trainer) => self.run_trainer(trainer),
            None => Ok(()),
        };
        self.outcome = Some(if result.is_ok() {
            RunStatus::Success
        } else {
            RunStatus::Failed
        });
        result
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let status = self.outcome.unwrap_or(RunStatus::Failed);
        self.repo.complete_run(&self.id, status)
    }
}
