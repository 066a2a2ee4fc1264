//! Run Record - one tracked execution of a grid point

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Registered, not yet fitting.
    Pending,
    /// Fit/evaluate in progress.
    Running,
    /// Fit/evaluate completed.
    Success,
    /// Fit/evaluate failed, or the run was released without completing.
    Failed,
}

impl RunStatus {
    /// Whether the run has reached a final state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// Run Record tracks the lifecycle of a single grid-point experiment.
///
/// `run_id` is the opaque identifier recorded in the model mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    run_id: String,
    experiment_id: String,
    grid_key: String,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    inputs: Option<serde_json::Value>,
}

impl RunRecord {
    /// Create a new run record in Pending status.
    ///
    /// # Arguments
    ///
    /// * `run_id` - Opaque identifier for the run
    /// * `experiment_id` - ID of the parent experiment (version label)
    /// * `grid_key` - Mapping key of the grid point this run executes
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        experiment_id: impl Into<String>,
        grid_key: impl Into<String>,
    ) -> Self {
        Self::builder(run_id, experiment_id, grid_key).build()
    }

    /// Create a builder for constructing a run record with optional fields.
    #[must_use]
    pub fn builder(
        run_id: impl Into<String>,
        experiment_id: impl Into<String>,
        grid_key: impl Into<String>,
    ) -> RunRecordBuilder {
        RunRecordBuilder::new(run_id, experiment_id, grid_key)
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the parent experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the grid key.
    #[must_use]
    pub fn grid_key(&self) -> &str {
        &self.grid_key
    }

    /// Get the current run status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Get the start timestamp, if the run has started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the end timestamp, if the run has finished.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Get the experiment input contract the run was launched with.
    #[must_use]
    pub const fn inputs(&self) -> Option<&serde_json::Value> {
        self.inputs.as_ref()
    }

    /// Transition Pending → Running and stamp `started_at`.
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Finish with the given status and stamp `ended_at`.
    pub fn complete(&mut self, status: RunStatus) {
        self.status = status;
        self.ended_at = Some(Utc::now());
    }
}

/// Builder for `RunRecord`.
#[derive(Debug)]
pub struct RunRecordBuilder {
    run_id: String,
    experiment_id: String,
    grid_key: String,
    inputs: Option<serde_json::Value>,
}

impl RunRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        experiment_id: impl Into<String>,
        grid_key: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            experiment_id: experiment_id.into(),
            grid_key: grid_key.into(),
            inputs: None,
        }
    }

    /// Attach the serialized input contract.
    #[must_use]
    pub fn inputs(mut self, inputs: serde_json::Value) -> Self {
        self.inputs = Some(inputs);
        self
    }

    /// Build the `RunRecord`.
    #[must_use]
    pub fn build(self) -> RunRecord {
        RunRecord {
            run_id: self.run_id,
            experiment_id: self.experiment_id,
            grid_key: self.grid_key,
            status: RunStatus::Pending,
            started_at: None,
            ended_at: None,
            inputs: self.inputs,
        }
    }
}
