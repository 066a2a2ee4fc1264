//! Experiment Record - groups the runs of one version label

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Experiment Record groups every run dispatched under one version label.
///
/// The version label doubles as the experiment ID, so re-running a sweep
/// with the same `version` adds runs to the same experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExperimentRecord {
    version: String,
    created_at: DateTime<Utc>,
}

impl ExperimentRecord {
    /// Create a new experiment record for a version label, stamped now.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self::builder(version).build()
    }

    /// Create a builder for constructing an experiment record with optional fields.
    #[must_use]
    pub fn builder(version: impl Into<String>) -> ExperimentRecordBuilder {
        ExperimentRecordBuilder::new(version)
    }

    /// Get the experiment ID (the version label).
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.version
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Builder for `ExperimentRecord`.
#[derive(Debug)]
pub struct ExperimentRecordBuilder {
    version: String,
    created_at: DateTime<Utc>,
}

impl ExperimentRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            created_at: Utc::now(),
        }
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Build the `ExperimentRecord`.
    #[must_use]
    pub fn build(self) -> ExperimentRecord {
        ExperimentRecord {
            version: self.version,
            created_at: self.created_at,
        }
    }
}
