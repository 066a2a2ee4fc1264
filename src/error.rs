//! Error types for vo2-sweep
//!
//! Configuration errors are detected before the first dispatch; execution
//! errors come from the experiment collaborator.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// vo2-sweep error types
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid run configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Gender grouping mode outside the supported set
    #[error("Invalid gender group mode '{0}': expected 'all' or 'each'")]
    InvalidGenderGroup(String),

    /// Filter clause that is not a `[field, operator, value]` triple
    #[error("Malformed filter clause: {0}")]
    InvalidFilter(String),

    /// Two grid points produced the same mapping key (enumeration defect)
    #[error("Duplicate grid key '{0}': grid enumeration produced a collision. Please report this issue.")]
    DuplicateGridKey(String),

    /// The experiment collaborator failed to fit or evaluate a grid point
    #[error("Experiment '{key}' failed: {message}")]
    ExperimentFailed {
        /// Grid key of the failing point
        key: String,
        /// Diagnostic from the collaborator
        message: String,
    },

    /// Run id not present in the tracking repo
    #[error("Unknown run '{0}' in tracking repo")]
    UnknownRun(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML encode/decode error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error belongs to the configuration taxonomy.
    ///
    /// Configuration errors are fatal preconditions: they are raised before
    /// any grid point is dispatched and no mapping file is written.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::InvalidGenderGroup(_) | Self::InvalidFilter(_)
        )
    }
}
