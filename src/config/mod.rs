//! Run configuration
//!
//! A [`RunConfiguration`] is resolved once per process from the built-in
//! defaults plus [`RunOverrides`] layers, validated, and never mutated.
//!
//! ```rust
//! use vo2_sweep::config::{GenderGroupMode, RunConfiguration, RunOverrides};
//!
//! let overrides = RunOverrides::from_dotlist(["full_load=true", "gender_group=each"])?;
//! let config = RunConfiguration::resolve(overrides)?;
//!
//! assert!(config.full_load());
//! assert_eq!(config.gender_group(), GenderGroupMode::Each);
//! assert_eq!(config.time_windows().len(), 3);
//! # Ok::<(), vo2_sweep::Error>(())
//! ```

mod overrides;

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::filter::FilterClause;
use crate::grid::{TimeWindow, TimeWindowSet};
use crate::{Error, Result};

pub use overrides::RunOverrides;

/// Default location of the persisted grid-key mapping.
pub const DEFAULT_MAPPING_PATH: &str = "data/model_mapping.yml";

/// Default version label.
pub const DEFAULT_VERSION: &str = "default";

/// Whether the grid is run once, or once per gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderGroupMode {
    /// Cohorts are not stratified by gender
    All,
    /// The full grid is repeated for each gender value
    Each,
}

impl FromStr for GenderGroupMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "each" => Ok(Self::Each),
            _ => Err(Error::InvalidGenderGroup(s.to_string())),
        }
    }
}

impl fmt::Display for GenderGroupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Each => f.write_str("each"),
        }
    }
}

/// Validated, immutable configuration for one sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfiguration {
    filters: Vec<FilterClause>,
    version: String,
    drop_columns: BTreeSet<String>,
    gender_group: GenderGroupMode,
    full_load: bool,
    time_list: Vec<TimeWindowSet>,
    parallelism: usize,
    isolate_failures: bool,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            version: DEFAULT_VERSION.to_string(),
            drop_columns: BTreeSet::new(),
            gender_group: GenderGroupMode::All,
            full_load: false,
            time_list: vec![
                [TimeWindow::Demographic].into_iter().collect(),
                [TimeWindow::Demographic, TimeWindow::Rest].into_iter().collect(),
                TimeWindowSet::maximal(),
            ],
            parallelism: 1,
            isolate_failures: false,
        }
    }
}

impl RunConfiguration {
    /// Merge overrides onto the defaults and validate the result.
    ///
    /// # Errors
    ///
    /// Returns a configuration error ([`Error::is_config_error`]) if:
    /// - `gender_group` is not `all` or `each`
    /// - a time-window set is empty, out of range, or repeated
    /// - `time_list` is empty
    /// - a drop column name is blank
    /// - `parallelism` is zero
    pub fn resolve(overrides: RunOverrides) -> Result<Self> {
        let mut config = Self::default();

        if let Some(mode) = overrides.gender_group {
            config.gender_group = mode.parse()?;
        }
        if let Some(filters) = overrides.filters {
            config.filters = filters;
        }
        if let Some(version) = overrides.version {
            config.version = version;
        }
        if let Some(columns) = overrides.drop_columns {
            if let Some(blank) = columns.iter().find(|c| c.trim().is_empty()) {
                return Err(Error::Config(format!(
                    "drop column names must not be blank (got {blank:?})"
                )));
            }
            config.drop_columns = columns.into_iter().collect();
        }
        if let Some(full_load) = overrides.full_load {
            config.full_load = full_load;
        }
        if let Some(time_list) = overrides.time_list {
            config.time_list = time_list
                .iter()
                .map(|indices| TimeWindowSet::from_indices(indices))
                .collect::<Result<Vec<_>>>()?;
        }
        if let Some(parallelism) = overrides.parallelism {
            config.parallelism = parallelism;
        }
        if let Some(isolate) = overrides.isolate_failures {
            config.isolate_failures = isolate;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.time_list.is_empty() {
            return Err(Error::Config(
                "time_list must contain at least one time window set".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for set in &self.time_list {
            if !seen.insert(set) {
                return Err(Error::Config(format!(
                    "time window set {set} is listed more than once"
                )));
            }
        }
        if self.parallelism == 0 {
            return Err(Error::Config("parallelism must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Run-level filters, appended after the baseline clauses.
    #[must_use]
    pub fn filters(&self) -> &[FilterClause] {
        &self.filters
    }

    /// Version label propagated to every experiment.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Columns always excluded from the feature set.
    #[must_use]
    pub const fn drop_columns(&self) -> &BTreeSet<String> {
        &self.drop_columns
    }

    /// Gender stratification mode.
    #[must_use]
    pub const fn gender_group(&self) -> GenderGroupMode {
        self.gender_group
    }

    /// Train on the full dataset instead of cross-validation folds.
    #[must_use]
    pub const fn full_load(&self) -> bool {
        self.full_load
    }

    /// Time-window sets, in sweep order.
    #[must_use]
    pub fn time_windows(&self) -> &[TimeWindowSet] {
        &self.time_list
    }

    /// Maximum number of experiments in flight (1 = sequential).
    #[must_use]
    pub const fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Continue past failing grid points instead of aborting the sweep.
    #[must_use]
    pub const fn isolate_failures(&self) -> bool {
        self.isolate_failures
    }

    /// Render as YAML for the startup log.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
