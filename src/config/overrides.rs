//! Configuration override layers
//!
//! Overrides come from a YAML file and from `key=value` command-line
//! arguments; each value on the command line is parsed as YAML, so
//! `time_list=[[0,1]]` and `filters=[[gender,'=',1]]` work as expected.

use std::path::Path;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::filter::FilterClause;
use crate::{Error, Result};

/// Partial configuration; `None` leaves the lower layer's value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunOverrides {
    /// Run-level filters (appended after the baseline clauses)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<FilterClause>>,
    /// Version label; any scalar is accepted and kept as text
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
    /// Columns excluded from every experiment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_columns: Option<Vec<String>>,
    /// `all` or `each`; validated on resolve
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub gender_group: Option<String>,
    /// Train on the whole dataset instead of 5-fold cross-validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_load: Option<bool>,
    /// Time-window index sets (0: Demographic, 1: Rest, 2: Submaximal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_list: Option<Vec<Vec<u8>>>,
    /// Maximum experiments in flight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<usize>,
    /// Skip failing grid points instead of aborting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isolate_failures: Option<bool>,
}

fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar, found {other:?}"
        ))),
    }
}

impl RunOverrides {
    /// Parse overrides from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unknown keys or ill-typed values.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load overrides from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or a configuration
    /// error if its contents are invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parse `key=value` arguments; values are YAML.
    ///
    /// A key given twice keeps its last value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an argument has no `=`, a value is not
    /// valid YAML, a key is unknown, or a value has the wrong type.
    pub fn from_dotlist<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mapping = Mapping::new();
        for arg in args {
            let arg = arg.as_ref();
            let Some((key, raw)) = arg.split_once('=') else {
                return Err(Error::Config(format!(
                    "override '{arg}' must have the form key=value"
                )));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::Config(format!("override '{arg}' has an empty key")));
            }
            let value: Value = serde_yaml::from_str(raw)
                .map_err(|e| Error::Config(format!("override '{key}': {e}")))?;
            mapping.insert(Value::String(key.to_string()), value);
        }
        serde_yaml::from_value(Value::Mapping(mapping)).map_err(|e| Error::Config(e.to_string()))
    }

    /// Layer `higher` on top of `self`; keys set in `higher` win.
    #[must_use]
    pub fn merge(self, higher: Self) -> Self {
        Self {
            filters: higher.filters.or(self.filters),
            version: higher.version.or(self.version),
            drop_columns: higher.drop_columns.or(self.drop_columns),
            gender_group: higher.gender_group.or(self.gender_group),
            full_load: higher.full_load.or(self.full_load),
            time_list: higher.time_list.or(self.time_list),
            parallelism: higher.parallelism.or(self.parallelism),
            isolate_failures: higher.isolate_failures.or(self.isolate_failures),
        }
    }

    /// Set the run-level filters.
    #[must_use]
    pub fn with_filters(mut self, filters: Vec<FilterClause>) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Set the version label.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the always-dropped columns.
    #[must_use]
    pub fn with_drop_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the gender grouping mode (`all` or `each`).
    #[must_use]
    pub fn with_gender_group(mut self, mode: impl Into<String>) -> Self {
        self.gender_group = Some(mode.into());
        self
    }

    /// Enable or disable full-load training.
    #[must_use]
    pub const fn with_full_load(mut self, full_load: bool) -> Self {
        self.full_load = Some(full_load);
        self
    }

    /// Set the time-window sets to sweep.
    #[must_use]
    pub fn with_time_list(mut self, time_list: Vec<Vec<u8>>) -> Self {
        self.time_list = Some(time_list);
        self
    }

    /// Set the dispatch concurrency limit.
    #[must_use]
    pub const fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = Some(parallelism);
        self
    }

    /// Enable or disable per-point failure isolation.
    #[must_use]
    pub const fn with_isolate_failures(mut self, isolate: bool) -> Self {
        self.isolate_failures = Some(isolate);
        self
    }
}
