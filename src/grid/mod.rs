//! Experiment grid model
//!
//! A sweep is the cross-product of:
//!
//! ```text
//! gender stratum (EACH only) ─┐
//!   cohort group (NG, OG, NG+OG)
//!     time-window set (configured order)
//!       fold 0..5 | FULL [+ drop-ci variant]
//! ```
//!
//! [`GridPoint`] is one cell of that product; [`Grid`] enumerates them.

mod enumerator;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::filter::FilterClause;
use crate::{Error, Result};

pub use enumerator::{Grid, GridIter};

/// Number of cross-validation folds swept when `full_load` is off.
pub const FOLD_COUNT: u8 = 5;

/// Gender codes swept when stratifying.
pub const GENDER_VALUES: [u8; 2] = [0, 1];

/// Column forcibly dropped by the drop-ci variant.
pub const CI_COLUMN: &str = "ci";

/// Patient population compared by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CohortGroup {
    /// Combined new group
    #[serde(rename = "NG")]
    New,
    /// Combined old group
    #[serde(rename = "OG")]
    Old,
    /// Union of the new and old groups
    #[serde(rename = "NG+OG")]
    Combined,
}

impl CohortGroup {
    /// All cohorts in dispatch order.
    pub const ALL: [Self; 3] = [Self::New, Self::Old, Self::Combined];

    /// Label used in grid keys and passed to the experiment.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "NG",
            Self::Old => "OG",
            Self::Combined => "NG+OG",
        }
    }
}

impl fmt::Display for CohortGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Feature category included in an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeWindow {
    /// Demographic features (index 0)
    Demographic = 0,
    /// Resting measurements (index 1)
    Rest = 1,
    /// Submaximal exercise measurements (index 2)
    Submaximal = 2,
}

impl TimeWindow {
    /// Numeric index used in configuration and grid keys.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for TimeWindow {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self> {
        match index {
            0 => Ok(Self::Demographic),
            1 => Ok(Self::Rest),
            2 => Ok(Self::Submaximal),
            other => Err(Error::Config(format!(
                "time window index {other} out of range (0: Demographic, 1: Rest, 2: Submaximal)"
            ))),
        }
    }
}

/// Subset of feature categories swept as one dimension value.
///
/// Displays like `[0, 1, 2]`, which is the form used in grid keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct TimeWindowSet(BTreeSet<TimeWindow>);

impl TimeWindowSet {
    /// Build a set from configured indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the list is empty or contains an index
    /// outside `0..=2`.
    pub fn from_indices(indices: &[u8]) -> Result<Self> {
        if indices.is_empty() {
            return Err(Error::Config(
                "time window set must contain at least one index".to_string(),
            ));
        }
        indices
            .iter()
            .map(|&i| TimeWindow::try_from(i))
            .collect::<Result<BTreeSet<_>>>()
            .map(Self)
    }

    /// The maximal set `{Demographic, Rest, Submaximal}`.
    #[must_use]
    pub fn maximal() -> Self {
        [TimeWindow::Demographic, TimeWindow::Rest, TimeWindow::Submaximal]
            .into_iter()
            .collect()
    }

    /// Whether this is exactly the maximal set.
    #[must_use]
    pub fn is_maximal(&self) -> bool {
        self.0.len() == 3
    }

    /// Indices in ascending order.
    #[must_use]
    pub fn indices(&self) -> Vec<u8> {
        self.0.iter().map(|w| w.index()).collect()
    }

    /// Iterate over the included windows.
    pub fn iter(&self) -> impl Iterator<Item = TimeWindow> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<TimeWindow> for TimeWindowSet {
    fn from_iter<I: IntoIterator<Item = TimeWindow>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl TryFrom<Vec<u8>> for TimeWindowSet {
    type Error = Error;

    fn try_from(indices: Vec<u8>) -> Result<Self> {
        Self::from_indices(&indices)
    }
}

impl From<TimeWindowSet> for Vec<u8> {
    fn from(set: TimeWindowSet) -> Self {
        set.indices()
    }
}

impl fmt::Display for TimeWindowSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|w| w.index().to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Cross-validation selector: a holdout fold, or the whole dataset.
///
/// Serialized as the bare fold number (`3`) or the string `"full"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFold", into = "RawFold")]
pub enum Fold {
    /// Hold out fold `n` (`0..FOLD_COUNT`)
    Index(u8),
    /// No holdout; train on the entire dataset
    Full,
}

const FULL_LABEL: &str = "full";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawFold {
    Index(u8),
    Label(String),
}

impl TryFrom<RawFold> for Fold {
    type Error = Error;

    fn try_from(raw: RawFold) -> Result<Self> {
        match raw {
            RawFold::Index(n) if n < FOLD_COUNT => Ok(Self::Index(n)),
            RawFold::Index(n) => Err(Error::Config(format!(
                "fold {n} out of range: expected 0..{FOLD_COUNT} or '{FULL_LABEL}'"
            ))),
            RawFold::Label(label) if label == FULL_LABEL => Ok(Self::Full),
            RawFold::Label(label) => Err(Error::Config(format!(
                "unknown fold '{label}': expected 0..{FOLD_COUNT} or '{FULL_LABEL}'"
            ))),
        }
    }
}

impl From<Fold> for RawFold {
    fn from(fold: Fold) -> Self {
        match fold {
            Fold::Index(n) => Self::Index(n),
            Fold::Full => Self::Label(FULL_LABEL.to_string()),
        }
    }
}

impl fmt::Display for Fold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(n) => write!(f, "fold {n}"),
            Self::Full => f.write_str(FULL_LABEL),
        }
    }
}

/// One unit of work: a single experiment to run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridPoint {
    /// Cohort being modelled
    pub cohort: CohortGroup,
    /// Feature categories included
    pub time_windows: TimeWindowSet,
    /// Holdout selector
    pub fold: Fold,
    /// Gender stratum, when the sweep is stratified
    pub gender: Option<u8>,
    /// Whether this is the drop-ci variant
    pub drop_ci: bool,
    /// Final drop-column set (run-level columns plus `ci` for the variant)
    pub drop_columns: BTreeSet<String>,
    /// Composed filter clauses
    pub filters: Vec<FilterClause>,
}

impl GridPoint {
    /// Human-readable mapping key.
    ///
    /// `{cohort}_{windows}`, then `_fold{n}` for cross-validation folds,
    /// `_gender{g}` for stratified points and `_(-ci)` for the drop-ci
    /// variant. A full-load, unstratified point keeps the short form, e.g.
    /// `NG+OG_[0, 1, 2]_(-ci)`.
    #[must_use]
    pub fn key(&self) -> String {
        let mut key = format!("{}_{}", self.cohort, self.time_windows);
        if let Fold::Index(n) = self.fold {
            key.push_str(&format!("_fold{n}"));
        }
        if let Some(g) = self.gender {
            key.push_str(&format!("_gender{g}"));
        }
        if self.drop_ci {
            key.push_str("_(-ci)");
        }
        key
    }
}
