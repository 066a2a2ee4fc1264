//! Lazy cross-product enumeration of grid points

use std::collections::BTreeSet;

use crate::config::{GenderGroupMode, RunConfiguration};
use crate::filter::{compose, gender_clause};

use super::{CohortGroup, Fold, GridPoint, TimeWindowSet, CI_COLUMN, FOLD_COUNT, GENDER_VALUES};

/// The sweep grid for one configuration.
///
/// `Grid` holds no iteration state; every call to [`Grid::iter`] starts a
/// fresh pass, so enumeration is restartable and can be inspected (counted,
/// keyed) before anything is dispatched.
///
/// ## Order
///
/// Gender stratum outermost (when `EACH`), then cohort, then time-window
/// set, then fold (or `FULL` followed by the drop-ci variant).
#[derive(Debug, Clone, Copy)]
pub struct Grid<'a> {
    config: &'a RunConfiguration,
}

impl<'a> Grid<'a> {
    /// Create the grid for a resolved configuration.
    #[must_use]
    pub const fn new(config: &'a RunConfiguration) -> Self {
        Self { config }
    }

    /// Start a new enumeration pass.
    #[must_use]
    pub fn iter(&self) -> GridIter<'a> {
        GridIter {
            config: self.config,
            strata: strata(self.config.gender_group()),
            stratum: 0,
            cohort: 0,
            window: 0,
            variant: 0,
        }
    }

    /// Exact number of grid points.
    ///
    /// `3 × Σ_windows variants(window) × strata`, where a window contributes
    /// 5 folds under cross-validation, or 1 point (2 for the maximal set)
    /// under full load.
    #[must_use]
    pub fn len(&self) -> usize {
        let full_load = self.config.full_load();
        let per_cohort: usize = self
            .config
            .time_windows()
            .iter()
            .map(|w| variant_count(full_load, w))
            .sum();
        strata(self.config.gender_group()).len() * CohortGroup::ALL.len() * per_cohort
    }

    /// Whether the grid has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> IntoIterator for &Grid<'a> {
    type Item = GridPoint;
    type IntoIter = GridIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn strata(mode: GenderGroupMode) -> Vec<Option<u8>> {
    match mode {
        GenderGroupMode::All => vec![None],
        GenderGroupMode::Each => GENDER_VALUES.iter().copied().map(Some).collect(),
    }
}

fn variant_count(full_load: bool, windows: &TimeWindowSet) -> usize {
    if !full_load {
        usize::from(FOLD_COUNT)
    } else if windows.is_maximal() {
        2
    } else {
        1
    }
}

/// `(fold, drop_ci)` for the `idx`-th variant of a window set.
#[allow(clippy::cast_possible_truncation)]
fn variant_at(full_load: bool, idx: usize) -> (Fold, bool) {
    if full_load {
        (Fold::Full, idx == 1)
    } else {
        // idx < FOLD_COUNT, guarded by variant_count
        (Fold::Index(idx as u8), false)
    }
}

/// Iterator over the points of a [`Grid`].
#[derive(Debug, Clone)]
pub struct GridIter<'a> {
    config: &'a RunConfiguration,
    strata: Vec<Option<u8>>,
    stratum: usize,
    cohort: usize,
    window: usize,
    variant: usize,
}

impl GridIter<'_> {
    fn build(
        &self,
        gender: Option<u8>,
        cohort: CohortGroup,
        windows: &TimeWindowSet,
        fold: Fold,
        drop_ci: bool,
    ) -> GridPoint {
        let stratification = gender.map(gender_clause);
        let mut drop_columns: BTreeSet<String> = self.config.drop_columns().clone();
        if drop_ci {
            drop_columns.insert(CI_COLUMN.to_string());
        }
        GridPoint {
            cohort,
            time_windows: windows.clone(),
            fold,
            gender,
            drop_ci,
            drop_columns,
            filters: compose(self.config.filters(), stratification.as_ref()),
        }
    }
}

impl Iterator for GridIter<'_> {
    type Item = GridPoint;

    fn next(&mut self) -> Option<GridPoint> {
        let config = self.config;
        let windows = config.time_windows();
        let full_load = config.full_load();
        loop {
            let &gender = self.strata.get(self.stratum)?;
            let Some(&cohort) = CohortGroup::ALL.get(self.cohort) else {
                self.stratum += 1;
                self.cohort = 0;
                continue;
            };
            let Some(window_set) = windows.get(self.window) else {
                self.cohort += 1;
                self.window = 0;
                continue;
            };
            if self.variant >= variant_count(full_load, window_set) {
                self.window += 1;
                self.variant = 0;
                continue;
            }
            let (fold, drop_ci) = variant_at(full_load, self.variant);
            self.variant += 1;
            return Some(self.build(gender, cohort, window_set, fold, drop_ci));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunOverrides;

    fn config(overrides: RunOverrides) -> RunConfiguration {
        RunConfiguration::resolve(overrides).unwrap()
    }

    #[test]
    fn test_default_grid_is_cross_validation() {
        let config = config(RunOverrides::default());
        let grid = Grid::new(&config);
        assert_eq!(grid.len(), 3 * 3 * 5);
        assert_eq!(grid.iter().count(), grid.len());
    }

    #[test]
    fn test_order_cohort_major() {
        let config = config(
            RunOverrides::default()
                .with_full_load(true)
                .with_time_list(vec![vec![0], vec![0, 1, 2]]),
        );
        let keys: Vec<String> = Grid::new(&config).iter().map(|p| p.key()).collect();
        assert_eq!(
            keys,
            [
                "NG_[0]",
                "NG_[0, 1, 2]",
                "NG_[0, 1, 2]_(-ci)",
                "OG_[0]",
                "OG_[0, 1, 2]",
                "OG_[0, 1, 2]_(-ci)",
                "NG+OG_[0]",
                "NG+OG_[0, 1, 2]",
                "NG+OG_[0, 1, 2]_(-ci)",
            ]
        );
    }

    #[test]
    fn test_gender_outermost() {
        let config = config(
            RunOverrides::default()
                .with_gender_group("each")
                .with_full_load(true)
                .with_time_list(vec![vec![0]]),
        );
        let genders: Vec<Option<u8>> = Grid::new(&config).iter().map(|p| p.gender).collect();
        assert_eq!(
            genders,
            [Some(0), Some(0), Some(0), Some(1), Some(1), Some(1)]
        );
    }

    #[test]
    fn test_drop_ci_point_adds_column() {
        let config = config(
            RunOverrides::default()
                .with_full_load(true)
                .with_drop_columns(["hr_peak"])
                .with_time_list(vec![vec![0, 1, 2]]),
        );
        let points: Vec<GridPoint> = Grid::new(&config).iter().collect();
        let plain = &points[0];
        let variant = &points[1];

        assert!(!plain.drop_ci);
        assert!(!plain.drop_columns.contains(CI_COLUMN));
        assert!(variant.drop_ci);
        assert!(variant.drop_columns.contains(CI_COLUMN));
        assert!(variant.drop_columns.contains("hr_peak"));
    }

    #[test]
    fn test_restartable() {
        let config = config(RunOverrides::default());
        let grid = Grid::new(&config);
        let first: Vec<String> = grid.iter().map(|p| p.key()).collect();
        let second: Vec<String> = (&grid).into_iter().map(|p| p.key()).collect();
        assert_eq!(first, second);
    }
}
