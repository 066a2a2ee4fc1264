//! Configuration resolution tests
//!
//! Defaults, file/CLI layering and the fatal precondition checks that run
//! before any grid point is dispatched.

use std::io::Write;

use vo2_sweep::config::{GenderGroupMode, RunConfiguration, RunOverrides};
use vo2_sweep::Error;

// =============================================================================
// Layering
// =============================================================================

#[test]
fn test_file_then_cli_layering() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "version: paper-v2\nfull_load: true\ndrop_columns: [hr_peak]\ntime_list: [[0, 1, 2]]"
    )
    .unwrap();

    let file_layer = RunOverrides::from_file(file.path()).unwrap();
    let cli_layer = RunOverrides::from_dotlist(["full_load=false", "gender_group=each"]).unwrap();
    let config = RunConfiguration::resolve(file_layer.merge(cli_layer)).unwrap();

    assert_eq!(config.version(), "paper-v2");
    assert!(!config.full_load());
    assert_eq!(config.gender_group(), GenderGroupMode::Each);
    assert!(config.drop_columns().contains("hr_peak"));
    assert_eq!(config.time_windows().len(), 1);
    assert!(config.time_windows()[0].is_maximal());
}

#[test]
fn test_run_filters_kept_in_order() {
    let overrides =
        RunOverrides::from_dotlist(["filters=[['age', '>=', 40], ['bmi', '<', 35.5]]"]).unwrap();
    let config = RunConfiguration::resolve(overrides).unwrap();

    let rendered: Vec<String> = config.filters().iter().map(ToString::to_string).collect();
    assert_eq!(rendered, ["age >= 40", "bmi < 35.5"]);
}

#[test]
fn test_file_unknown_key_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "epochs: 10").unwrap();

    let err = RunOverrides::from_file(file.path()).unwrap_err();
    assert!(err.is_config_error());
}

#[test]
fn test_missing_file_is_io_error() {
    let err = RunOverrides::from_file("/nonexistent/vo2-sweep.yml").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

// =============================================================================
// Fatal preconditions
// =============================================================================

#[test]
fn test_invalid_gender_group_rejected() {
    let overrides = RunOverrides::from_dotlist(["gender_group=both"]).unwrap();
    let err = RunConfiguration::resolve(overrides).unwrap_err();

    assert!(matches!(err, Error::InvalidGenderGroup(ref mode) if mode == "both"));
    assert!(err.is_config_error());
}

#[test]
fn test_time_window_out_of_range_rejected() {
    let overrides = RunOverrides::default().with_time_list(vec![vec![0, 4]]);
    assert!(RunConfiguration::resolve(overrides).unwrap_err().is_config_error());
}

#[test]
fn test_empty_time_window_set_rejected() {
    let overrides = RunOverrides::default().with_time_list(vec![vec![0], vec![]]);
    assert!(RunConfiguration::resolve(overrides).unwrap_err().is_config_error());
}

#[test]
fn test_empty_time_list_rejected() {
    let overrides = RunOverrides::default().with_time_list(Vec::new());
    assert!(RunConfiguration::resolve(overrides).unwrap_err().is_config_error());
}

#[test]
fn test_blank_drop_column_rejected() {
    let overrides = RunOverrides::default().with_drop_columns(["ci", " "]);
    assert!(RunConfiguration::resolve(overrides).unwrap_err().is_config_error());
}
