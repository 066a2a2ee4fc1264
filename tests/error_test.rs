//! Tests for error types

use vo2_sweep::Error;

#[test]
fn test_config_error() {
    let error = Error::Config("time_list must not be empty".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid configuration"));
    assert!(error_str.contains("time_list"));
    assert!(error.is_config_error());
}

#[test]
fn test_invalid_gender_group_error() {
    let error = Error::InvalidGenderGroup("both".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("'both'"));
    assert!(error_str.contains("'all' or 'each'"));
    assert!(error.is_config_error());
}

#[test]
fn test_invalid_filter_error() {
    let error = Error::InvalidFilter("unsupported operator '~'".to_string());
    assert!(format!("{error}").contains("Malformed filter clause"));
    assert!(error.is_config_error());
}

#[test]
fn test_duplicate_key_error() {
    let error = Error::DuplicateGridKey("NG_[0]".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("NG_[0]"));
    assert!(error_str.contains("Please report this issue"));
    assert!(!error.is_config_error());
}

#[test]
fn test_experiment_failed_error() {
    let error = Error::ExperimentFailed {
        key: "OG_[0, 1]_fold2".to_string(),
        message: "trainer exited with exit status: 1".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("OG_[0, 1]_fold2"));
    assert!(error_str.contains("exit status"));
    assert!(!error.is_config_error());
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    assert!(format!("{error}").contains("IO error"));
}

#[test]
fn test_other_error() {
    let error = Error::Other("custom error message".to_string());
    assert_eq!(format!("{error}"), "custom error message");
}

#[test]
fn test_result_type_alias_error() {
    fn returns_error() -> vo2_sweep::Result<i32> {
        Err(Error::UnknownRun("abc".to_string()))
    }

    let result = returns_error();
    assert!(result.is_err());
}
