//! Tests for error types

use tabarena_bench::Error;

#[test]
fn test_config_error() {
    let error = Error::Config("--cuml-profile cannot be combined with --num-gpus 0".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid configuration"));
    assert!(error_str.contains("--num-gpus 0"));
}

#[test]
fn test_ambiguous_prefix_error() {
    let error = Error::AmbiguousPrefix {
        prefix: "ab".to_string(),
        matches: vec!["ab01".to_string(), "ab02".to_string()],
    };
    let error_str = format!("{error}");
    assert!(error_str.starts_with("Multiple runs match 'ab'. Please be more specific:"));
    assert!(error_str.contains("\n  - ab01\n  - ab02"));
}

#[test]
fn test_not_found_error() {
    let error = Error::NotFound("deadbeef".to_string());
    assert_eq!(
        format!("{error}"),
        "No run found with run_id starting with 'deadbeef'"
    );
}

#[test]
fn test_unknown_table_error() {
    let error = Error::UnknownTable("nope".to_string());
    let error_str = format!("{error}");
    assert!(error_str.starts_with("No table named 'nope'"));
    assert!(error_str.contains("`tables`"));
}

#[test]
fn test_insufficient_data_error() {
    let error = Error::InsufficientData {
        dataset: "credit-g".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Insufficient data"));
    assert!(error_str.contains("credit-g"));
    assert!(error_str.contains("num_gpus=0"));
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing output");
    let error: Error = io.into();
    assert!(matches!(error, Error::Io(_)));
    assert!(format!("{error}").contains("IO error"));
}

#[test]
fn test_settings_error_conversion() {
    let parse = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
    let error: Error = parse.into();
    assert!(format!("{error}").starts_with("Settings error"));
}

#[test]
fn test_json_error_conversion() {
    let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: Error = parse.into();
    assert!(format!("{error}").contains("JSON error"));
}

#[test]
fn test_other_error() {
    let error = Error::Other("custom".to_string());
    assert_eq!(format!("{error}"), "custom");
}

#[test]
fn test_error_debug() {
    let error = Error::NotFound("x".to_string());
    assert!(format!("{error:?}").contains("NotFound"));
}
