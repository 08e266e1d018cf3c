//! Tests for error types

use nfv_bench::Error;

#[test]
fn test_missing_field_error() {
    let error = Error::MissingField {
        experiment: "throughput".to_string(),
        field: "repetitions".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("throughput"));
    assert!(error_str.contains("missing required field 'repetitions'"));
}

#[test]
fn test_invalid_field_error() {
    let error = Error::InvalidField {
        experiment: "throughput".to_string(),
        field: "measurement_points".to_string(),
        reason: "expected a list".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("invalid field 'measurement_points'"));
    assert!(error_str.contains("expected a list"));
}

#[test]
fn test_malformed_macro_error() {
    let error = Error::MalformedMacro("'min' is missing".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Malformed range macro"));
    assert!(error_str.contains("'min' is missing"));
}

#[test]
fn test_invalid_parameter_key_error() {
    let error = Error::InvalidParameterKey("ep::cpu".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid parameter key"));
    assert!(error_str.contains("ep::cpu"));
}

#[test]
fn test_key_collision_error() {
    let error = Error::KeyCollision("ep::function::fw::cpu_cores".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Parameter key collision"));
    assert!(error_str.contains("same field for the same owner"));
}

#[test]
fn test_population_state_errors() {
    let error = Error::AlreadyPopulated("e".to_string());
    assert!(format!("{error}").contains("already populated"));

    let error = Error::NotPopulated("e".to_string());
    assert!(format!("{error}").contains("not been populated"));
}

#[test]
fn test_space_too_large_error() {
    let error = Error::SpaceTooLarge("sweep".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("'sweep' overflows"));
    assert!(error_str.contains("max_experiments"));
}

#[test]
fn test_run_ids_exhausted_error() {
    let error = Error::RunIdsExhausted {
        requested: 5,
        next: u64::MAX - 1,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Run ids exhausted"));
    assert!(error_str.contains(&format!("allocate 5 ids starting at {}", u64::MAX - 1)));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
    assert!(error_str.contains("file not found"));
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("JSON error"));
}

#[test]
fn test_other_error() {
    let error = Error::Other("custom message".to_string());
    assert_eq!(format!("{error}"), "custom message");
}

#[test]
fn test_error_debug() {
    let error = Error::MalformedMacro("debug test".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("MalformedMacro"));
}
