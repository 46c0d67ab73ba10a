//! Config Validation Tests
//!
//! Typo detection and range validation for the TOML config file, exercised
//! independently from the rest of the pipeline.

use accel_metrics::config::validation::{
    known_config_keys, suggest_correction, validate_physical_ranges, validate_unknown_keys,
};
use accel_metrics::config::{AppConfig, ConfigError, ConfigKey, Configuration};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_parameter_warns_with_suggestion() {
    let toml_str = r#"
[parameters]
Resistence = 0.5
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert_eq!(warnings[0].field, "parameters.Resistence");
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("parameters.Resistance")
    );
}

#[test]
fn typo_in_session_section_warns() {
    let toml_str = r#"
[session]
lable = "bench"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].suggestion.as_deref(), Some("session.label"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[parameters]
Mass = 2.0
Resistance = 0.25
V0 = 1.0
TickRate = 0.05
ChartLength = 30.0
TableValueLength = 4

[session]
label = "treadmill"
emit_records = true
"#;
    assert!(validate_unknown_keys(toml_str).is_empty());
    let config = AppConfig::from_toml_str(toml_str).unwrap();
    assert_eq!(config.parameters.step_time(), 0.05);
    assert_eq!(config.parameters.table_value_length(), 4);
    assert!(config.session.emit_records);
}

#[test]
fn completely_unrelated_key_has_no_suggestion() {
    let warnings = validate_unknown_keys("[telemetry]\nendpoint = \"udp://x\"\n");
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| w.suggestion.is_none()));
}

#[test]
fn unknown_keys_do_not_fail_the_load() {
    let config = AppConfig::from_toml_str("[parameters]\nMas = 3.0\n").unwrap();
    // The typo is carried but ignored by resolution
    assert_eq!(config.parameters.mass(), 1.0);
    assert_eq!(config.parameters.unrecognized().collect::<Vec<_>>(), vec!["Mas"]);
}

#[test]
fn suggest_correction_prefers_closest() {
    let known = known_config_keys();
    assert_eq!(
        suggest_correction("parameters.StepTim", &known).as_deref(),
        Some("parameters.StepTime")
    );
    assert_eq!(suggest_correction("zzzzzzzzzzzz", &known), None);
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn negative_chart_length_is_error() {
    let config = Configuration::new().with(ConfigKey::ChartLength, -1.0);
    let (errors, _) = validate_physical_ranges(&config);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("ChartLength"));
}

#[test]
fn infinite_value_is_error() {
    let config = Configuration::new().with(ConfigKey::Resistance, f64::INFINITY);
    let (errors, _) = validate_physical_ranges(&config);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("finite"));
}

#[test]
fn negative_resistance_only_warns() {
    let config = Configuration::new().with(ConfigKey::Resistance, -0.1);
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty());
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "Resistance");
}

#[test]
fn zero_mass_and_fractional_precision_warn() {
    let config = Configuration::new()
        .with(ConfigKey::Mass, 0.0)
        .with(ConfigKey::TableValueLength, 2.5);
    let (errors, warnings) = validate_physical_ranges(&config);
    assert!(errors.is_empty());
    assert_eq!(warnings.len(), 2);
}

#[test]
fn multiple_errors_reported_together() {
    let err = AppConfig::from_toml_str(
        r#"
[parameters]
StepTime = -0.1
ChartLength = 0.0
TableValueLength = -3
"#,
    )
    .unwrap_err();

    match err {
        ConfigError::Validation(errors) => assert_eq!(errors.len(), 3),
        other => panic!("expected validation error, got {other}"),
    }
}

// ============================================================================
// File Round Trip
// ============================================================================

#[test]
fn save_and_reload_preserves_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accel_metrics.toml");

    let mut config = AppConfig::default();
    config.parameters.set(ConfigKey::Mass, 70.0);
    config.parameters.set(ConfigKey::V0, 1.4);
    config.session.label = "walk".to_string();
    config.save_to_file(&path).unwrap();

    let loaded = AppConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_, _)));
}
