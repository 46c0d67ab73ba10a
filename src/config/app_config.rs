//! Application configuration loaded from TOML
//!
//! The file carries the sparse parameter overrides plus a few session
//! options. Every section is optional; a missing file means built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults::{CONFIG_ENV_VAR, DEFAULT_SESSION_LABEL, LOCAL_CONFIG_FILE};
use super::parameters::Configuration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `AppConfig::load()` which searches:
/// 1. `$ACCEL_METRICS_CONFIG` env var
/// 2. `./accel_metrics.toml`
/// 3. Built-in defaults
///
/// ```toml
/// [parameters]
/// Mass = 2.0
/// Resistance = 0.25
/// TickRate = 0.05
///
/// [session]
/// label = "bench-run"
/// emit_records = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Sparse overrides for the derivation parameters
    #[serde(default)]
    pub parameters: Configuration,

    /// Session presentation options
    #[serde(default)]
    pub session: SessionOptions,
}

impl AppConfig {
    /// Load configuration using the standard search order:
    /// 1. `$ACCEL_METRICS_CONFIG` environment variable
    /// 2. `./accel_metrics.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(
                            path = %p.display(),
                            label = %config.session.label,
                            "Loaded config from {}",
                            CONFIG_ENV_VAR
                        );
                        return config;
                    }
                    Err(e) => {
                        warn!(
                            path = %p.display(),
                            error = %e,
                            "Failed to load config from {}, falling back",
                            CONFIG_ENV_VAR
                        );
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(
                        label = %config.session.label,
                        "Loaded config from ./{}",
                        LOCAL_CONFIG_FILE
                    );
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings and never fail the load.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file, e.g. after a settings surface edits it.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Range-check the parameters.
    ///
    /// Hard errors are collected and returned together; suspicious but
    /// usable values are only logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_physical_ranges(&self.parameters);
        for w in &warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n{}", format_errors(.0))]
    Validation(Vec<String>),
}

fn format_errors(errors: &[String]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Session Options
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Free-form label that appears in logs
    #[serde(default = "default_session_label")]
    pub label: String,

    /// Write every derived record to stdout as a JSON line
    #[serde(default)]
    pub emit_records: bool,
}

fn default_session_label() -> String {
    DEFAULT_SESSION_LABEL.to_string()
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            label: default_session_label(),
            emit_records: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigKey;

    #[test]
    fn test_empty_document_is_default() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.session.label, "session");
        assert!(config.parameters.is_empty());
    }

    #[test]
    fn test_parameters_section_parsed() {
        let config = AppConfig::from_toml_str(
            r#"
[parameters]
Mass = 2.0
TickRate = 0.05

[session]
label = "bench"
"#,
        )
        .unwrap();

        assert_eq!(config.parameters.resolve(ConfigKey::Mass), 2.0);
        assert_eq!(config.parameters.step_time(), 0.05);
        assert_eq!(config.parameters.resistance(), 1.0);
        assert_eq!(config.session.label, "bench");
        assert!(!config.session.emit_records);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = AppConfig::default();
        config.parameters.set(ConfigKey::Resistance, 0.25);
        config.session.emit_records = true;

        let text = config.to_toml().unwrap();
        let parsed = AppConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_step_time_rejected() {
        let err = AppConfig::from_toml_str("[parameters]\nStepTime = 0.0\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("StepTime"));
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = AppConfig::from_toml_str("[parameters\nMass = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_, _)));
    }
}
