//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse: the raw TOML is first walked as a `toml::Value` tree and
//! compared against the known key paths, producing "did you mean?" warnings.
//! Normal serde deserialization follows. Unknown keys never break a config.

use std::collections::HashSet;

use super::parameters::{ConfigKey, Configuration};

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path in the config file.
///
/// Parameter names come from [`ConfigKey`], so new parameters are picked up
/// automatically. The `[session]` keys must track `SessionOptions`.
pub fn known_config_keys() -> HashSet<String> {
    let mut keys: HashSet<String> = [
        "parameters",
        "session",
        "session.label",
        "session.emit_records",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    keys.extend(ConfigKey::all_names().map(|name| format!("parameters.{name}")));
    keys
}

/// Recursively collect dotted key paths from a TOML value.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest candidate so the
/// suggestion does not depend on hash order.
pub fn suggest_correction(unknown: &str, known: &HashSet<String>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.clone())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Parse failures return no warnings; serde reports them afterwards.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate parameter ranges.
///
/// Returns `(errors, warnings)`. Errors are values the pipeline cannot run
/// with; warnings are values that run but produce degenerate output.
pub fn validate_physical_ranges(config: &Configuration) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for key in ConfigKey::ALL {
        if let Some(value) = config.override_for(key) {
            if !value.is_finite() {
                errors.push(format!("{key} = {value} must be a finite number"));
            }
        }
    }

    let step = config.step_time();
    if step.is_finite() && step <= 0.0 {
        errors.push(format!("StepTime = {step} must be > 0 seconds"));
    }

    let chart = config.chart_length();
    if chart.is_finite() && chart <= 0.0 {
        errors.push(format!("ChartLength = {chart} must be > 0 seconds"));
    }

    let precision = config.resolve(ConfigKey::TableValueLength);
    if precision.is_finite() {
        if precision < 0.0 {
            errors.push(format!("TableValueLength = {precision} cannot be negative"));
        } else if precision.fract() != 0.0 {
            warnings.push(ValidationWarning {
                field: ConfigKey::TableValueLength.name().to_string(),
                message: format!(
                    "TableValueLength = {precision} is not a whole number, rounding to {}",
                    config.table_value_length()
                ),
                suggestion: None,
            });
        }
    }

    let mass = config.mass();
    if mass.is_finite() && mass <= 0.0 {
        warnings.push(ValidationWarning {
            field: ConfigKey::Mass.name().to_string(),
            message: format!("Mass = {mass} is not positive, power will be zero or inverted"),
            suggestion: None,
        });
    }

    let resistance = config.resistance();
    if resistance.is_finite() && resistance < 0.0 {
        warnings.push(ValidationWarning {
            field: ConfigKey::Resistance.name().to_string(),
            message: format!(
                "Resistance = {resistance} is negative, current is NaN for non-zero power"
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("Mass", "Mass"), 0);
    }

    #[test]
    fn test_known_keys_include_alias() {
        let keys = known_config_keys();
        assert!(keys.contains("parameters.TickRate"));
        assert!(keys.contains("parameters.StepTime"));
        assert!(keys.contains("session.emit_records"));
    }

    #[test]
    fn test_default_configuration_is_clean() {
        let (errors, warnings) = validate_physical_ranges(&Configuration::default());
        assert!(errors.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_nan_override_is_error() {
        let config = Configuration::new().with(ConfigKey::Mass, f64::NAN);
        let (errors, _) = validate_physical_ranges(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Mass"));
    }
}
