//! Parameter resolution: sparse user overrides layered over fixed defaults.
//!
//! Every recognized parameter has a built-in default, so resolution never
//! fails. Overrides for names that are not recognized are kept (a settings
//! surface may round-trip them) but never affect resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::defaults::{
    DEFAULT_CHART_LENGTH_SECS, DEFAULT_MASS_KG, DEFAULT_RESISTANCE_OHM, DEFAULT_STEP_TIME_SECS,
    DEFAULT_TABLE_VALUE_LENGTH, DEFAULT_V0_MPS,
};

// ============================================================================
// Recognized Keys
// ============================================================================

/// A parameter the resolver knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigKey {
    /// Body mass (kg)
    Mass,
    /// Load resistance (Ω)
    Resistance,
    /// Initial Y velocity (m/s), applied on the `tick == 0` sample only
    V0,
    /// Nominal tick interval (s). `TickRate` is accepted as an alias.
    StepTime,
    /// Trailing seconds kept on the live chart
    ChartLength,
    /// Decimal precision for tables
    TableValueLength,
}

impl ConfigKey {
    pub const ALL: [Self; 6] = [
        Self::Mass,
        Self::Resistance,
        Self::V0,
        Self::StepTime,
        Self::ChartLength,
        Self::TableValueLength,
    ];

    /// Canonical name used in override maps and config files.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mass => "Mass",
            Self::Resistance => "Resistance",
            Self::V0 => "V0",
            Self::StepTime => "StepTime",
            Self::ChartLength => "ChartLength",
            Self::TableValueLength => "TableValueLength",
        }
    }

    /// Alternate names accepted for this key.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::StepTime => &["TickRate"],
            _ => &[],
        }
    }

    pub const fn default_value(self) -> f64 {
        match self {
            Self::Mass => DEFAULT_MASS_KG,
            Self::Resistance => DEFAULT_RESISTANCE_OHM,
            Self::V0 => DEFAULT_V0_MPS,
            Self::StepTime => DEFAULT_STEP_TIME_SECS,
            Self::ChartLength => DEFAULT_CHART_LENGTH_SECS,
            Self::TableValueLength => DEFAULT_TABLE_VALUE_LENGTH,
        }
    }

    /// Every name (canonical and alias) the resolver accepts.
    pub fn all_names() -> impl Iterator<Item = &'static str> {
        Self::ALL
            .into_iter()
            .flat_map(|k| std::iter::once(k.name()).chain(k.aliases().iter().copied()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a name does not match any recognized parameter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized parameter '{0}'")]
pub struct UnknownKey(pub String);

impl FromStr for ConfigKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s || k.aliases().contains(&s))
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Sparse parameter overrides.
///
/// Serializes as a flat `name = value` table so it can sit directly under
/// `[parameters]` in the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration {
    overrides: BTreeMap<String, f64>,
}

impl Configuration {
    /// Empty override set: every key resolves to its default.
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn from_overrides(overrides: BTreeMap<String, f64>) -> Self {
        Self { overrides }
    }

    /// Builder-style override.
    #[must_use]
    pub fn with(mut self, key: ConfigKey, value: f64) -> Self {
        self.set(key, value);
        self
    }

    /// Set an override under the key's canonical name.
    ///
    /// Any alias entry for the same key is dropped so the new value wins.
    pub fn set(&mut self, key: ConfigKey, value: f64) {
        for alias in key.aliases() {
            self.overrides.remove(*alias);
        }
        self.overrides.insert(key.name().to_string(), value);
    }

    /// Set an override by raw name, recognized or not.
    pub fn set_named(&mut self, name: impl Into<String>, value: f64) {
        self.overrides.insert(name.into(), value);
    }

    /// Remove every override for the key, restoring its default.
    pub fn remove(&mut self, key: ConfigKey) {
        self.overrides.remove(key.name());
        for alias in key.aliases() {
            self.overrides.remove(*alias);
        }
    }

    /// Explicit override for the key, if one is present.
    ///
    /// The canonical name takes precedence over aliases.
    pub fn override_for(&self, key: ConfigKey) -> Option<f64> {
        self.overrides.get(key.name()).copied().or_else(|| {
            key.aliases()
                .iter()
                .find_map(|alias| self.overrides.get(*alias).copied())
        })
    }

    /// Effective value: the override if present, else the default.
    pub fn resolve(&self, key: ConfigKey) -> f64 {
        self.override_for(key).unwrap_or_else(|| key.default_value())
    }

    /// Raw override entries, including unrecognized names.
    pub const fn overrides(&self) -> &BTreeMap<String, f64> {
        &self.overrides
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Override names that do not match any recognized parameter.
    pub fn unrecognized(&self) -> impl Iterator<Item = &str> {
        self.overrides
            .keys()
            .map(String::as_str)
            .filter(|name| name.parse::<ConfigKey>().is_err())
    }

    pub fn mass(&self) -> f64 {
        self.resolve(ConfigKey::Mass)
    }

    pub fn resistance(&self) -> f64 {
        self.resolve(ConfigKey::Resistance)
    }

    pub fn v0(&self) -> f64 {
        self.resolve(ConfigKey::V0)
    }

    pub fn step_time(&self) -> f64 {
        self.resolve(ConfigKey::StepTime)
    }

    pub fn chart_length(&self) -> f64 {
        self.resolve(ConfigKey::ChartLength)
    }

    /// Table precision as a digit count. Fractional values round to nearest,
    /// negative and non-finite values collapse to zero.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn table_value_length(&self) -> usize {
        let raw = self.resolve(ConfigKey::TableValueLength).round();
        if raw.is_finite() && raw > 0.0 {
            raw as usize
        } else {
            0
        }
    }

    /// Copy of `self` with every override in `top` applied over it.
    ///
    /// Recognized names go through [`set`](Self::set), so an alias in `top`
    /// replaces the canonical entry underneath.
    #[must_use]
    pub fn layered_with(&self, top: &Self) -> Self {
        let mut merged = self.clone();
        for (name, &value) in &top.overrides {
            match name.parse::<ConfigKey>() {
                Ok(key) => merged.set(key, value),
                Err(_) => merged.set_named(name.clone(), value),
            }
        }
        merged
    }

    /// Snapshot of the values the derivation engine reads on every tick.
    pub fn engine_params(&self) -> EngineParams {
        EngineParams {
            mass: self.mass(),
            resistance: self.resistance(),
            v0: self.v0(),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            overrides: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Look up a parameter by name.
///
/// Returns `None` only when `key` is not a recognized parameter name; a
/// recognized key always resolves, falling back to its default.
pub fn resolve(config: &Configuration, key: &str) -> Option<f64> {
    key.parse::<ConfigKey>().ok().map(|k| config.resolve(k))
}

// ============================================================================
// Engine Parameters
// ============================================================================

/// Resolved parameters consumed by a single derivation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineParams {
    pub mass: f64,
    pub resistance: f64,
    pub v0: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Configuration::default().engine_params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_configuration_resolves_defaults() {
        let config = Configuration::new();
        assert_eq!(config.resolve(ConfigKey::Mass), 1.0);
        assert_eq!(config.resolve(ConfigKey::Resistance), 1.0);
        assert_eq!(config.resolve(ConfigKey::V0), 0.0);
        assert_eq!(config.resolve(ConfigKey::StepTime), 0.1);
        assert_eq!(config.resolve(ConfigKey::ChartLength), 10.0);
        assert_eq!(config.resolve(ConfigKey::TableValueLength), 3.0);
        assert_eq!(config.table_value_length(), 3);
    }

    #[test]
    fn test_override_wins_over_default() {
        let config = Configuration::new().with(ConfigKey::Mass, 2.5);
        assert_eq!(config.mass(), 2.5);
        assert_eq!(config.resistance(), 1.0);
    }

    #[test]
    fn test_tick_rate_alias_resolves_step_time() {
        let config: Configuration = [("TickRate", 0.02)].into_iter().collect();
        assert_eq!(config.step_time(), 0.02);
        assert_eq!(resolve(&config, "StepTime"), Some(0.02));
        assert_eq!(resolve(&config, "TickRate"), Some(0.02));
    }

    #[test]
    fn test_canonical_name_beats_alias() {
        let config: Configuration = [("TickRate", 0.02), ("StepTime", 0.5)].into_iter().collect();
        assert_eq!(config.step_time(), 0.5);
    }

    #[test]
    fn test_set_replaces_alias_entry() {
        let mut config: Configuration = [("TickRate", 0.02)].into_iter().collect();
        config.set(ConfigKey::StepTime, 0.25);
        assert_eq!(config.step_time(), 0.25);
        assert!(!config.overrides().contains_key("TickRate"));
    }

    #[test]
    fn test_unrecognized_override_ignored() {
        let config: Configuration = [("Colour", 7.0), ("Mass", 3.0)].into_iter().collect();
        assert_eq!(config.mass(), 3.0);
        assert_eq!(resolve(&config, "Colour"), None);
        assert_eq!(config.unrecognized().collect::<Vec<_>>(), vec!["Colour"]);
    }

    #[test]
    fn test_remove_restores_default() {
        let mut config = Configuration::new().with(ConfigKey::V0, 4.0);
        config.remove(ConfigKey::V0);
        assert_eq!(config.v0(), 0.0);
        assert!(config.is_empty());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let config = Configuration::new().with(ConfigKey::Resistance, 0.25);
        let first: Vec<f64> = ConfigKey::ALL.iter().map(|k| config.resolve(*k)).collect();
        let second: Vec<f64> = ConfigKey::ALL.iter().map(|k| config.resolve(*k)).collect();
        assert_eq!(first, second);
        assert_eq!(config, Configuration::new().with(ConfigKey::Resistance, 0.25));
    }

    #[test]
    fn test_table_value_length_rounding() {
        assert_eq!(
            Configuration::new().with(ConfigKey::TableValueLength, 4.6).table_value_length(),
            5
        );
        assert_eq!(
            Configuration::new().with(ConfigKey::TableValueLength, -2.0).table_value_length(),
            0
        );
        assert_eq!(
            Configuration::new()
                .with(ConfigKey::TableValueLength, f64::NAN)
                .table_value_length(),
            0
        );
    }

    #[test]
    fn test_layered_with_prefers_top() {
        let file: Configuration = [("Mass", 3.0), ("StepTime", 0.5), ("Resistance", 0.2)]
            .into_iter()
            .collect();
        let cli: Configuration = [("Mass", 2.5), ("TickRate", 0.05)].into_iter().collect();

        let merged = file.layered_with(&cli);
        assert_eq!(merged.mass(), 2.5);
        assert_eq!(merged.step_time(), 0.05);
        assert_eq!(merged.resistance(), 0.2);
        assert!(!merged.overrides().contains_key("TickRate"));
        assert_eq!(file.layered_with(&Configuration::new()), file);
    }

    #[test]
    fn test_key_names_round_trip() {
        for key in ConfigKey::ALL {
            assert_eq!(key.name().parse::<ConfigKey>(), Ok(key));
        }
        assert_eq!(
            "Massive".parse::<ConfigKey>(),
            Err(UnknownKey("Massive".to_string()))
        );
    }
}
