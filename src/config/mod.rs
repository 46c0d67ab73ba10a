//! Configuration Module
//!
//! Two layers:
//!
//! - [`Configuration`]: sparse numeric overrides resolved against fixed
//!   defaults. This is what the derivation engine reads on every tick and it
//!   is always passed explicitly, never held in a global.
//! - [`AppConfig`]: the TOML file wrapping those overrides together with
//!   session options, with typo detection and range validation.
//!
//! ## Loading Order
//!
//! 1. `ACCEL_METRICS_CONFIG` environment variable (path to TOML file)
//! 2. `accel_metrics.toml` in the current working directory
//! 3. Built-in defaults

mod app_config;
mod parameters;
pub mod defaults;
pub mod validation;
pub mod watcher;

pub use app_config::{AppConfig, ConfigError, SessionOptions};
pub use parameters::{resolve, ConfigKey, Configuration, EngineParams, UnknownKey};
