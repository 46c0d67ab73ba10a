//! System-wide default constants.
//!
//! Centralises the built-in parameter values and the pipeline tuning numbers.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Parameters
// ============================================================================

/// Default body mass (kg).
pub const DEFAULT_MASS_KG: f64 = 1.0;

/// Default load resistance (Ω).
pub const DEFAULT_RESISTANCE_OHM: f64 = 1.0;

/// Default initial velocity along the Y axis (m/s).
pub const DEFAULT_V0_MPS: f64 = 0.0;

/// Default nominal tick interval (s).
pub const DEFAULT_STEP_TIME_SECS: f64 = 0.1;

/// Default live chart window (s).
pub const DEFAULT_CHART_LENGTH_SECS: f64 = 10.0;

/// Default decimal precision for tables.
pub const DEFAULT_TABLE_VALUE_LENGTH: f64 = 3.0;

// ============================================================================
// Config File
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "ACCEL_METRICS_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "accel_metrics.toml";

/// Default session label when the config file omits one.
pub const DEFAULT_SESSION_LABEL: &str = "session";

// ============================================================================
// Pipeline
// ============================================================================

/// Capacity of the single-writer sample queue.
pub const SAMPLE_QUEUE_CAPACITY: usize = 1_024;

/// Capacity of the config watcher event channel.
pub const CONFIG_EVENT_CAPACITY: usize = 8;

/// Log a progress line every this many ingested samples.
pub const PROGRESS_LOG_INTERVAL: u64 = 1_000;

// ============================================================================
// Simulation
// ============================================================================

/// Default number of synthetic samples per run.
pub const SIMULATION_DEFAULT_SAMPLES: u64 = 600;

/// Standard deviation of synthetic sensor noise (m/s²).
pub const SIMULATION_NOISE_STD: f64 = 0.05;
