//! accel-metrics: incremental derived metrics for tri-axial acceleration
//!
//! Consumes one raw acceleration sample per tick and derives velocity,
//! per-axis power, magnitudes and their deltas, current, and voltage.
//!
//! ## Architecture
//!
//! - **Config**: sparse parameter overrides resolved against fixed defaults
//! - **Engine**: the pure per-tick derivation and its carried state
//! - **Session**: Idle/Recording lifecycle and the append-only session log
//! - **Pipeline**: async sources, display sinks, and the processing loop

pub mod config;
pub mod engine;
pub mod pipeline;
pub mod session;
pub mod synthetic;
pub mod types;

pub use config::{resolve, AppConfig, ConfigKey, Configuration};
pub use engine::{derive, CarriedState, DerivationEngine};
pub use session::{FrozenLog, SessionError, SessionLog, SessionRecorder, SessionStatus};
pub use types::{RawSample, Record, Vec3};
