//! Derivation Engine
//!
//! Deterministic per-tick transform from a raw acceleration sample to a
//! fully derived [`Record`]. All math here is plain arithmetic over `f64`:
//! no I/O, no globals, no clamping.
//!
//! ## Per-tick chain
//!
//! ```text
//! accel ──► |a| ──► Δ|a|
//!   │
//!   └──► velocity (running sum, V0 on tick 0)
//!             │
//!             └──► power per axis = mass · a · v ──► |p| ──► Δ|p|
//!                                                     │
//!                                                     └──► current = √(|p|·R)
//!                                                               │
//!                                                               └──► voltage = current·R
//! ```
//!
//! Velocity is a running sum of per-tick acceleration and is not scaled by
//! the tick interval. Power is axis-decoupled (`mass · a_axis · v_axis`).

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::{Configuration, EngineParams};
use crate::types::{RawSample, Record, Vec3};

// ============================================================================
// Carried State
// ============================================================================

/// Minimal history carried from one tick to the next.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CarriedState {
    pub previous_velocity: Vec3,
    pub previous_accel_magnitude: f64,
    pub previous_power_magnitude: f64,
}

impl CarriedState {
    /// Baseline state at the start of every session.
    pub const ZERO: Self = Self {
        previous_velocity: Vec3::ZERO,
        previous_accel_magnitude: 0.0,
        previous_power_magnitude: 0.0,
    };
}

// ============================================================================
// Pure Derivation
// ============================================================================

/// Derive one record and the next carried state.
///
/// Total over its inputs: a negative `p_mag * resistance` yields NaN
/// current and voltage, and non-finite inputs propagate unchanged.
pub fn derive(
    sample: &RawSample,
    params: &EngineParams,
    state: &CarriedState,
) -> (Record, CarriedState) {
    let accel = sample.accel();

    let a_mag = accel.magnitude();
    let a_mag_delta = a_mag - state.previous_accel_magnitude;

    let velocity = if is_session_origin(sample.tick) {
        Vec3::new(0.0, params.v0, 0.0)
    } else {
        state.previous_velocity + accel
    };

    let power = accel.hadamard(&velocity) * params.mass;
    let p_mag = power.magnitude();
    let p_mag_delta = p_mag - state.previous_power_magnitude;

    let current = (p_mag * params.resistance).sqrt();
    let voltage = current * params.resistance;

    let record = Record {
        t: sample.tick,
        ax: sample.ax,
        ay: sample.ay,
        az: sample.az,
        vx: velocity.x,
        vy: velocity.y,
        vz: velocity.z,
        a_mag,
        a_mag_delta,
        px: power.x,
        py: power.y,
        pz: power.z,
        p_mag,
        p_mag_delta,
        current,
        voltage,
    };

    let next = CarriedState {
        previous_velocity: velocity,
        previous_accel_magnitude: a_mag,
        previous_power_magnitude: p_mag,
    };

    trace!(t = record.t, a_mag, p_mag, current, "Derived record");

    (record, next)
}

/// The `tick == 0` sample seeds velocity from `V0` instead of accumulating.
#[allow(clippy::float_cmp)]
fn is_session_origin(tick: f64) -> bool {
    tick == 0.0
}

// ============================================================================
// Stateful Engine
// ============================================================================

/// Owns the single mutable [`CarriedState`] of a session.
///
/// Parameters are resolved from the supplied [`Configuration`] on every
/// call, so a configuration edited between ticks takes effect on the next
/// one.
#[derive(Debug, Clone, Default)]
pub struct DerivationEngine {
    state: CarriedState,
    ticks: u64,
}

impl DerivationEngine {
    pub const fn new() -> Self {
        Self {
            state: CarriedState::ZERO,
            ticks: 0,
        }
    }

    /// Derive the record for `sample` and advance the carried state.
    pub fn step(&mut self, sample: &RawSample, config: &Configuration) -> Record {
        let params = config.engine_params();
        let (record, next) = derive(sample, &params, &self.state);
        self.state = next;
        self.ticks += 1;
        record
    }

    /// Return to the zero baseline.
    pub fn reset(&mut self) {
        self.state = CarriedState::ZERO;
        self.ticks = 0;
    }

    pub const fn state(&self) -> &CarriedState {
        &self.state
    }

    /// Samples derived since the last reset.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }
}
