//! Shared data structures for the acceleration metrics pipeline
//!
//! - `RawSample`: one tick of tri-axial acceleration from the external source
//! - `Vec3`: small helper for the per-axis quantities
//! - `Record`: the fully derived tuple emitted once per tick

use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

// ============================================================================
// Raw Input
// ============================================================================

/// One raw acceleration sample.
///
/// `tick` is elapsed seconds since recording start. Acceleration is in m/s²
/// with gravity already removed upstream. Ticks are expected to strictly
/// increase within a session; nothing here checks that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub tick: f64,
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
}

impl RawSample {
    pub const fn new(tick: f64, ax: f64, ay: f64, az: f64) -> Self {
        Self { tick, ax, ay, az }
    }

    /// Acceleration as a vector.
    pub const fn accel(&self) -> Vec3 {
        Vec3::new(self.ax, self.ay, self.az)
    }
}

// ============================================================================
// Vector Helper
// ============================================================================

/// Three-component vector used for velocity and power.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Component-wise product.
    pub fn hadamard(&self, other: &Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

// ============================================================================
// Derived Record
// ============================================================================

/// Fully derived metrics for a single tick.
///
/// Built only by the derivation engine and never mutated afterwards. Field
/// order matches [`Record::COLUMNS`], which is the column order used by
/// tabulation and export consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Echo of the input tick (seconds)
    pub t: f64,

    pub ax: f64,
    pub ay: f64,
    pub az: f64,

    /// Running-sum velocity
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,

    /// Norm of the acceleration vector
    pub a_mag: f64,
    /// `a_mag` minus the previous tick's `a_mag`
    pub a_mag_delta: f64,

    /// Per-axis power: `mass * a_axis * v_axis`
    pub px: f64,
    pub py: f64,
    pub pz: f64,

    /// Norm of the power vector
    pub p_mag: f64,
    /// `p_mag` minus the previous tick's `p_mag`
    pub p_mag_delta: f64,

    /// `sqrt(p_mag * resistance)`
    pub current: f64,
    /// `current * resistance`
    pub voltage: f64,
}

impl Record {
    /// Column names in tabulation order.
    pub const COLUMNS: [&'static str; 16] = [
        "t",
        "ax",
        "ay",
        "az",
        "vx",
        "vy",
        "vz",
        "a_mag",
        "a_mag_delta",
        "px",
        "py",
        "pz",
        "p_mag",
        "p_mag_delta",
        "current",
        "voltage",
    ];

    /// Field values in the same order as [`Record::COLUMNS`].
    pub const fn values(&self) -> [f64; 16] {
        [
            self.t,
            self.ax,
            self.ay,
            self.az,
            self.vx,
            self.vy,
            self.vz,
            self.a_mag,
            self.a_mag_delta,
            self.px,
            self.py,
            self.pz,
            self.p_mag,
            self.p_mag_delta,
            self.current,
            self.voltage,
        ]
    }

    pub const fn velocity(&self) -> Vec3 {
        Vec3::new(self.vx, self.vy, self.vz)
    }

    pub const fn power(&self) -> Vec3 {
        Vec3::new(self.px, self.py, self.pz)
    }

    /// True when every field is a finite number.
    ///
    /// Charts drop non-finite records and tables flag them; the engine
    /// itself never clamps.
    pub fn is_finite(&self) -> bool {
        self.values().iter().all(|v| v.is_finite())
    }
}
