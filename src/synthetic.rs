//! Synthetic acceleration feed.
//!
//! Generates a plausible tri-axial signal for demos and tests: a slow sway on
//! X, a stepping bounce on Y, a small vibration on Z, plus Gaussian sensor
//! noise. Seeded runs are reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::config::defaults::SIMULATION_NOISE_STD;
use crate::types::RawSample;

/// Sway amplitude on X (m/s²)
const SWAY_AMPLITUDE: f64 = 0.4;
/// Sway frequency (Hz)
const SWAY_HZ: f64 = 0.25;
/// Step bounce amplitude on Y (m/s²)
const BOUNCE_AMPLITUDE: f64 = 1.2;
/// Step cadence (Hz)
const BOUNCE_HZ: f64 = 1.8;
/// Vibration amplitude on Z (m/s²)
const VIBRATION_AMPLITUDE: f64 = 0.15;
/// Vibration frequency (Hz)
const VIBRATION_HZ: f64 = 4.0;

/// Endless iterator of synthetic samples spaced `step_time` apart from `t = 0`.
pub struct SyntheticFeed {
    step_time: f64,
    index: u64,
    rng: StdRng,
    noise: Option<Normal<f64>>,
}

impl SyntheticFeed {
    /// Feed with the default noise level.
    ///
    /// `seed = None` draws entropy from the OS.
    pub fn new(step_time: f64, seed: Option<u64>) -> Self {
        Self::with_noise(step_time, seed, SIMULATION_NOISE_STD)
    }

    /// Feed with an explicit noise standard deviation. A non-positive or
    /// non-finite value disables noise entirely.
    pub fn with_noise(step_time: f64, seed: Option<u64>, noise_std: f64) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let noise = if noise_std.is_finite() && noise_std > 0.0 {
            Normal::new(0.0, noise_std).ok()
        } else {
            None
        };
        Self {
            step_time,
            index: 0,
            rng,
            noise,
        }
    }

    fn noise(&mut self) -> f64 {
        match &self.noise {
            Some(dist) => dist.sample(&mut self.rng),
            None => 0.0,
        }
    }
}

impl Iterator for SyntheticFeed {
    type Item = RawSample;

    #[allow(clippy::cast_precision_loss)]
    fn next(&mut self) -> Option<RawSample> {
        let t = self.index as f64 * self.step_time;
        self.index += 1;

        let phase = |hz: f64| (std::f64::consts::TAU * hz * t).sin();
        let ax = SWAY_AMPLITUDE * phase(SWAY_HZ) + self.noise();
        let ay = BOUNCE_AMPLITUDE * phase(BOUNCE_HZ) + self.noise();
        let az = VIBRATION_AMPLITUDE * phase(VIBRATION_HZ) + self.noise();

        Some(RawSample::new(t, ax, ay, az))
    }
}
