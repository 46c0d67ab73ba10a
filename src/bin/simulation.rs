//! Acceleration Feed Simulation
//!
//! Generates a synthetic tri-axial acceleration stream for exercising
//! accel-metrics without a physical sensor. Samples are written to stdout as
//! JSON lines; the mission log goes to stderr.
//!
//! # Usage
//! ```bash
//! ./accel-simulation --samples 600 --speed 10 | ./accel-metrics --stdin
//! ```

use std::io::{self, Write};
use std::time::{Duration, Instant};

use clap::Parser;

use accel_metrics::config::defaults::{
    DEFAULT_STEP_TIME_SECS, SIMULATION_DEFAULT_SAMPLES, SIMULATION_NOISE_STD,
};
use accel_metrics::synthetic::SyntheticFeed;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "accel-simulation")]
#[command(about = "Synthetic acceleration feed for accel-metrics testing")]
#[command(version)]
struct Args {
    /// Number of samples to emit
    #[arg(short = 'n', long, default_value_t = SIMULATION_DEFAULT_SAMPLES)]
    samples: u64,

    /// Tick interval in seconds
    #[arg(long, default_value_t = DEFAULT_STEP_TIME_SECS)]
    step_time: f64,

    /// Time compression factor (1 = real-time, 0 = no pacing)
    #[arg(
        short,
        long,
        default_value = "1",
        value_parser = clap::value_parser!(u32).range(0..=1000)
    )]
    speed: u32,

    /// Sensor noise standard deviation (m/s²)
    #[arg(long, default_value_t = SIMULATION_NOISE_STD)]
    noise: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Suppress mission log (only output sample data)
    #[arg(short, long)]
    quiet: bool,
}

fn log_mission(tick: f64, message: &str, quiet: bool) {
    if !quiet {
        eprintln!("[{tick:>8.2}s] {message}");
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if !(args.step_time.is_finite() && args.step_time > 0.0) {
        anyhow::bail!("--step-time must be a positive number of seconds");
    }

    log_mission(0.0, &"=".repeat(60), args.quiet);
    log_mission(0.0, "ACCELERATION FEED SIMULATION", args.quiet);
    log_mission(0.0, &format!("  Samples: {}", args.samples), args.quiet);
    log_mission(0.0, &format!("  Step time: {} s", args.step_time), args.quiet);
    log_mission(0.0, &format!("  Noise std: {} m/s²", args.noise), args.quiet);
    if let Some(seed) = args.seed {
        log_mission(0.0, &format!("  Random seed: {seed}"), args.quiet);
    }
    log_mission(0.0, &"=".repeat(60), args.quiet);

    let pacing = if args.speed == 0 {
        None
    } else {
        Some(Duration::from_secs_f64(args.step_time / f64::from(args.speed)))
    };

    let feed = SyntheticFeed::with_noise(args.step_time, args.seed, args.noise);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let started = Instant::now();
    let report_every = (args.samples / 10).max(1);
    let mut last_tick = 0.0;

    for (i, sample) in (0..args.samples).zip(feed) {
        let loop_start = Instant::now();

        serde_json::to_writer(&mut out, &sample)?;
        out.write_all(b"\n")?;
        last_tick = sample.tick;

        if (i + 1) % report_every == 0 {
            out.flush()?;
            log_mission(
                sample.tick,
                &format!("{} / {} samples emitted", i + 1, args.samples),
                args.quiet,
            );
        }

        if let Some(interval) = pacing {
            let spent = loop_start.elapsed();
            if spent < interval {
                std::thread::sleep(interval - spent);
            }
        }
    }

    out.flush()?;
    log_mission(
        last_tick,
        &format!("SIMULATION COMPLETE in {:.1}s wall time", started.elapsed().as_secs_f64()),
        args.quiet,
    );
    Ok(())
}
