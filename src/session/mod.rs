//! Recording sessions
//!
//! A [`SessionRecorder`] is either **Idle** or **Recording**:
//!
//! ```text
//!            start_session(config)
//!   Idle ───────────────────────────► Recording ──┐
//!    ▲                                   │        │ ingest(sample) → Record
//!    └───────── end_session() ───────────┘ ◄──────┘
//! ```
//!
//! Starting always clears the log and resets the carried state. Ending
//! freezes both; there is no pause, a restart is a fresh session.

mod log;

pub use log::{FrozenLog, SessionLog};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::engine::{CarriedState, DerivationEngine};
use crate::types::{RawSample, Record};

/// Session state errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A sample or stop request arrived with no session running.
    #[error("no active recording session")]
    NotRecording,
}

/// Whether the recorder is accepting samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Recording,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Recording => write!(f, "Recording"),
        }
    }
}

/// Bookkeeping for the running session.
#[derive(Debug)]
struct ActiveSession {
    config: Configuration,
    engine: DerivationEngine,
    started_at: DateTime<Utc>,
    last_tick: Option<f64>,
}

/// Owns the one live carried state and appends to the session log.
///
/// Every sample of a session goes through `&mut self`, so derivation is
/// serialized by construction. Readers get a cloneable [`SessionLog`]
/// handle and read snapshots.
#[derive(Debug, Default)]
pub struct SessionRecorder {
    active: Option<ActiveSession>,
    log: SessionLog,
    final_state: Option<CarriedState>,
    sessions_started: u64,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session.
    ///
    /// Clears the log and resets the carried state. Calling this while
    /// already recording discards the running session and starts over.
    pub fn start_session(&mut self, config: Configuration) {
        if self.active.is_some() {
            warn!("start_session while recording, restarting session");
        }

        self.log.clear();
        self.final_state = None;
        self.sessions_started += 1;

        let unrecognized: Vec<&str> = config.unrecognized().collect();
        if !unrecognized.is_empty() {
            debug!(?unrecognized, "Ignoring unrecognized parameters");
        }

        info!(
            session = self.sessions_started,
            mass = config.mass(),
            resistance = config.resistance(),
            v0 = config.v0(),
            step_time = config.step_time(),
            "Recording session started"
        );

        self.active = Some(ActiveSession {
            config,
            engine: DerivationEngine::new(),
            started_at: Utc::now(),
            last_tick: None,
        });
    }

    /// Derive the record for `sample`, append it to the log, and return it.
    ///
    /// Fails with [`SessionError::NotRecording`] when idle, in which case
    /// nothing is appended.
    pub fn ingest(&mut self, sample: RawSample) -> Result<Record, SessionError> {
        let active = self.active.as_mut().ok_or(SessionError::NotRecording)?;

        if let Some(prev) = active.last_tick {
            if sample.tick <= prev {
                warn!(
                    tick = sample.tick,
                    previous = prev,
                    "Non-increasing tick, deltas for this sample are unreliable"
                );
            }
        }
        active.last_tick = Some(sample.tick);

        let record = active.engine.step(&sample, &active.config);
        if !record.is_finite() {
            debug!(t = record.t, "Record contains non-finite values");
        }

        self.log.append(record);
        Ok(record)
    }

    /// Stop accepting samples and return the frozen log.
    ///
    /// The log and final carried state stay readable until the next
    /// `start_session`.
    pub fn end_session(&mut self) -> Result<FrozenLog, SessionError> {
        let active = self.active.take().ok_or(SessionError::NotRecording)?;
        self.final_state = Some(*active.engine.state());

        let frozen = self.log.freeze();
        let elapsed = Utc::now().signed_duration_since(active.started_at);
        info!(
            session = self.sessions_started,
            records = frozen.len(),
            non_finite = frozen.non_finite_count(),
            wall_ms = elapsed.num_milliseconds(),
            "Recording session ended"
        );
        Ok(frozen)
    }

    /// Replace the active configuration; applies from the next sample.
    pub fn update_configuration(&mut self, config: Configuration) -> Result<(), SessionError> {
        let active = self.active.as_mut().ok_or(SessionError::NotRecording)?;
        info!(
            mass = config.mass(),
            resistance = config.resistance(),
            "Session configuration updated"
        );
        active.config = config;
        Ok(())
    }

    pub const fn status(&self) -> SessionStatus {
        if self.active.is_some() {
            SessionStatus::Recording
        } else {
            SessionStatus::Idle
        }
    }

    pub const fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Configuration of the running session.
    pub fn configuration(&self) -> Option<&Configuration> {
        self.active.as_ref().map(|a| &a.config)
    }

    /// Carried state: live while recording, frozen after `end_session`,
    /// `None` before the first session.
    pub fn carried_state(&self) -> Option<CarriedState> {
        self.active
            .as_ref()
            .map(|a| *a.engine.state())
            .or(self.final_state)
    }

    /// Reader handle for chart and table consumers.
    pub fn log_handle(&self) -> SessionLog {
        self.log.clone()
    }

    /// Number of sessions started over the recorder's lifetime.
    pub const fn sessions_started(&self) -> u64 {
        self.sessions_started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigKey;

    #[test]
    fn test_ingest_while_idle_is_rejected() {
        let mut recorder = SessionRecorder::new();
        let result = recorder.ingest(RawSample::new(0.0, 1.0, 1.0, 1.0));

        assert_eq!(result, Err(SessionError::NotRecording));
        assert!(recorder.log_handle().is_empty());
        assert_eq!(recorder.carried_state(), None);
    }

    #[test]
    fn test_end_while_idle_is_rejected() {
        let mut recorder = SessionRecorder::new();
        assert_eq!(recorder.end_session(), Err(SessionError::NotRecording));
    }

    #[test]
    fn test_ingest_appends_and_returns_same_record() {
        let mut recorder = SessionRecorder::new();
        recorder.start_session(Configuration::new());

        let record = recorder.ingest(RawSample::new(0.0, 3.0, 4.0, 0.0)).unwrap();
        assert_eq!(record.a_mag, 5.0);
        assert_eq!(recorder.log_handle().latest(), Some(record));
        assert_eq!(recorder.status(), SessionStatus::Recording);
    }

    #[test]
    fn test_end_session_freezes_state_and_log() {
        let mut recorder = SessionRecorder::new();
        recorder.start_session(Configuration::new());
        recorder.ingest(RawSample::new(0.1, 1.0, 0.0, 0.0)).unwrap();
        recorder.ingest(RawSample::new(0.2, 1.0, 0.0, 0.0)).unwrap();

        let frozen = recorder.end_session().unwrap();
        assert_eq!(frozen.len(), 2);
        assert_eq!(recorder.status(), SessionStatus::Idle);
        assert_eq!(recorder.carried_state().unwrap().previous_velocity.x, 2.0);

        // Stopped: further samples are refused, log unchanged
        assert!(recorder.ingest(RawSample::new(0.3, 1.0, 0.0, 0.0)).is_err());
        assert_eq!(recorder.log_handle().len(), 2);
    }

    #[test]
    fn test_update_configuration_applies_next_tick() {
        let mut recorder = SessionRecorder::new();
        recorder.start_session(Configuration::new());

        let before = recorder.ingest(RawSample::new(0.1, 1.0, 0.0, 0.0)).unwrap();
        recorder
            .update_configuration(Configuration::new().with(ConfigKey::Mass, 3.0))
            .unwrap();
        let after = recorder.ingest(RawSample::new(0.2, 1.0, 0.0, 0.0)).unwrap();

        assert_eq!(before.px, 1.0);
        // a = 1, v = 2, mass = 3
        assert_eq!(after.px, 6.0);
    }

    #[test]
    fn test_restart_while_recording_starts_fresh() {
        let mut recorder = SessionRecorder::new();
        recorder.start_session(Configuration::new());
        recorder.ingest(RawSample::new(0.1, 5.0, 0.0, 0.0)).unwrap();

        recorder.start_session(Configuration::new());
        assert!(recorder.log_handle().is_empty());
        assert_eq!(recorder.carried_state(), Some(CarriedState::ZERO));
        assert_eq!(recorder.sessions_started(), 2);
    }
}
