//! Sample processing loop shared across all input modes.
//!
//! One loop owns the [`SessionRecorder`], so every sample of a run is derived
//! strictly in arrival order by a single task. Sources only decide where
//! samples come from; sinks only decide where records go.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::sink::RecordSink;
use super::source::{SampleEvent, SampleSource};
use crate::config::defaults::PROGRESS_LOG_INTERVAL;
use crate::config::watcher::ConfigEvent;
use crate::config::Configuration;
use crate::session::{FrozenLog, SessionLog, SessionRecorder};

// ============================================================================
// Stats
// ============================================================================

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source reported end of data.
    SourceExhausted,
    /// The cancellation token fired.
    Cancelled,
    /// The source returned an unrecoverable error.
    SourceError,
}

/// Counters for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStats {
    pub samples_ingested: u64,
    pub non_finite_records: u64,
    pub config_reloads: u64,
    pub stop_reason: StopReason,
}

/// Everything a finished run hands back.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub stats: PipelineStats,
    pub log: FrozenLog,
}

// ============================================================================
// Processing Loop
// ============================================================================

/// Owns all state needed for one recording run.
///
/// Built with [`new()`](ProcessingLoop::new), optionally given a config
/// event stream with [`with_config_events()`](ProcessingLoop::with_config_events),
/// then consumed by [`run()`](ProcessingLoop::run).
pub struct ProcessingLoop<K: RecordSink> {
    recorder: SessionRecorder,
    config: Configuration,
    sink: K,
    cancel_token: CancellationToken,
    config_events: Option<mpsc::Receiver<ConfigEvent>>,
    pinned: Configuration,
}

enum LoopEvent {
    Cancelled,
    Config(Option<ConfigEvent>),
    Source(anyhow::Result<SampleEvent>),
}

impl<K: RecordSink> ProcessingLoop<K> {
    pub fn new(config: Configuration, sink: K, cancel_token: CancellationToken) -> Self {
        Self {
            recorder: SessionRecorder::new(),
            config,
            sink,
            cancel_token,
            config_events: None,
            pinned: Configuration::new(),
        }
    }

    /// Apply parameters from reloaded config files between ticks.
    #[must_use]
    pub fn with_config_events(mut self, rx: mpsc::Receiver<ConfigEvent>) -> Self {
        self.config_events = Some(rx);
        self
    }

    /// Overrides that stay on top of every reloaded configuration, e.g.
    /// values given on the command line.
    #[must_use]
    pub fn with_pinned_overrides(mut self, pinned: Configuration) -> Self {
        self.pinned = pinned;
        self
    }

    /// Reader handle onto the log this loop will fill, for live charting.
    pub fn log_handle(&self) -> SessionLog {
        self.recorder.log_handle()
    }

    /// Record one session from `source` until EOF, error, or cancellation.
    pub async fn run<S: SampleSource>(mut self, source: &mut S) -> PipelineOutcome {
        let mut samples_ingested = 0u64;
        let mut non_finite_records = 0u64;
        let mut config_reloads = 0u64;
        let mut config_rx = self.config_events.take();

        info!("Recording samples from {}...", source.source_name());
        self.recorder.start_session(self.config.clone());

        let stop_reason = loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => LoopEvent::Cancelled,
                ev = next_config_event(&mut config_rx) => LoopEvent::Config(ev),
                result = source.next_sample() => LoopEvent::Source(result),
            };

            let sample = match event {
                LoopEvent::Cancelled => {
                    info!("[ProcessingLoop] Shutdown signal received");
                    break StopReason::Cancelled;
                }
                LoopEvent::Config(Some(ConfigEvent::Reloaded(app))) => {
                    let config = app.parameters.layered_with(&self.pinned);
                    match self.recorder.update_configuration(config) {
                        Ok(()) => config_reloads += 1,
                        Err(e) => warn!("[ProcessingLoop] Config reload not applied: {}", e),
                    }
                    continue;
                }
                LoopEvent::Config(Some(ConfigEvent::Error(msg))) => {
                    warn!(
                        "[ProcessingLoop] Config reload failed, keeping current parameters: {}",
                        msg
                    );
                    continue;
                }
                LoopEvent::Config(None) => {
                    debug!("[ProcessingLoop] Config watcher stopped");
                    config_rx = None;
                    continue;
                }
                LoopEvent::Source(Err(e)) => {
                    warn!("[ProcessingLoop] Source error: {}", e);
                    break StopReason::SourceError;
                }
                LoopEvent::Source(Ok(SampleEvent::Eof)) => {
                    info!(
                        "[ProcessingLoop] Source reached end ({} samples ingested)",
                        samples_ingested
                    );
                    break StopReason::SourceExhausted;
                }
                LoopEvent::Source(Ok(SampleEvent::Sample(sample))) => sample,
            };

            let record = match self.recorder.ingest(sample) {
                Ok(record) => record,
                Err(e) => {
                    // Unreachable while the session opened above is live
                    error!("[ProcessingLoop] Ingest rejected: {}", e);
                    break StopReason::SourceError;
                }
            };

            samples_ingested += 1;
            if !record.is_finite() {
                non_finite_records += 1;
            }

            self.sink.on_record(&record);

            if samples_ingested % PROGRESS_LOG_INTERVAL == 0 {
                info!(
                    samples = samples_ingested,
                    t = record.t,
                    a_mag = record.a_mag,
                    p_mag = record.p_mag,
                    current = record.current,
                    "Progress"
                );
            }
        };

        self.sink.finish();

        let log = match self.recorder.end_session() {
            Ok(log) => log,
            Err(e) => {
                error!("[ProcessingLoop] Session already closed: {}", e);
                self.recorder.log_handle().freeze()
            }
        };

        PipelineOutcome {
            stats: PipelineStats {
                samples_ingested,
                non_finite_records,
                config_reloads,
                stop_reason,
            },
            log,
        }
    }
}

/// Next config event, or pending forever when no watcher is attached.
async fn next_config_event(rx: &mut Option<mpsc::Receiver<ConfigEvent>>) -> Option<ConfigEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
