//! Processing Pipeline Module
//!
//! ```text
//! SampleSource ──► ProcessingLoop ──► SessionRecorder ──► SessionLog (storage)
//!                        │                                    │
//!                        └──────────► RecordSink (display)    └──► chart / table readers
//! ```
//!
//! Config reloads arrive on a side channel and are applied between ticks.

pub mod processing_loop;
pub mod sink;
pub mod source;

pub use processing_loop::{PipelineOutcome, PipelineStats, ProcessingLoop, StopReason};
pub use sink::{CollectingSink, JsonLinesSink, RecordSink};
pub use source::{ChannelSource, ReplaySource, SampleEvent, SampleSender, SampleSource, StdinSource};
