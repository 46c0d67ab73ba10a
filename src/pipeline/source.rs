//! Sample source abstraction for acceleration ingestion.
//!
//! Provides a unified trait for reading raw samples from different places:
//! pre-loaded replays, stdin (JSON lines), and an in-process queue that
//! serializes many producers into the single derivation consumer.

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, LinesCodec};

use crate::types::RawSample;

/// Events produced by a sample source.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleEvent {
    /// A raw sample was read.
    Sample(RawSample),
    /// Source reached end of data.
    Eof,
}

/// Trait abstracting where raw samples come from.
///
/// Implementations handle parsing and pacing internally. The processing
/// loop calls [`next_sample`](SampleSource::next_sample) inside a
/// `select!` with cancellation and config events, so the future must be
/// cancel-safe: dropping it before completion must not lose input.
#[async_trait]
pub trait SampleSource: Send + 'static {
    /// Read the next sample.
    ///
    /// Returns `SampleEvent::Eof` when no more data is available and `Err`
    /// on unrecoverable errors.
    async fn next_sample(&mut self) -> Result<SampleEvent>;

    /// Human-readable name for logging.
    fn source_name(&self) -> &str;
}

// ============================================================================
// Replay Source (pre-loaded / synthetic)
// ============================================================================

/// Replays pre-loaded samples with an optional inter-sample delay.
pub struct ReplaySource {
    samples: std::vec::IntoIter<RawSample>,
    delay_ms: u64,
    yielded_first: bool,
}

impl ReplaySource {
    pub fn new(samples: Vec<RawSample>, delay_ms: u64) -> Self {
        Self {
            samples: samples.into_iter(),
            delay_ms,
            yielded_first: false,
        }
    }
}

#[async_trait]
impl SampleSource for ReplaySource {
    async fn next_sample(&mut self) -> Result<SampleEvent> {
        // No delay before the first sample
        if self.yielded_first && self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
        match self.samples.next() {
            Some(s) => {
                self.yielded_first = true;
                Ok(SampleEvent::Sample(s))
            }
            None => Ok(SampleEvent::Eof),
        }
    }

    fn source_name(&self) -> &str {
        "replay"
    }
}

// ============================================================================
// Stdin Source (JSON samples, one per line)
// ============================================================================

/// Reads JSON-formatted samples from any async byte reader, stdin by default.
///
/// Used with the simulation binary:
/// `accel-simulation | accel-metrics --stdin`
///
/// Partial lines are buffered inside the framed reader, so dropping a pending
/// [`next_sample`](SampleSource::next_sample) future (the processing loop does
/// this whenever a config event wins the `select!`) never loses input.
pub struct StdinSource<R = tokio::io::Stdin> {
    lines: FramedRead<R, LinesCodec>,
    skipped: u64,
}

impl StdinSource {
    pub fn new() -> Self {
        Self::from_reader(tokio::io::stdin())
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> StdinSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: FramedRead::new(reader, LinesCodec::new()),
            skipped: 0,
        }
    }

    /// Malformed lines skipped so far.
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[async_trait]
impl<R> SampleSource for StdinSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn next_sample(&mut self) -> Result<SampleEvent> {
        loop {
            let Some(line) = self.lines.next().await else {
                return Ok(SampleEvent::Eof);
            };
            let line = line?;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawSample>(line) {
                Ok(sample) => return Ok(SampleEvent::Sample(sample)),
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!("[StdinSource] Failed to parse sample: {}", e);
                }
            }
        }
    }

    fn source_name(&self) -> &str {
        "stdin"
    }
}

// ============================================================================
// Channel Source (single-writer queue)
// ============================================================================

/// Receiving end of a bounded queue that any number of producers feed.
///
/// Producers hold [`SampleSender`] clones. Samples come out in the order the
/// queue accepted them, one at a time, so the carried state keeps a single
/// mutable owner. The source reports EOF once every sender is dropped.
pub struct ChannelSource {
    rx: mpsc::Receiver<RawSample>,
}

/// Producer handle for a [`ChannelSource`].
pub type SampleSender = mpsc::Sender<RawSample>;

impl ChannelSource {
    /// Create a queue with the given capacity.
    pub fn bounded(capacity: usize) -> (SampleSender, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

#[async_trait]
impl SampleSource for ChannelSource {
    async fn next_sample(&mut self) -> Result<SampleEvent> {
        Ok(self
            .rx
            .recv()
            .await
            .map_or(SampleEvent::Eof, SampleEvent::Sample))
    }

    fn source_name(&self) -> &str {
        "queue"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replay_source_yields_then_eof() {
        let mut source = ReplaySource::new(vec![RawSample::new(0.0, 1.0, 2.0, 3.0)], 0);
        assert_eq!(
            source.next_sample().await.unwrap(),
            SampleEvent::Sample(RawSample::new(0.0, 1.0, 2.0, 3.0))
        );
        assert_eq!(source.next_sample().await.unwrap(), SampleEvent::Eof);
    }

    #[tokio::test]
    async fn test_line_source_skips_malformed_lines() {
        let input: &[u8] = b"{\"tick\":0.0,\"ax\":1.0,\"ay\":0.0,\"az\":0.0}\n\nnot json\n\
            {\"tick\":0.1,\"ax\":2.0,\"ay\":0.0,\"az\":0.0}\n";
        let mut source = StdinSource::from_reader(input);

        let mut ticks = Vec::new();
        while let SampleEvent::Sample(s) = source.next_sample().await.unwrap() {
            ticks.push(s.tick);
        }

        assert_eq!(ticks, vec![0.0, 0.1]);
        assert_eq!(source.skipped(), 1);
    }

    #[tokio::test]
    async fn test_line_source_keeps_partial_line_when_poll_dropped() {
        use tokio::io::AsyncWriteExt;

        let (mut writer, reader) = tokio::io::duplex(256);
        let mut source = StdinSource::from_reader(reader);

        writer.write_all(b"{\"tick\":0.5,\"ax\":1.0,").await.unwrap();
        let pending =
            tokio::time::timeout(std::time::Duration::from_millis(20), source.next_sample()).await;
        assert!(pending.is_err());

        writer.write_all(b"\"ay\":2.0,\"az\":3.0}\n").await.unwrap();
        drop(writer);

        assert_eq!(
            source.next_sample().await.unwrap(),
            SampleEvent::Sample(RawSample::new(0.5, 1.0, 2.0, 3.0))
        );
        assert_eq!(source.next_sample().await.unwrap(), SampleEvent::Eof);
        assert_eq!(source.skipped(), 0);
    }

    #[tokio::test]
    async fn test_channel_source_eof_after_senders_drop() {
        let (tx, mut source) = ChannelSource::bounded(4);
        tx.send(RawSample::new(0.0, 0.0, 0.0, 0.0)).await.unwrap();
        drop(tx);

        assert!(matches!(source.next_sample().await.unwrap(), SampleEvent::Sample(_)));
        assert_eq!(source.next_sample().await.unwrap(), SampleEvent::Eof);
    }
}
