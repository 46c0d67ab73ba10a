//! Display sinks: where derived records go besides the session log.

use std::io::Write;

use crate::types::Record;

/// Receives every record right after it is derived and appended.
pub trait RecordSink: Send + 'static {
    fn on_record(&mut self, record: &Record);

    /// Called once after the last record of a run.
    fn finish(&mut self) {}
}

/// No-op sink for headless runs.
impl RecordSink for () {
    fn on_record(&mut self, _record: &Record) {}
}

/// Writes each record as one JSON object per line.
///
/// NaN and infinite values serialize as `null`. Write failures are logged
/// once and further output is dropped; they never stop the pipeline.
pub struct JsonLinesSink<W: Write + Send + 'static> {
    writer: W,
    failed: bool,
}

impl<W: Write + Send + 'static> JsonLinesSink<W> {
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            failed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + 'static> RecordSink for JsonLinesSink<W> {
    fn on_record(&mut self, record: &Record) {
        if self.failed {
            return;
        }
        let result = serde_json::to_writer(&mut self.writer, record)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if let Err(e) = result {
            tracing::warn!(error = %e, "Record output failed, disabling sink");
            self.failed = true;
        }
    }

    fn finish(&mut self) {
        if !self.failed {
            if let Err(e) = self.writer.flush() {
                tracing::warn!(error = %e, "Failed to flush record output");
            }
        }
    }
}

/// Keeps only finite records, the way a live chart would.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub records: Vec<Record>,
    pub dropped_non_finite: usize,
}

impl RecordSink for CollectingSink {
    fn on_record(&mut self, record: &Record) {
        if record.is_finite() {
            self.records.push(*record);
        } else {
            self.dropped_non_finite += 1;
        }
    }
}
