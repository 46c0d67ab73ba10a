//! Session log: append-only record storage with snapshot reads.
//!
//! The recorder is the only writer. Readers (live charts, tabulation) never
//! iterate the growing vector directly; they take a snapshot under the read
//! lock and work on that copy.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::types::Record;

// ============================================================================
// Live Log
// ============================================================================

/// Shared handle to the active session's records.
///
/// Cloning the handle shares the same underlying log.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    records: Arc<RwLock<Vec<Record>>>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&self, record: Record) {
        self.write().push(record);
    }

    pub(crate) fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Most recent record, if any.
    pub fn latest(&self) -> Option<Record> {
        self.read().last().copied()
    }

    /// Copy of every record appended so far.
    pub fn snapshot(&self) -> Vec<Record> {
        self.read().clone()
    }

    /// Copy of the records within `seconds` of the latest record.
    ///
    /// Used by live charts to show the trailing `ChartLength` window.
    pub fn trailing_window(&self, seconds: f64) -> Vec<Record> {
        trailing_window(&self.read(), seconds).to_vec()
    }

    /// Freeze the current contents.
    pub fn freeze(&self) -> FrozenLog {
        FrozenLog {
            records: Arc::from(self.read().as_slice()),
        }
    }

    // A poisoned lock only means a reader panicked mid-copy; the data is
    // append-only so it is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Record>> {
        self.records.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Record>> {
        self.records.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// ============================================================================
// Frozen Log
// ============================================================================

/// Read-only log of a finished session, cheap to clone and share.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenLog {
    records: Arc<[Record]>,
}

impl FrozenLog {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&Record> {
        self.records.last()
    }

    /// Records within `seconds` of the final record.
    pub fn trailing_window(&self, seconds: f64) -> &[Record] {
        trailing_window(&self.records, seconds)
    }

    /// Number of records with at least one NaN or infinite field.
    pub fn non_finite_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_finite()).count()
    }

    /// Elapsed time from the first to the last record (seconds).
    pub fn duration(&self) -> f64 {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => last.t - first.t,
            _ => 0.0,
        }
    }
}

impl<'a> IntoIterator for &'a FrozenLog {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Suffix of `records` whose `t` is at least `latest.t - seconds`.
///
/// Records are in ingestion order, so the window is found by scanning back
/// from the end until the first record that falls outside it.
fn trailing_window(records: &[Record], seconds: f64) -> &[Record] {
    let Some(latest) = records.last() else {
        return records;
    };
    let cutoff = latest.t - seconds;
    let start = records
        .iter()
        .rposition(|r| r.t < cutoff)
        .map_or(0, |idx| idx + 1);
    &records[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::engine::DerivationEngine;
    use crate::types::RawSample;

    fn records_at(ticks: &[f64]) -> Vec<Record> {
        let mut engine = DerivationEngine::new();
        let config = Configuration::new();
        ticks
            .iter()
            .map(|t| engine.step(&RawSample::new(*t, 0.1, 0.2, 0.3), &config))
            .collect()
    }

    #[test]
    fn test_trailing_window_keeps_recent_records() {
        let records = records_at(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let window = trailing_window(&records, 2.0);
        let ticks: Vec<f64> = window.iter().map(|r| r.t).collect();
        assert_eq!(ticks, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_trailing_window_longer_than_log() {
        let records = records_at(&[0.0, 0.1, 0.2]);
        assert_eq!(trailing_window(&records, 60.0).len(), 3);
        assert!(trailing_window(&[], 60.0).is_empty());
    }

    #[test]
    fn test_snapshot_is_detached_from_later_appends() {
        let log = SessionLog::new();
        for record in records_at(&[0.0, 0.1]) {
            log.append(record);
        }

        let snapshot = log.snapshot();
        let frozen = log.freeze();
        for record in records_at(&[0.2]) {
            log.append(record);
        }

        assert_eq!(snapshot.len(), 2);
        assert_eq!(frozen.len(), 2);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_frozen_log_duration() {
        let log = SessionLog::new();
        for record in records_at(&[0.0, 0.5, 1.5]) {
            log.append(record);
        }
        let frozen = log.freeze();
        assert_eq!(frozen.duration(), 1.5);
        assert_eq!(frozen.non_finite_count(), 0);
        assert_eq!(frozen.trailing_window(1.0).len(), 2);
    }
}
