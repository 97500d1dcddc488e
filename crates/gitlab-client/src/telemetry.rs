//! Append-only call log consumed by external reporting surfaces
//!
//! One [`CallRecord`] per call attempt, whether it succeeded, failed, or
//! was served from cache. Entries are never removed for the lifetime of
//! the recorder. The recorder is owned by the client that created it;
//! hosts that want process-wide visibility share one via `Arc`.

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;

/// How one call attempt ended.
#[derive(Debug, Clone)]
pub enum CallOutcome {
    /// Mapped response body, re-serialized for display.
    Body(serde_json::Value),
    /// The attempt failed; display text of the failure.
    Failed(String),
}

/// One entry per call attempt.
#[derive(Debug, Clone)]
pub struct CallRecord {
    /// Base URL of the client that made the call.
    pub base_url: String,
    /// Relative target URL as passed by the caller.
    pub url: String,
    pub method: String,
    /// Wall-clock time from validation start to completion. Near zero for
    /// cache hits.
    pub duration: Duration,
    /// Whether the result was served from cache.
    pub is_cache: bool,
    /// Request parameters, if any were supplied.
    pub data: Option<Vec<(String, String)>>,
    pub outcome: CallOutcome,
    pub at: DateTime<Utc>,
}

/// Aggregate counters over the whole log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub calls: usize,
    pub total_duration: Duration,
}

/// Append-only recorder of every call made through a client.
#[derive(Debug, Default)]
pub struct CallLog {
    records: Mutex<Vec<CallRecord>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, record: CallRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }

    /// Copy of the full log, in append order.
    pub fn snapshot(&self) -> Vec<CallRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> CallStats {
        let records = match self.records.lock() {
            Ok(records) => records,
            Err(_) => return CallStats::default(),
        };
        CallStats {
            calls: records.len(),
            total_duration: records.iter().map(|record| record.duration).sum(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
