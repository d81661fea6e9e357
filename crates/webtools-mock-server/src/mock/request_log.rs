//! Bounded in-memory log of requests served by the mock listener.
//!
//! Backs the UI's request log panel. Entries are appended by the listener
//! after the dispatcher has produced a response; the oldest entries are
//! evicted once the log is full.

use super::dispatcher::MockRequest;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// One served request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedRequest {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// Ring buffer of recent requests. A capacity of zero disables recording.
pub struct RequestLog {
    capacity: usize,
    next_id: AtomicU64,
    entries: RwLock<VecDeque<LoggedRequest>>,
}

impl RequestLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_id: AtomicU64::new(1),
            // grows on demand; the capacity may be far larger than the traffic
            entries: RwLock::new(VecDeque::new()),
        }
    }

    /// Append an entry, evicting the oldest if the log is full
    pub fn record(&self, request: &MockRequest, status: u16, duration: Duration) {
        if self.capacity == 0 {
            return;
        }

        let entry = LoggedRequest {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            timestamp: Utc::now(),
            method: request.method.clone(),
            path: request.path.clone(),
            status,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            body: request.body.clone(),
        };

        let mut entries = self.entries.write();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// All entries, oldest first
    pub fn entries(&self) -> Vec<LoggedRequest> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Remove all entries, returning how many were dropped
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let cleared = entries.len();
        entries.clear();
        cleared
    }
}

impl Default for RequestLog {
    fn default() -> Self {
        Self::new(100)
    }
}
