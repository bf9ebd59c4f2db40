//! Bounded request log
//!
//! Newest entries first; once the capacity is reached the oldest entry is
//! dropped. Purely observational.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use super::request::Method;
use crate::security::Sanitizer;

/// One logged request/response pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestLogEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub method: Method,
    pub endpoint: String,
    /// HTTP status, 0 when no response was received
    pub status: u16,
    /// Response body (or error description), credentials redacted
    pub payload: Value,
    pub success: bool,
}

/// Ring buffer of recent requests
pub struct RequestLog {
    capacity: usize,
    next_id: AtomicU64,
    entries: RwLock<VecDeque<RequestLogEntry>>,
}

impl RequestLog {
    /// Default number of retained entries
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next_id: AtomicU64::new(1),
            entries: RwLock::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends an entry and returns it
    pub async fn record(
        &self,
        method: Method,
        endpoint: &str,
        status: u16,
        payload: &Value,
    ) -> RequestLogEntry {
        let entry = RequestLogEntry {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            timestamp: Utc::now(),
            method,
            endpoint: Sanitizer::sanitize_url(endpoint),
            status,
            payload: Sanitizer::redact_payload(payload),
            success: (200..300).contains(&status),
        };

        let mut entries = self.entries.write().await;
        entries.push_front(entry.clone());
        entries.truncate(self.capacity);

        entry
    }

    /// All entries, newest first
    pub async fn entries(&self) -> Vec<RequestLogEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    /// The most recent entry
    pub async fn latest(&self) -> Option<RequestLogEntry> {
        self.entries.read().await.front().cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

impl Default for RequestLog {
    fn default() -> Self {
        Self::new()
    }
}
