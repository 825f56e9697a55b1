//! Bounded in-memory log queue
//!
//! Producers are request tasks; the single consumer is the flush loop.
//! `enqueue` never waits: a full queue rejects the newest record and counts
//! the drop.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::record::LogRecord;

/// Point-in-time queue statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub len: usize,
    pub capacity: usize,
    pub success: u64,
    pub dropped: u64,
}

pub struct BoundedLogQueue {
    entries: Mutex<VecDeque<LogRecord>>,
    capacity: usize,
    success_count: AtomicU64,
    drop_count: AtomicU64,
}

impl BoundedLogQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            // Grown on demand, the full capacity is rarely used
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            success_count: AtomicU64::new(0),
            drop_count: AtomicU64::new(0),
        }
    }

    /// Append a record. Returns `false` when the queue is full.
    pub fn enqueue(&self, record: LogRecord) -> bool {
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            drop(entries);
            self.drop_count.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        entries.push_back(record);
        drop(entries);
        self.success_count.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Remove up to `max_batch` records in FIFO order
    pub fn drain(&self, max_batch: usize) -> Vec<LogRecord> {
        let mut entries = self.entries.lock();
        let n = entries.len().min(max_batch);
        entries.drain(..n).collect()
    }

    pub fn reset_counters(&self) {
        self.success_count.store(0, Ordering::Relaxed);
        self.drop_count.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    pub fn drop_count(&self) -> u64 {
        self.drop_count.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            len: self.len(),
            capacity: self.capacity,
            success: self.success_count(),
            dropped: self.drop_count(),
        }
    }

    /// Discard every queued record without touching the counters
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl std::fmt::Debug for BoundedLogQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedLogQueue")
            .field("stats", &self.stats())
            .finish()
    }
}
