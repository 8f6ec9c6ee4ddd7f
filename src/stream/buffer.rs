//! Bounded rolling event buffer and rate estimation.
//!
//! Both structures are single-writer: the ingestion context owns them
//! and hands detection an immutable snapshot by value.

use std::collections::VecDeque;
use std::sync::Arc;

use super::Event;

/// Bounded FIFO of recent events.
#[derive(Debug, Clone)]
pub struct StreamBuffer {
    events: VecDeque<Event>,
    capacity: usize,
}

impl StreamBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an event, evicting the oldest once capacity is exceeded.
    pub fn append(&mut self, event: Event) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Events within `window_ms` of `now_ms`, in arrival order.
    pub fn window_events(&self, now_ms: i64, window_ms: u64) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.in_window(now_ms, window_ms))
            .cloned()
            .collect()
    }

    /// Number of events within `window_ms` of `now_ms`.
    pub fn window_len(&self, now_ms: i64, window_ms: u64) -> usize {
        self.events
            .iter()
            .filter(|e| e.in_window(now_ms, window_ms))
            .count()
    }

    /// Immutable snapshot of the window for hand-off to a detection job.
    pub fn snapshot(&self, now_ms: i64, window_ms: u64) -> Arc<[Event]> {
        self.window_events(now_ms, window_ms).into()
    }

    /// Drop events older than the retention window. Returns how many were dropped.
    pub fn expire(&mut self, now_ms: i64, retention_ms: u64) -> usize {
        let before = self.events.len();
        self.events.retain(|e| e.in_window(now_ms, retention_ms));
        before - self.events.len()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Timestamp ring over a short span for events-per-second estimation.
#[derive(Debug, Clone)]
pub struct RateTracker {
    timestamps: VecDeque<i64>,
    span_ms: u64,
}

impl RateTracker {
    pub fn new(span_ms: u64) -> Self {
        Self {
            timestamps: VecDeque::new(),
            span_ms: span_ms.max(1),
        }
    }

    /// Record an arrival, pruning entries that fell out of the span.
    pub fn record(&mut self, timestamp_ms: i64) {
        self.timestamps.push_back(timestamp_ms);
        self.prune(timestamp_ms);
    }

    /// Events per second over the span ending at `now_ms`.
    pub fn rate(&mut self, now_ms: i64) -> f64 {
        let start = self.start(now_ms);
        self.timestamps.retain(|&t| t > start);
        self.timestamps.len() as f64 / self.span_ms as f64 * 1000.0
    }

    fn start(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(i64::try_from(self.span_ms).unwrap_or(i64::MAX))
    }

    fn prune(&mut self, now_ms: i64) {
        let start = self.start(now_ms);
        while self.timestamps.front().is_some_and(|&t| t <= start) {
            self.timestamps.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
