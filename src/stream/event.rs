//! Activity event record delivered by the ingestion transport.

use serde::{Deserialize, Serialize};

/// Event was produced by an automated actor.
pub const FLAG_AUTOMATED: u32 = 1 << 0;
/// Event is a minor change.
pub const FLAG_MINOR: u32 = 1 << 1;

/// A single timestamped activity event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub actor_id: String,
    pub entity_id: String,
    #[serde(default)]
    pub partition_key: String,
    pub timestamp_ms: i64,
    #[serde(default)]
    pub magnitude: f64,
    #[serde(default)]
    pub flags: u32,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        actor_id: impl Into<String>,
        entity_id: impl Into<String>,
        partition_key: impl Into<String>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            id: id.into(),
            actor_id: actor_id.into(),
            entity_id: entity_id.into(),
            partition_key: partition_key.into(),
            timestamp_ms,
            magnitude: 0.0,
            flags: 0,
        }
    }

    pub fn with_magnitude(mut self, magnitude: f64) -> Self {
        self.magnitude = magnitude;
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_automated(&self) -> bool {
        self.flags & FLAG_AUTOMATED != 0
    }

    /// Is this event inside the window of length `window_ms` ending at `now_ms`?
    pub fn in_window(&self, now_ms: i64, window_ms: u64) -> bool {
        now_ms.saturating_sub(self.timestamp_ms) < i64::try_from(window_ms).unwrap_or(i64::MAX)
    }
}
